//! Observers of dragger motion

use crate::foundation::collections::NodeId;
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::manipulators::command::{MotionCommand, MotionStage};
use crate::manipulators::path::compute_node_path_to_root;
use crate::scene::SceneGraph;

/// Receives every motion command a dragger dispatches
pub trait DraggerCallback {
    /// React to `command`; `true` when the callback acted on it
    fn receive(&mut self, graph: &mut SceneGraph, command: &MotionCommand) -> bool;
}

impl<F> DraggerCallback for F
where
    F: FnMut(&mut SceneGraph, &MotionCommand) -> bool,
{
    fn receive(&mut self, graph: &mut SceneGraph, command: &MotionCommand) -> bool {
        self(graph, command)
    }
}

/// Applies motion to a transform node.
///
/// The node's matrix and its parents' local-to-world are captured on
/// [`MotionStage::Start`]. Each move sets the matrix to
/// `P⁻¹ · D · M · D⁻¹ · P · T_start`, with `P` the parent local-to-world, `D`
/// the command's local-to-world and `M` its motion matrix, so the target
/// follows the dragger in world space regardless of where each sits.
#[derive(Debug, Clone)]
pub struct DraggerTransformCallback {
    target: NodeId,
    start_matrix: Mat4,
    parent_to_world: Mat4,
    world_to_parent: Mat4,
    started: bool,
}

impl DraggerTransformCallback {
    /// Callback moving `target`, which must be a transform node
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            start_matrix: Mat4::identity(),
            parent_to_world: Mat4::identity(),
            world_to_parent: Mat4::identity(),
            started: false,
        }
    }

    /// Node being moved
    pub fn target(&self) -> NodeId {
        self.target
    }

    fn start(&mut self, graph: &SceneGraph) -> bool {
        let Some(matrix) = graph.matrix(self.target) else {
            log::warn!("Dragger target {:?} is not a transform node", self.target);
            return false;
        };
        let mut path = compute_node_path_to_root(graph, self.target);
        path.pop();
        let parent_to_world = graph.compute_local_to_world(&path);
        let Some(world_to_parent) = parent_to_world.inverse_or_none() else {
            log::warn!("Dragger target {:?} sits under a singular transform", self.target);
            return false;
        };

        self.start_matrix = matrix;
        self.parent_to_world = parent_to_world;
        self.world_to_parent = world_to_parent;
        self.started = true;
        true
    }
}

impl DraggerCallback for DraggerTransformCallback {
    fn receive(&mut self, graph: &mut SceneGraph, command: &MotionCommand) -> bool {
        match command.stage {
            MotionStage::Start => self.start(graph),
            MotionStage::Move if self.started => {
                let world_motion = command.local_to_world * command.motion_matrix() * command.world_to_local;
                let matrix = self.world_to_parent * world_motion * self.parent_to_world * self.start_matrix;
                graph.set_matrix(self.target, matrix).is_ok()
            }
            MotionStage::Finish if self.started => {
                self.started = false;
                true
            }
            _ => false,
        }
    }
}
