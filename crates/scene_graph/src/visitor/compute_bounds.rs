//! World-space bounding box of everything under a node

use crate::bounds::BoundingBox;
use crate::foundation::collections::{DrawableId, NodeId};
use crate::foundation::math::Mat4;
use crate::scene::node::NodeMask;
use crate::scene::SceneGraph;
use crate::visitor::{NodeVisitor, TraversalMode, VisitorState, VisitorType};

/// Accumulates drawable boxes, each transformed by the transforms above it.
///
/// Unlike node bounding spheres, the result is a tight box in the frame the
/// traversal started in.
#[derive(Debug)]
pub struct ComputeBoundsVisitor {
    state: VisitorState,
    matrix_stack: Vec<Mat4>,
    bounding_box: BoundingBox,
}

impl Default for ComputeBoundsVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBoundsVisitor {
    /// Visitor that accepts every node
    pub fn new() -> Self {
        Self {
            state: VisitorState::new(VisitorType::Node, TraversalMode::TraverseAllChildren),
            matrix_stack: vec![Mat4::identity()],
            bounding_box: BoundingBox::invalid(),
        }
    }

    /// Visitor that only descends into nodes matching `mask`
    pub fn with_traversal_mask(mask: NodeMask) -> Self {
        let mut visitor = Self::new();
        visitor.state.traversal_mask = mask;
        visitor
    }

    /// Box accumulated so far; invalid when nothing was visited
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Clear the accumulated box and matrix stack
    pub fn reset(&mut self) {
        self.matrix_stack.truncate(1);
        self.bounding_box = BoundingBox::invalid();
    }

    fn top(&self) -> Mat4 {
        self.matrix_stack.last().copied().unwrap_or_else(Mat4::identity)
    }
}

impl NodeVisitor for ComputeBoundsVisitor {
    fn state(&self) -> &VisitorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut VisitorState {
        &mut self.state
    }

    fn apply_transform(&mut self, graph: &SceneGraph, node: NodeId) {
        let local = graph.matrix(node).unwrap_or_else(Mat4::identity);
        let world = self.top() * local;
        self.matrix_stack.push(world);
        self.traverse(graph, node);
        self.matrix_stack.pop();
    }

    fn apply_drawable(&mut self, graph: &SceneGraph, _geode: NodeId, drawable: DrawableId) {
        let local = graph.drawable_bounding_box(drawable);
        if local.valid() {
            self.bounding_box.expand_by(&local.transformed(&self.top()));
        }
    }
}
