//! Interactive draggers
//!
//! A dragger is a transform node in the scene graph carrying handle geometry
//! beneath it, plus the interaction state kept here. Pointer events become
//! motion commands:
//!
//! - **Push** on a handle (or anywhere in the bound when the handle gate
//!   is off) configures the projector with the dragger's
//!   local-to-world, projects the pointer and dispatches a `Start` command.
//! - **Drag** re-projects the pointer and dispatches `Move` with the offset
//!   from the start point.
//! - **Release** dispatches `Finish` and restores the handle color.
//!
//! Every command passes the registered constraints first and then reaches
//! every callback.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bounds::Plane;
use crate::core::config::ManipulatorConfig;
use crate::core::error::{SceneError, SceneResult};
use crate::foundation::collections::NodeId;
use crate::foundation::math::{constants::EPSILON, Mat4, Mat4Ext, Vec2, Vec3};
use crate::input::{ActionAdapter, InputEventHandler, PointerInfo, UiEvent, UiEventType};
use crate::intersect::{IntersectionLimit, IntersectionVisitor, Intersector, LineSegmentIntersector};
use crate::manipulators::callback::{DraggerCallback, DraggerTransformCallback};
use crate::manipulators::command::{Motion, MotionCommand, MotionStage};
use crate::manipulators::constraint::Constraint;
use crate::manipulators::path::compute_node_path_to_root;
use crate::manipulators::projector::{LineProjector, PlaneProjector, Projector};
use crate::scene::{Drawable, RenderState, SceneGraph, Shape, TessellationHints};

/// Corner handles of a 2D scale dragger, in XZ: top-left, bottom-left,
/// bottom-right, top-right
const SCALE_HANDLE_POSITIONS: [[f32; 2]; 4] = [[-0.5, 0.5], [-0.5, -0.5], [0.5, -0.5], [0.5, 0.5]];

/// Pivot used by a 2D scale dragger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Scale about the dragger's local origin
    OriginAsPivot,
    /// Scale about the handle diagonally opposite the picked one
    #[default]
    OppositeHandleAsPivot,
}

/// The closed set of dragger behaviours
#[derive(Debug, Clone)]
pub enum DraggerKind {
    /// Translation along a line
    Translate1D {
        /// Projector onto the line
        projector: LineProjector,
    },
    /// Translation in the local XZ plane
    Translate2D {
        /// Projector onto the plane
        projector: PlaneProjector,
    },
    /// Non-uniform scale in the local XZ plane
    Scale2D {
        /// Projector onto the plane
        projector: PlaneProjector,
        /// Pivot choice
        scale_mode: ScaleMode,
        /// Pivot of the current drag
        scale_center: Vec2,
        /// Position of the picked handle
        reference_point: Vec2,
    },
}

impl DraggerKind {
    fn projector(&self) -> &dyn Projector {
        match self {
            DraggerKind::Translate1D { projector } => projector,
            DraggerKind::Translate2D { projector } | DraggerKind::Scale2D { projector, .. } => projector,
        }
    }

    fn projector_mut(&mut self) -> &mut dyn Projector {
        match self {
            DraggerKind::Translate1D { projector } => projector,
            DraggerKind::Translate2D { projector } | DraggerKind::Scale2D { projector, .. } => projector,
        }
    }
}

/// Interactive manipulator attached to a scene graph
pub struct Dragger {
    root: NodeId,
    kind: DraggerKind,
    handles: Vec<NodeId>,
    callbacks: Vec<Box<dyn DraggerCallback>>,
    constraints: Vec<Box<dyn Constraint>>,
    self_updater: Option<DraggerTransformCallback>,
    pointer: PointerInfo,
    active: bool,
    start_point: Vec3,
    current_point: Vec3,
    picked_handle: Option<NodeId>,
    config: ManipulatorConfig,
}

impl fmt::Debug for Dragger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dragger")
            .field("root", &self.root)
            .field("kind", &self.kind)
            .field("handles", &self.handles)
            .field("callbacks", &self.callbacks.len())
            .field("constraints", &self.constraints.len())
            .field("self_updating", &self.self_updater.is_some())
            .field("active", &self.active)
            .finish()
    }
}

impl Dragger {
    fn with_root(graph: &mut SceneGraph, name: &str, kind: DraggerKind, config: &ManipulatorConfig) -> Self {
        let root = graph.create_transform(name, Mat4::identity());
        Self {
            root,
            kind,
            handles: Vec::new(),
            callbacks: Vec::new(),
            constraints: Vec::new(),
            self_updater: None,
            pointer: PointerInfo::default(),
            active: false,
            start_point: Vec3::zeros(),
            current_point: Vec3::zeros(),
            picked_handle: None,
            config: config.clone(),
        }
    }

    /// Dragger translating along the line through `line_start` and
    /// `line_end`, with a cone handle at each end
    pub fn translate_1d(
        graph: &mut SceneGraph,
        config: &ManipulatorConfig,
        line_start: Vec3,
        line_end: Vec3,
    ) -> SceneResult<Self> {
        if (line_end - line_start).norm() <= EPSILON {
            return Err(SceneError::UnsupportedConfiguration(
                "translate dragger needs two distinct line points".to_string(),
            ));
        }
        let kind = DraggerKind::Translate1D {
            projector: LineProjector::new(line_start, line_end),
        };
        let mut dragger = Self::with_root(graph, "Translate1DDragger", kind, config);

        dragger.add_line(graph, "axis", &[line_start, line_end])?;
        for (position, direction) in [(line_end, line_end - line_start), (line_start, line_start - line_end)] {
            dragger.add_cone_handle(graph, position, direction)?;
        }
        Ok(dragger)
    }

    /// Dragger translating in the local XZ plane, with a cone handle at the
    /// end of each half axis
    pub fn translate_2d(graph: &mut SceneGraph, config: &ManipulatorConfig) -> SceneResult<Self> {
        let kind = DraggerKind::Translate2D {
            projector: PlaneProjector::new(Plane::new(0.0, 1.0, 0.0, 0.0)),
        };
        let mut dragger = Self::with_root(graph, "Translate2DDragger", kind, config);

        dragger.add_line(graph, "x axis", &[Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0)])?;
        dragger.add_line(graph, "z axis", &[Vec3::new(0.0, 0.0, -0.5), Vec3::new(0.0, 0.0, 0.5)])?;
        for direction in [Vec3::x(), -Vec3::x(), Vec3::z(), -Vec3::z()] {
            dragger.add_cone_handle(graph, direction * 0.5, direction)?;
        }
        Ok(dragger)
    }

    /// Dragger scaling in the local XZ plane, with a box handle on each
    /// corner of the unit square
    pub fn scale_2d(graph: &mut SceneGraph, config: &ManipulatorConfig, scale_mode: ScaleMode) -> SceneResult<Self> {
        let kind = DraggerKind::Scale2D {
            projector: PlaneProjector::new(Plane::new(0.0, 1.0, 0.0, 0.0)),
            scale_mode,
            scale_center: Vec2::zeros(),
            reference_point: Vec2::zeros(),
        };
        let mut dragger = Self::with_root(graph, "Scale2DDragger", kind, config);

        let corners: Vec<Vec3> = SCALE_HANDLE_POSITIONS
            .iter()
            .map(|[x, z]| Vec3::new(*x, 0.0, *z))
            .collect();
        let outline = [corners[0], corners[1], corners[2], corners[3], corners[0]];
        dragger.add_line(graph, "outline", &outline)?;

        for corner in &corners {
            let cube = Shape::cube(*corner, dragger.config.handle_size);
            dragger.add_handle(graph, "corner handle", cube)?;
        }
        Ok(dragger)
    }

    fn handle_rgb(&self) -> [f32; 3] {
        let [r, g, b, _] = self.config.handle_color;
        [r, g, b]
    }

    fn add_line(&mut self, graph: &mut SceneGraph, name: &str, points: &[Vec3]) -> SceneResult<NodeId> {
        let geode = graph.create_geode(name);
        graph.add_drawable(geode, Drawable::line_strip(name, points, self.handle_rgb()))?;
        graph.add_child(self.root, geode)?;
        Ok(geode)
    }

    fn add_handle(&mut self, graph: &mut SceneGraph, name: &str, shape: Shape) -> SceneResult<NodeId> {
        let parent = self.root;
        self.add_handle_under(graph, parent, name, shape)
    }

    fn add_handle_under(
        &mut self,
        graph: &mut SceneGraph,
        parent: NodeId,
        name: &str,
        shape: Shape,
    ) -> SceneResult<NodeId> {
        let drawable = shape.build_drawable(name, &TessellationHints::default(), &[self.handle_rgb()])?;
        let geode = graph.create_geode(name);
        graph.add_drawable(geode, drawable)?;
        set_color(graph, geode, self.config.handle_color)?;
        graph.add_child(parent, geode)?;
        self.handles.push(geode);
        Ok(geode)
    }

    /// Cone at `position` pointing along `direction`
    fn add_cone_handle(&mut self, graph: &mut SceneGraph, position: Vec3, direction: Vec3) -> SceneResult<NodeId> {
        let placement = Mat4::new_translation(&position) * Mat4::make_rotate(&Vec3::z(), &direction.normalize());
        let transform = graph.create_transform("cone placement", placement);
        graph.add_child(self.root, transform)?;

        let radius = self.config.handle_size;
        self.add_handle_under(graph, transform, "cone handle", Shape::cone(Vec3::zeros(), radius, radius * 4.0))
    }

    /// Transform node the handle geometry hangs from
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Behaviour of this dragger
    pub fn kind(&self) -> &DraggerKind {
        &self.kind
    }

    /// Pickable handle geodes
    pub fn handles(&self) -> &[NodeId] {
        &self.handles
    }

    /// Whether a drag is in progress
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Pointer state of the current or last interaction
    pub fn pointer(&self) -> &PointerInfo {
        &self.pointer
    }

    /// Handle picked by the current drag
    pub fn picked_handle(&self) -> Option<NodeId> {
        self.picked_handle
    }

    /// Settings this dragger was built with
    pub fn config(&self) -> &ManipulatorConfig {
        &self.config
    }

    /// Require pushes to land on a handle
    pub fn set_check_for_node_in_path(&mut self, check: bool) {
        self.config.check_for_node_in_path = check;
    }

    /// Register an observer of motion commands
    pub fn add_callback(&mut self, callback: impl DraggerCallback + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Number of registered observers
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Register a constraint; constraints run in registration order
    pub fn add_constraint(&mut self, constraint: impl Constraint + 'static) {
        self.constraints.push(Box::new(constraint));
    }

    /// Move `target` along with every drag of this dragger
    pub fn add_transform_updating(&mut self, target: NodeId) {
        self.add_callback(DraggerTransformCallback::new(target));
    }

    /// Whether the dragger applies its own commands to its root transform,
    /// so the handles follow the pointer
    pub fn handle_commands_for_self(&mut self, enabled: bool) {
        self.self_updater = enabled.then(|| DraggerTransformCallback::new(self.root));
    }

    /// Constrain `command` and hand it to every callback.
    ///
    /// Returns whether any callback reported handling it; `false` also when
    /// a constraint vetoed the command.
    pub fn dispatch(&mut self, graph: &mut SceneGraph, mut command: MotionCommand) -> bool {
        for constraint in &self.constraints {
            if !constraint.constrain(&mut command) {
                log::debug!("{:?} command vetoed by a constraint", command.stage);
                return false;
            }
        }
        // Constraints may pull a scale handle onto or past its pivot
        if let Motion::Scale2D { scale, .. } = &mut command.motion {
            for axis in 0..2 {
                scale[axis] = scale[axis].max(self.config.min_scale);
            }
        }

        let mut handled = false;
        if let Some(updater) = &mut self.self_updater {
            handled |= updater.receive(graph, &command);
        }
        for callback in &mut self.callbacks {
            handled |= callback.receive(graph, &command);
        }
        handled
    }

    /// Drive the dragger with an event whose pointer has already been
    /// resolved and picked.
    ///
    /// Returns `Ok(true)` when the event was used. Pushes that miss every
    /// handle (when gated) or that cannot be projected are ignored; drags and
    /// releases are ignored unless a drag is in progress.
    pub fn handle_pointer(
        &mut self,
        graph: &mut SceneGraph,
        pointer: &PointerInfo,
        event: &UiEvent,
        action: &mut dyn ActionAdapter,
    ) -> SceneResult<bool> {
        match event.event_type {
            UiEventType::Push => self.begin(graph, pointer, action),
            UiEventType::Drag if self.active => {
                if let Some(point) = self.kind.projector().project(pointer) {
                    self.current_point = point;
                    let command = self.command(MotionStage::Move, point);
                    self.dispatch(graph, command);
                    action.request_redraw();
                }
                Ok(true)
            }
            UiEventType::Release if self.active => {
                if let Some(point) = self.kind.projector().project(pointer) {
                    self.current_point = point;
                }
                log::debug!("Dragger {:?} finished", self.root);
                let command = self.command(MotionStage::Finish, self.current_point);
                self.dispatch(graph, command);

                if let Some(handle) = self.picked_handle.take() {
                    set_color(graph, handle, self.config.handle_color)?;
                }
                self.active = false;
                action.request_redraw();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn begin(
        &mut self,
        graph: &mut SceneGraph,
        pointer: &PointerInfo,
        action: &mut dyn ActionAdapter,
    ) -> SceneResult<bool> {
        let picked = self.handles.iter().copied().find(|handle| pointer.contains(*handle));
        if self.config.check_for_node_in_path && picked.is_none() {
            return Ok(false);
        }

        let path = compute_node_path_to_root(graph, self.root);
        let local_to_world = graph.compute_local_to_world(&path);
        if !self.kind.projector_mut().set_local_to_world(local_to_world) {
            return Ok(false);
        }
        let Some(point) = self.kind.projector().project(pointer) else {
            log::debug!("Push on dragger {:?} does not project", self.root);
            return Ok(false);
        };

        self.start_point = point;
        self.current_point = point;
        self.picked_handle = picked;
        self.choose_scale_pivot(picked, point);
        self.active = true;
        log::debug!("Dragger {:?} started at {:?}", self.root, point);

        let command = self.command(MotionStage::Start, point);
        self.dispatch(graph, command);

        if let Some(handle) = picked {
            set_color(graph, handle, self.config.pick_color)?;
        }
        action.request_redraw();
        Ok(true)
    }

    fn choose_scale_pivot(&mut self, picked: Option<NodeId>, point: Vec3) {
        let DraggerKind::Scale2D { scale_mode, scale_center, reference_point, .. } = &mut self.kind else {
            return;
        };

        // Without a picked handle, the corner nearest the press stands in
        let index = picked
            .and_then(|handle| self.handles.iter().position(|h| *h == handle))
            .unwrap_or_else(|| nearest_corner(Vec2::new(point.x, point.z)));
        let [x, z] = SCALE_HANDLE_POSITIONS[index % 4];
        *reference_point = Vec2::new(x, z);
        *scale_center = match scale_mode {
            ScaleMode::OriginAsPivot => Vec2::zeros(),
            ScaleMode::OppositeHandleAsPivot => {
                let [ox, oz] = SCALE_HANDLE_POSITIONS[(index + 2) % 4];
                Vec2::new(ox, oz)
            }
        };
        log::trace!("Scale dragger {:?} pivots on {:?}", self.root, scale_center);
    }

    /// Command for `stage` with the pointer projected at `point`
    fn command(&self, stage: MotionStage, point: Vec3) -> MotionCommand {
        let translation = point - self.start_point;
        let (motion, reference) = match &self.kind {
            DraggerKind::Translate1D { projector } => (
                Motion::TranslateInLine {
                    line_start: projector.line_start(),
                    line_end: projector.line_end(),
                    translation,
                },
                self.start_point,
            ),
            DraggerKind::Translate2D { projector } => (
                Motion::TranslateInPlane {
                    plane: *projector.plane(),
                    translation,
                },
                self.start_point,
            ),
            DraggerKind::Scale2D { scale_center, reference_point, .. } => {
                let start = Vec2::new(self.start_point.x, self.start_point.z);
                let current = Vec2::new(point.x, point.z);
                let mut scale = Vec2::new(1.0, 1.0);
                for axis in 0..2 {
                    let span = start[axis] - scale_center[axis];
                    if span.abs() > EPSILON {
                        scale[axis] = (current[axis] - scale_center[axis]) / span;
                    }
                    scale[axis] = scale[axis].max(self.config.min_scale);
                }
                (
                    Motion::Scale2D {
                        scale,
                        scale_center: *scale_center,
                        reference_point: *reference_point,
                    },
                    Vec3::new(reference_point.x, 0.0, reference_point.y),
                )
            }
        };

        let frame = self.kind.projector().frame();
        MotionCommand::new(stage, motion)
            .with_reference_point(reference)
            .with_frame(*frame.local_to_world(), *frame.world_to_local())
    }
}

impl InputEventHandler for Dragger {
    /// Turn window events into pointer rays, pick on push, and drive
    /// [`Dragger::handle_pointer`]. The camera comes from the action adapter;
    /// without one the event is ignored.
    fn handle(
        &mut self,
        graph: &mut SceneGraph,
        event: &UiEvent,
        action: &mut dyn ActionAdapter,
    ) -> SceneResult<bool> {
        match event.event_type {
            UiEventType::Push => {
                let Some(inverse) = action.inverse_view_projection() else {
                    return Ok(false);
                };
                let mut pointer = PointerInfo::from_ndc(&inverse, event.x, event.y);

                let path = compute_node_path_to_root(graph, self.root);
                let Some(&scene_root) = path.first() else {
                    return Ok(false);
                };
                let intersector =
                    LineSegmentIntersector::new(pointer.near_point, pointer.far_point, IntersectionLimit::NoLimit);
                let mut visitor = IntersectionVisitor::new(intersector);
                graph.accept(scene_root, &mut visitor);

                let hits: Vec<_> = visitor
                    .intersector()
                    .intersections()
                    .iter()
                    .filter(|hit| hit.passes_through(self.root))
                    .cloned()
                    .collect();
                if hits.is_empty() {
                    if self.config.check_for_node_in_path {
                        return Ok(false);
                    }
                    // Ungated draggers take presses anywhere inside their bound
                    let parent_path = &path[..path.len() - 1];
                    let bound = graph
                        .get_bound(self.root)
                        .transformed(&graph.compute_local_to_world(parent_path));
                    if !bound.intersects_segment(pointer.near_point, pointer.far_point) {
                        return Ok(false);
                    }
                }
                pointer.set_hit_list(&hits);
                self.pointer = pointer.clone();
                self.handle_pointer(graph, &pointer, event, action)
            }
            UiEventType::Drag | UiEventType::Release if self.active => {
                if let Some(inverse) = action.inverse_view_projection() {
                    let moved = PointerInfo::from_ndc(&inverse, event.x, event.y);
                    self.pointer.set_near_far(moved.near_point, moved.far_point);
                }
                let pointer = self.pointer.clone();
                self.handle_pointer(graph, &pointer, event, action)
            }
            _ => Ok(false),
        }
    }
}

fn set_color(graph: &mut SceneGraph, node: NodeId, color: [f32; 4]) -> SceneResult<()> {
    let node_ref = graph.node_mut(node).ok_or(SceneError::NodeNotFound(node))?;
    match node_ref.render_state().cloned() {
        Some(mut state) => {
            state.color = color;
            node_ref.set_render_state(Some(state));
        }
        None => node_ref.set_render_state(Some(RenderState::with_color(color))),
    }
    Ok(())
}

fn nearest_corner(point: Vec2) -> usize {
    SCALE_HANDLE_POSITIONS
        .iter()
        .map(|[x, z]| (Vec2::new(*x, *z) - point).norm_squared())
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map_or(0, |(index, _)| index)
}
