//! Home-position camera manipulation
//!
//! A [`CameraManipulator`] frames a subgraph: it derives a home eye, center
//! and up from the subgraph's bound and returns the view there on request.
//! The home view looks along +Y at the bound's center with +Z up.

use crate::bounds::BoundingSphere;
use crate::core::error::SceneResult;
use crate::foundation::collections::NodeId;
use crate::foundation::math::{constants::EPSILON, Mat4, Point3, Vec3};
use crate::input::events::{ActionAdapter, InputEventHandler, KeyCode, UiEvent, UiEventType};
use crate::scene::SceneGraph;
use crate::visitor::ComputeBoundsVisitor;

/// Eye distance in bound radii when no view angle is known
const UNKNOWN_ANGLE_DISTANCE: f32 = 3.5;

/// Space bar
pub const DEFAULT_HOME_KEY: KeyCode = KeyCode(0x20);

/// Camera controller that knows how to return to a framing home view
#[derive(Debug, Clone)]
pub struct CameraManipulator {
    node: Option<NodeId>,
    home_eye: Vec3,
    home_center: Vec3,
    home_up: Vec3,
    auto_compute_home_position: bool,
    /// Half of the narrower field of view, radians
    half_view_angle: Option<f32>,
    home_key: KeyCode,
    eye: Vec3,
    center: Vec3,
    up: Vec3,
}

impl Default for CameraManipulator {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraManipulator {
    /// Manipulator one unit behind the origin, recomputing home on demand
    pub fn new() -> Self {
        let (eye, center, up) = (-Vec3::y(), Vec3::zeros(), Vec3::z());
        Self {
            node: None,
            home_eye: eye,
            home_center: center,
            home_up: up,
            auto_compute_home_position: true,
            half_view_angle: None,
            home_key: DEFAULT_HOME_KEY,
            eye,
            center,
            up,
        }
    }

    /// Frame `node` when computing the home position
    pub fn set_node(&mut self, node: Option<NodeId>) {
        self.node = node;
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Use the camera's narrower full field of view, in radians, to place
    /// the home eye; `None` falls back to a fixed multiple of the radius
    pub fn set_field_of_view(&mut self, field_of_view: Option<f32>) {
        self.half_view_angle = field_of_view.map(|angle| angle * 0.5);
    }

    /// Key whose press returns the view home
    pub fn set_home_key(&mut self, key: KeyCode) {
        self.home_key = key;
    }

    pub fn set_home_position(&mut self, eye: Vec3, center: Vec3, up: Vec3, auto_compute_home_position: bool) {
        self.auto_compute_home_position = auto_compute_home_position;
        self.home_eye = eye;
        self.home_center = center;
        self.home_up = up;
        log::trace!("Home position set - eye: {:?}, center: {:?}, up: {:?}", eye, center, up);
    }

    /// Home `(eye, center, up)`
    pub fn home_position(&self) -> (Vec3, Vec3, Vec3) {
        (self.home_eye, self.home_center, self.home_up)
    }

    pub fn set_auto_compute_home_position(&mut self, flag: bool) {
        self.auto_compute_home_position = flag;
    }

    pub fn auto_compute_home_position(&self) -> bool {
        self.auto_compute_home_position
    }

    /// Derive the home position from the framed node's bound.
    ///
    /// With `use_bounding_box` the tight box of the subgraph's drawables is
    /// used, falling back to the node's bounding sphere when the subgraph has
    /// no drawables. The home eye backs off along -Y far enough for the bound
    /// to fill the view angle. An unset node or an empty bound leaves the
    /// home position untouched.
    pub fn compute_home_position(&mut self, graph: &SceneGraph, use_bounding_box: bool) {
        let Some(node) = self.node else {
            return;
        };

        let mut bound = BoundingSphere::invalid();
        if use_bounding_box {
            let mut visitor = ComputeBoundsVisitor::new();
            graph.accept(node, &mut visitor);
            bound = BoundingSphere::from(visitor.bounding_box());
        }
        if !bound.valid() {
            bound = graph.get_bound(node);
        }
        if !bound.valid() {
            log::warn!("Cannot frame {:?}: its bound is empty", node);
            return;
        }

        let radius = bound.radius.max(EPSILON);
        let distance = match self.half_view_angle.map(f32::sin) {
            Some(sin) if sin > EPSILON => radius / sin,
            _ => UNKNOWN_ANGLE_DISTANCE * radius,
        };
        log::debug!("Home framing {:?}: center {:?}, distance {}", node, bound.center, distance);

        self.set_home_position(
            bound.center - Vec3::y() * distance,
            bound.center,
            Vec3::z(),
            self.auto_compute_home_position,
        );
    }

    /// Return the view to the home position, recomputing it first when
    /// auto-compute is on
    pub fn home(&mut self, graph: &SceneGraph, action: &mut dyn ActionAdapter) {
        if self.auto_compute_home_position {
            self.compute_home_position(graph, false);
        }
        self.eye = self.home_eye;
        self.center = self.home_center;
        self.up = self.home_up;
        action.request_redraw();
    }

    /// Current `(eye, center, up)`
    pub fn view(&self) -> (Vec3, Vec3, Vec3) {
        (self.eye, self.center, self.up)
    }

    /// World-to-eye matrix of the current view
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(self.eye), &Point3::from(self.center), &self.up)
    }
}

impl InputEventHandler for CameraManipulator {
    fn handle(
        &mut self,
        graph: &mut SceneGraph,
        event: &UiEvent,
        action: &mut dyn ActionAdapter,
    ) -> SceneResult<bool> {
        if event.event_type == UiEventType::KeyDown && event.key == Some(self.home_key) {
            self.home(graph, action);
            return Ok(true);
        }
        Ok(false)
    }
}
