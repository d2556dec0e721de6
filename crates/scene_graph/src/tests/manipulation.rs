//! Pointer-driven manipulation from window events to moved nodes

use approx::assert_relative_eq;

use crate::bounds::{BoundingBox, Plane};
use crate::core::config::ManipulatorConfig;
use crate::foundation::collections::NodeId;
use crate::foundation::logging;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::input::{ActionAdapter, EventDispatcher, PointerInfo, UiEvent, UiEventType};
use crate::manipulators::{
    BoundingBoxConstraint, Dragger, GridConstraint, Motion, MotionCommand, MotionStage, PlaneProjector, Projector,
    ScaleMode,
};
use crate::scene::{SceneGraph, Shape, TessellationHints};

/// Camera looking straight down -Y: NDC `(x, y)` becomes the vertical ray
/// through world `(x, _, y)` from `y = 5` to `y = -5`
struct TopDownCamera {
    redraws: usize,
}

impl ActionAdapter for TopDownCamera {
    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    fn inverse_view_projection(&self) -> Option<Mat4> {
        #[rustfmt::skip]
        let inverse = Mat4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, -10.0, 5.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        Some(inverse)
    }
}

fn vertical_pointer(x: f32, z: f32) -> PointerInfo {
    PointerInfo::new(Vec3::new(x, 5.0, z), Vec3::new(x, -5.0, z))
}

fn origin_of(graph: &SceneGraph, node: NodeId) -> Vec3 {
    graph.matrix(node).unwrap().pre_multiply(&Vec3::zeros())
}

/// Scene root holding a cube under a transform at `(5, 0, 0)`
fn scene_with_target() -> (SceneGraph, NodeId, NodeId) {
    logging::init_for_tests();
    let mut graph = SceneGraph::new();
    let root = graph.create_group("root");
    let target = graph.create_transform("target", Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)));
    let geode = graph.create_geode("cube");
    let cube = Shape::cube(Vec3::zeros(), 1.0)
        .build_drawable("cube", &TessellationHints::default(), &[[0.8; 3]])
        .unwrap();
    graph.add_drawable(geode, cube).unwrap();
    graph.add_child(target, geode).unwrap();
    graph.add_child(root, target).unwrap();
    (graph, root, target)
}

fn ungated() -> ManipulatorConfig {
    ManipulatorConfig {
        check_for_node_in_path: false,
        ..ManipulatorConfig::default()
    }
}

#[test]
fn test_plane_projection_round_trip() {
    let projector = PlaneProjector::new(Plane::new(0.0, 1.0, 0.0, 0.0));

    let start = projector.project(&vertical_pointer(0.0, 0.0)).unwrap();
    let current = projector.project(&vertical_pointer(1.0, 2.0)).unwrap();
    assert_relative_eq!(start, Vec3::zeros());
    assert_relative_eq!(current, Vec3::new(1.0, 0.0, 2.0));

    let command = MotionCommand::new(
        MotionStage::Move,
        Motion::TranslateInPlane {
            plane: *projector.plane(),
            translation: current - start,
        },
    )
    .with_reference_point(start);
    assert_relative_eq!(command.translation().unwrap(), Vec3::new(1.0, 0.0, 2.0));
    assert_relative_eq!(command.motion_matrix().pre_multiply(&start), current);
}

#[test]
fn test_window_events_drag_target_and_dragger() {
    let (mut graph, root, target) = scene_with_target();
    let mut dragger = Dragger::translate_2d(&mut graph, &ManipulatorConfig::default()).unwrap();
    graph.add_child(root, dragger.root()).unwrap();
    dragger.add_transform_updating(target);
    dragger.handle_commands_for_self(true);
    let dragger_root = dragger.root();
    let first_handle = dragger.handles()[0];

    let mut dispatcher = EventDispatcher::new();
    dispatcher.add_handler(Box::new(dragger));
    let mut camera = TopDownCamera { redraws: 0 };

    // Empty space next to the handles is not consumed
    let miss = UiEvent::pointer(UiEventType::Push, 0.2, 0.3);
    assert!(!dispatcher.dispatch(&mut graph, &miss, &mut camera).unwrap());
    assert_eq!(camera.redraws, 0);

    // Press on the +X cone
    let push = UiEvent::pointer(UiEventType::Push, 0.55, 0.01);
    assert!(dispatcher.dispatch(&mut graph, &push, &mut camera).unwrap());
    let pick_color = ManipulatorConfig::default().pick_color;
    assert_eq!(graph.node(first_handle).unwrap().render_state().unwrap().color, pick_color);

    dispatcher.send(UiEvent::pointer(UiEventType::Drag, 1.05, 1.01));
    dispatcher.send(UiEvent::pointer(UiEventType::Drag, 1.55, 2.01));
    dispatcher.send(UiEvent::pointer(UiEventType::Release, 1.55, 2.01));
    dispatcher.dispatch_pending(&mut graph, &mut camera).unwrap();

    assert_relative_eq!(origin_of(&graph, target), Vec3::new(6.0, 0.0, 2.0), epsilon = 1.0e-5);
    assert_relative_eq!(origin_of(&graph, dragger_root), Vec3::new(1.0, 0.0, 2.0), epsilon = 1.0e-5);
    assert_eq!(camera.redraws, 4);

    let handle_color = ManipulatorConfig::default().handle_color;
    assert_eq!(graph.node(first_handle).unwrap().render_state().unwrap().color, handle_color);

    // The moved dragger bound follows its transform
    assert!(graph.get_bound(dragger_root).center.z > 1.5);
}

#[test]
fn test_ungated_dragger_takes_presses_inside_its_bound() {
    let (mut graph, root, target) = scene_with_target();
    let mut dragger = Dragger::translate_2d(&mut graph, &ungated()).unwrap();
    graph.add_child(root, dragger.root()).unwrap();
    dragger.add_transform_updating(target);

    let mut dispatcher = EventDispatcher::new();
    dispatcher.add_handler(Box::new(dragger));
    let mut camera = TopDownCamera { redraws: 0 };

    // Outside the dragger bound entirely
    let outside = UiEvent::pointer(UiEventType::Push, 3.0, 3.0);
    assert!(!dispatcher.dispatch(&mut graph, &outside, &mut camera).unwrap());

    // Between the handles, where no triangle is hit
    let inside = UiEvent::pointer(UiEventType::Push, 0.2, 0.3);
    assert!(dispatcher.dispatch(&mut graph, &inside, &mut camera).unwrap());
    let drag = UiEvent::pointer(UiEventType::Drag, 1.2, 1.3);
    assert!(dispatcher.dispatch(&mut graph, &drag, &mut camera).unwrap());

    assert_relative_eq!(origin_of(&graph, target), Vec3::new(6.0, 0.0, 1.0), epsilon = 1.0e-5);
}

#[test]
fn test_grid_constraint_snaps_target_motion() {
    let (mut graph, _, target) = scene_with_target();
    let mut dragger = Dragger::translate_2d(&mut graph, &ungated()).unwrap();
    dragger.add_transform_updating(target);
    dragger.add_constraint(GridConstraint::new(Vec3::zeros(), Vec3::new(0.5, 0.0, 0.5)));
    let mut camera = TopDownCamera { redraws: 0 };

    let push = UiEvent::pointer(UiEventType::Push, 0.0, 0.0);
    dragger.handle_pointer(&mut graph, &vertical_pointer(0.0, 0.0), &push, &mut camera).unwrap();
    let drag = UiEvent::pointer(UiEventType::Drag, 0.0, 0.0);
    dragger.handle_pointer(&mut graph, &vertical_pointer(0.7, 0.2), &drag, &mut camera).unwrap();

    assert_relative_eq!(origin_of(&graph, target), Vec3::new(5.5, 0.0, 0.0), epsilon = 1.0e-5);
}

#[test]
fn test_box_constraint_clamps_and_empty_box_vetoes() {
    let (mut graph, _, target) = scene_with_target();
    let mut dragger = Dragger::translate_2d(&mut graph, &ungated()).unwrap();
    dragger.add_transform_updating(target);
    dragger.add_constraint(BoundingBoxConstraint::new(BoundingBox::new(Vec3::repeat(-1.0), Vec3::repeat(1.0))));
    let mut camera = TopDownCamera { redraws: 0 };

    let push = UiEvent::pointer(UiEventType::Push, 0.0, 0.0);
    dragger.handle_pointer(&mut graph, &vertical_pointer(0.0, 0.0), &push, &mut camera).unwrap();
    let drag = UiEvent::pointer(UiEventType::Drag, 0.0, 0.0);
    dragger.handle_pointer(&mut graph, &vertical_pointer(4.0, -0.5), &drag, &mut camera).unwrap();
    assert_relative_eq!(origin_of(&graph, target), Vec3::new(6.0, 0.0, -0.5), epsilon = 1.0e-5);

    let (mut graph, _, target) = scene_with_target();
    let mut vetoing = Dragger::translate_2d(&mut graph, &ungated()).unwrap();
    vetoing.add_transform_updating(target);
    vetoing.add_constraint(BoundingBoxConstraint::new(BoundingBox::invalid()));
    vetoing.handle_pointer(&mut graph, &vertical_pointer(0.0, 0.0), &push, &mut camera).unwrap();
    vetoing.handle_pointer(&mut graph, &vertical_pointer(4.0, -0.5), &drag, &mut camera).unwrap();
    assert_relative_eq!(origin_of(&graph, target), Vec3::new(5.0, 0.0, 0.0));
}

#[test]
fn test_scale_dragger_scales_target_about_opposite_corner() {
    let mut graph = SceneGraph::new();
    let target = graph.create_transform("target", Mat4::identity());
    let mut dragger = Dragger::scale_2d(&mut graph, &ManipulatorConfig::default(), ScaleMode::OppositeHandleAsPivot).unwrap();
    dragger.add_transform_updating(target);
    let mut camera = TopDownCamera { redraws: 0 };

    let top_right = dragger.handles()[3];
    let mut pointer = vertical_pointer(0.5, 0.5);
    pointer.add_hit(vec![dragger.root(), top_right]);
    let push = UiEvent::pointer(UiEventType::Push, 0.0, 0.0);
    assert!(dragger.handle_pointer(&mut graph, &pointer, &push, &mut camera).unwrap());

    pointer.set_near_far(Vec3::new(1.5, 5.0, 1.5), Vec3::new(1.5, -5.0, 1.5));
    let drag = UiEvent::pointer(UiEventType::Drag, 0.0, 0.0);
    dragger.handle_pointer(&mut graph, &pointer, &drag, &mut camera).unwrap();

    let matrix = graph.matrix(target).unwrap();
    assert_relative_eq!(matrix.pre_multiply(&Vec3::new(-0.5, 0.0, -0.5)), Vec3::new(-0.5, 0.0, -0.5), epsilon = 1.0e-5);
    assert_relative_eq!(matrix.pre_multiply(&Vec3::new(0.5, 0.0, 0.5)), Vec3::new(1.5, 0.0, 1.5), epsilon = 1.0e-5);
    // Height is untouched
    assert_relative_eq!(matrix.pre_multiply(&Vec3::new(0.0, 1.0, 0.0)).y, 1.0, epsilon = 1.0e-5);
}

#[test]
fn test_dragger_under_transform_projects_in_local_frame() {
    let mut graph = SceneGraph::new();
    let root = graph.create_group("root");
    let lifted = graph.create_transform("lifted", Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0)));
    graph.add_child(root, lifted).unwrap();
    let mut dragger = Dragger::translate_2d(&mut graph, &ungated()).unwrap();
    graph.add_child(lifted, dragger.root()).unwrap();

    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = seen.clone();
    dragger.add_callback(move |_: &mut SceneGraph, command: &MotionCommand| {
        sink.borrow_mut().push(*command);
        true
    });
    let mut camera = TopDownCamera { redraws: 0 };

    let push = UiEvent::pointer(UiEventType::Push, 0.0, 0.0);
    dragger.handle_pointer(&mut graph, &vertical_pointer(1.0, 1.0), &push, &mut camera).unwrap();

    let seen = seen.borrow();
    assert_eq!(seen[0].stage, MotionStage::Start);
    // Local plane y = 0 sits at world y = 2; the start point is local
    assert_relative_eq!(seen[0].reference_point, Vec3::new(1.0, 0.0, 1.0));
    assert_relative_eq!(seen[0].local_to_world.pre_multiply(&Vec3::zeros()), Vec3::new(0.0, 2.0, 0.0));
}
