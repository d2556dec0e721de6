//! Visitor dispatch over shared and masked subtrees

use std::collections::HashMap;

use crate::foundation::collections::{DrawableId, NodeId};
use crate::foundation::logging;
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::{Drawable, SceneGraph};
use crate::visitor::{NodePath, NodeVisitor, TraversalMode, VisitorState, VisitorType};

/// Counts handler invocations per node and records every drawable path
#[derive(Debug)]
struct VisitCounter {
    state: VisitorState,
    visits: HashMap<NodeId, usize>,
    drawable_paths: Vec<(DrawableId, NodePath)>,
}

impl VisitCounter {
    fn new(mask: u32) -> Self {
        Self {
            state: VisitorState::new(VisitorType::Node, TraversalMode::TraverseAllChildren).with_traversal_mask(mask),
            visits: HashMap::new(),
            drawable_paths: Vec::new(),
        }
    }

    fn visits(&self, node: NodeId) -> usize {
        self.visits.get(&node).copied().unwrap_or(0)
    }
}

impl NodeVisitor for VisitCounter {
    fn state(&self) -> &VisitorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut VisitorState {
        &mut self.state
    }

    fn apply_node(&mut self, graph: &SceneGraph, node: NodeId) {
        *self.visits.entry(node).or_default() += 1;
        self.traverse(graph, node);
    }

    fn apply_drawable(&mut self, _graph: &SceneGraph, _geode: NodeId, drawable: DrawableId) {
        self.drawable_paths.push((drawable, self.state.node_path.clone()));
    }
}

struct Scene {
    graph: SceneGraph,
    root: NodeId,
    visible: NodeId,
    hidden: NodeId,
    hidden_leaf: NodeId,
    shared: NodeId,
}

/// root
/// ├── visible (mask 0b01) ── shared
/// └── hidden  (mask 0b10) ── hidden_leaf ── shared
fn scene() -> Scene {
    logging::init_for_tests();
    let mut graph = SceneGraph::new();
    let root = graph.create_group("root");
    let visible = graph.create_transform("visible", Mat4::new_translation(&Vec3::x()));
    let hidden = graph.create_group("hidden");
    let hidden_leaf = graph.create_group("hidden leaf");
    let shared = graph.create_geode("shared");
    graph
        .add_drawable(shared, Drawable::line_strip("marker", &[Vec3::zeros(), Vec3::y()], [1.0; 3]))
        .unwrap();

    graph.add_child(root, visible).unwrap();
    graph.add_child(root, hidden).unwrap();
    graph.add_child(visible, shared).unwrap();
    graph.add_child(hidden, hidden_leaf).unwrap();
    graph.add_child(hidden_leaf, shared).unwrap();

    graph.node_mut(visible).unwrap().set_node_mask(0b01);
    graph.node_mut(hidden).unwrap().set_node_mask(0b10);

    Scene {
        graph,
        root,
        visible,
        hidden,
        hidden_leaf,
        shared,
    }
}

#[test]
fn test_masked_subtree_handlers_never_run() {
    let scene = scene();
    let mut counter = VisitCounter::new(0b01);
    scene.graph.accept(scene.root, &mut counter);

    assert_eq!(counter.visits(scene.root), 1);
    assert_eq!(counter.visits(scene.visible), 1);
    assert_eq!(counter.visits(scene.hidden), 0);
    assert_eq!(counter.visits(scene.hidden_leaf), 0);
    // Reached only through the visible branch
    assert_eq!(counter.visits(scene.shared), 1);
}

#[test]
fn test_shared_node_is_visited_once_per_path() {
    let scene = scene();
    let mut counter = VisitCounter::new(u32::MAX);
    scene.graph.accept(scene.root, &mut counter);

    assert_eq!(counter.visits(scene.shared), 2);
    let paths: Vec<&NodePath> = counter.drawable_paths.iter().map(|(_, path)| path).collect();
    assert_eq!(
        paths,
        vec![
            &vec![scene.root, scene.visible, scene.shared],
            &vec![scene.root, scene.hidden, scene.hidden_leaf, scene.shared],
        ]
    );
}

#[test]
fn test_path_is_empty_after_traversal() {
    let scene = scene();
    let mut counter = VisitCounter::new(u32::MAX);
    scene.graph.accept(scene.root, &mut counter);
    assert!(counter.node_path().is_empty());
}

#[test]
fn test_parent_walk_finds_both_roots_paths() {
    let scene = scene();
    let paths = scene.graph.parental_node_paths(scene.shared, None);
    assert_eq!(paths.len(), 2);
    for path in &paths {
        assert_eq!(path.first(), Some(&scene.root));
        assert_eq!(path.last(), Some(&scene.shared));
    }

    let halted = scene.graph.parental_node_paths(scene.shared, Some(scene.hidden_leaf));
    assert!(halted.contains(&vec![scene.hidden_leaf, scene.shared]));
}

#[test]
fn test_world_transform_follows_the_path() {
    let scene = scene();
    let paths = scene.graph.parental_node_paths(scene.shared, None);
    let through_visible = paths
        .iter()
        .find(|path| path.contains(&scene.visible))
        .unwrap();
    let through_hidden = paths.iter().find(|path| path.contains(&scene.hidden)).unwrap();

    assert_eq!(
        scene.graph.compute_local_to_world(through_visible),
        Mat4::new_translation(&Vec3::x())
    );
    assert_eq!(scene.graph.compute_local_to_world(through_hidden), Mat4::identity());
}
