//! Node path helpers shared by draggers and their callbacks

use crate::foundation::collections::NodeId;
use crate::scene::SceneGraph;
use crate::visitor::NodePath;

/// Root-first path from a root of the graph down to `node`, `node`
/// included.
///
/// A node reachable from a root through several parents has several such
/// paths; the first one is used. A node with no parents yields `[node]`, an
/// unknown node an empty path.
pub fn compute_node_path_to_root(graph: &SceneGraph, node: NodeId) -> NodePath {
    if !graph.contains(node) {
        return NodePath::new();
    }
    let mut paths = graph.parental_node_paths(node, None);
    if paths.len() > 1 {
        log::warn!(
            "Node {:?} has {} paths to a root, using the first",
            node,
            paths.len()
        );
    }
    if paths.is_empty() {
        NodePath::new()
    } else {
        paths.swap_remove(0)
    }
}
