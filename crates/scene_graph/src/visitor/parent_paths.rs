//! Collect every path from a node up to the roots above it

use crate::foundation::collections::NodeId;
use crate::scene::node::NODE_MASK_ALL;
use crate::scene::SceneGraph;
use crate::visitor::{NodePath, NodeVisitor, TraversalMode, VisitorState, VisitorType};

/// Walks up through parents and records one root-first path per root
/// reached. A walk also ends at the optional halt node.
///
/// Node masks are ignored: a hidden ancestor still contributes to world
/// transforms.
#[derive(Debug)]
pub struct CollectParentPaths {
    state: VisitorState,
    halt: Option<NodeId>,
    paths: Vec<NodePath>,
}

impl CollectParentPaths {
    /// Collector that stops at `halt` (inclusive) or at parentless nodes
    pub fn new(halt: Option<NodeId>) -> Self {
        let mut state = VisitorState::new(VisitorType::Node, TraversalMode::TraverseParents);
        state.node_mask_override = NODE_MASK_ALL;
        Self {
            state,
            halt,
            paths: Vec::new(),
        }
    }

    /// Paths collected so far
    pub fn paths(&self) -> &[NodePath] {
        &self.paths
    }

    /// Consume the collector and return its paths
    pub fn into_paths(self) -> Vec<NodePath> {
        self.paths
    }
}

impl NodeVisitor for CollectParentPaths {
    fn state(&self) -> &VisitorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut VisitorState {
        &mut self.state
    }

    fn apply_node(&mut self, graph: &SceneGraph, node: NodeId) {
        let is_root = graph.parents(node).is_empty();
        if is_root || Some(node) == self.halt {
            self.paths.push(self.state.node_path.clone());
        } else {
            self.traverse(graph, node);
        }
    }
}
