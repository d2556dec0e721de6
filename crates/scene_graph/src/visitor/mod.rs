//! Visitor protocol
//!
//! Every traversal of a [`SceneGraph`] goes through the same three entry
//! points on the graph:
//!
//! - [`SceneGraph::accept`] filters by node mask, pushes the node onto the
//!   visitor's path, calls [`NodeVisitor::apply`] and pops the node again.
//! - [`SceneGraph::traverse`] accepts every child in order (or visits every
//!   drawable of a geode).
//! - [`SceneGraph::ascend`] accepts every parent.
//!
//! A visitor decides per node whether to recurse: the default handlers call
//! [`NodeVisitor::traverse`], which follows the visitor's [`TraversalMode`].
//! Overriding a handler without calling `traverse` prunes that subtree.
//!
//! Visitors only borrow the graph immutably, so independent visitors may walk
//! the same graph from different threads once it is shared behind the
//! caller's own synchronization.

pub mod compute_bounds;
pub mod cull;
pub mod parent_paths;

pub use compute_bounds::ComputeBoundsVisitor;
pub use cull::CullVisitor;
pub use parent_paths::CollectParentPaths;

use crate::foundation::collections::{DrawableId, NodeId};
use crate::scene::node::{NodeKind, NodeMask, NODE_MASK_ALL};
use crate::scene::SceneGraph;

/// Ordered list of nodes from the traversal root to the current node
pub type NodePath = Vec<NodeId>;

/// Direction a visitor recurses in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalMode {
    /// Visit only the node `accept` was called on
    TraverseNone,
    /// Walk up through every parent
    TraverseParents,
    /// Walk down through every child
    #[default]
    TraverseAllChildren,
}

/// Purpose of a traversal, for visitors that share handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitorType {
    /// Generic traversal
    #[default]
    Node,
    /// Per-frame update
    Update,
    /// Input event delivery
    Event,
    /// View-frustum culling and render-queue building
    Cull,
    /// Picking and hit testing
    Intersection,
}

/// Bookkeeping every visitor carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorState {
    /// Purpose of the traversal
    pub visitor_type: VisitorType,
    /// Recursion direction
    pub traversal_mode: TraversalMode,
    /// Mask ANDed against each node's mask
    pub traversal_mask: NodeMask,
    /// Bits ORed into each node's mask before the test
    pub node_mask_override: NodeMask,
    /// Nodes from the traversal root to the current node
    pub node_path: NodePath,
}

impl Default for VisitorState {
    fn default() -> Self {
        Self::new(VisitorType::Node, TraversalMode::TraverseAllChildren)
    }
}

impl VisitorState {
    /// State with a full traversal mask and an empty path
    pub fn new(visitor_type: VisitorType, traversal_mode: TraversalMode) -> Self {
        Self {
            visitor_type,
            traversal_mode,
            traversal_mask: NODE_MASK_ALL,
            node_mask_override: 0,
            node_path: Vec::new(),
        }
    }

    /// Same state with a different traversal mask
    pub fn with_traversal_mask(mut self, mask: NodeMask) -> Self {
        self.traversal_mask = mask;
        self
    }
}

/// Polymorphic traversal dispatcher
///
/// Implementors provide access to their [`VisitorState`] and override the
/// handlers they care about. The defaults recurse, so a visitor that only
/// overrides [`apply_drawable`](Self::apply_drawable) sees every drawable
/// reachable from the root.
pub trait NodeVisitor {
    /// Shared visitor bookkeeping
    fn state(&self) -> &VisitorState;

    /// Shared visitor bookkeeping, mutably
    fn state_mut(&mut self) -> &mut VisitorState;

    /// Entry point called by [`SceneGraph::accept`]; dispatches on node kind
    fn apply(&mut self, graph: &SceneGraph, node: NodeId) {
        let Some(kind) = graph.node(node).map(|n| n.kind()) else {
            return;
        };
        match kind {
            NodeKind::Group => self.apply_group(graph, node),
            NodeKind::Transform(_) => self.apply_transform(graph, node),
            NodeKind::Geode(_) => self.apply_geode(graph, node),
        }
    }

    /// Fallback handler for every kind
    fn apply_node(&mut self, graph: &SceneGraph, node: NodeId) {
        self.traverse(graph, node);
    }

    /// Handler for plain groups
    fn apply_group(&mut self, graph: &SceneGraph, node: NodeId) {
        self.apply_node(graph, node);
    }

    /// Handler for transform nodes; defaults to the group handler
    fn apply_transform(&mut self, graph: &SceneGraph, node: NodeId) {
        self.apply_group(graph, node);
    }

    /// Handler for geodes
    fn apply_geode(&mut self, graph: &SceneGraph, node: NodeId) {
        self.apply_node(graph, node);
    }

    /// Called by [`SceneGraph::traverse`] for each drawable of a geode
    fn apply_drawable(&mut self, _graph: &SceneGraph, _geode: NodeId, _drawable: DrawableId) {}

    /// Recurse according to the traversal mode
    fn traverse(&mut self, graph: &SceneGraph, node: NodeId) {
        match self.state().traversal_mode {
            TraversalMode::TraverseNone => {}
            TraversalMode::TraverseParents => graph.ascend(node, self),
            TraversalMode::TraverseAllChildren => graph.traverse(node, self),
        }
    }

    /// Whether a node with `node_mask` should be visited
    fn valid_node_mask(&self, node_mask: NodeMask) -> bool {
        let state = self.state();
        state.traversal_mask & (node_mask | state.node_mask_override) != 0
    }

    /// Nodes from the traversal root to the current node
    fn node_path(&self) -> &[NodeId] {
        &self.state().node_path
    }

    /// Called by [`SceneGraph::accept`] before [`apply`](Self::apply)
    fn push_onto_node_path(&mut self, node: NodeId) {
        let state = self.state_mut();
        match state.traversal_mode {
            // Parent walks record the path root-first
            TraversalMode::TraverseParents => state.node_path.insert(0, node),
            _ => state.node_path.push(node),
        }
    }

    /// Called by [`SceneGraph::accept`] after [`apply`](Self::apply)
    fn pop_from_node_path(&mut self) {
        let state = self.state_mut();
        match state.traversal_mode {
            TraversalMode::TraverseParents => {
                if !state.node_path.is_empty() {
                    state.node_path.remove(0);
                }
            }
            _ => {
                state.node_path.pop();
            }
        }
    }
}
