//! Scene graph vertices
//!
//! A [`Node`] is stored in the [`SceneGraph`](super::SceneGraph) arena and
//! addressed by [`NodeId`]. Parent and child edges are lists of ids; the
//! arena owns the node storage, so edges never decide lifetime.

use std::cell::Cell;
use std::fmt;

use crate::bounds::BoundingSphere;
use crate::foundation::collections::{DrawableId, NodeId};
use crate::foundation::math::Mat4;
use crate::scene::render_state::RenderState;
use crate::scene::SceneGraph;

/// Bitmask used to filter traversal
pub type NodeMask = u32;

/// Mask that matches every visitor
pub const NODE_MASK_ALL: NodeMask = u32::MAX;

/// Mask that hides a node from every visitor
pub const NODE_MASK_NONE: NodeMask = 0;

/// Cached value with an explicit clean/dirty tag
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheState<T> {
    /// The cached value is stale and must be recomputed before use
    Dirty,
    /// The cached value is current
    Clean(T),
}

/// Interior-mutable cache used for lazily computed bounds
#[derive(Debug)]
pub struct BoundCache<T: Copy> {
    state: Cell<CacheState<T>>,
}

impl<T: Copy> BoundCache<T> {
    /// A cache that starts dirty
    pub fn dirty() -> Self {
        Self { state: Cell::new(CacheState::Dirty) }
    }

    /// Cached value when clean
    pub fn get(&self) -> Option<T> {
        match self.state.get() {
            CacheState::Clean(value) => Some(value),
            CacheState::Dirty => None,
        }
    }

    /// Whether the value must be recomputed
    pub fn is_dirty(&self) -> bool {
        matches!(self.state.get(), CacheState::Dirty)
    }

    /// Store a freshly computed value
    pub fn set_clean(&self, value: T) {
        self.state.set(CacheState::Clean(value));
    }

    /// Invalidate; returns `false` when already dirty
    pub fn mark_dirty(&self) -> bool {
        if self.is_dirty() {
            return false;
        }
        self.state.set(CacheState::Dirty);
        true
    }
}

/// Replaces the default bound computation of a node
pub type ComputeBoundCallback = Box<dyn Fn(&SceneGraph, NodeId) -> BoundingSphere + Send>;

/// Closed set of node variants
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Composite node owning an ordered list of children
    Group,
    /// Group whose children live in the coordinate frame given by the matrix
    Transform(Mat4),
    /// Leaf node owning drawables
    Geode(Vec<DrawableId>),
}

impl NodeKind {
    /// Whether nodes of this kind can own child nodes
    pub fn is_group(&self) -> bool {
        matches!(self, NodeKind::Group | NodeKind::Transform(_))
    }
}

/// A vertex in the scene graph
pub struct Node {
    pub(crate) id: NodeId,
    name: String,
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parents: Vec<NodeId>,
    node_mask: NodeMask,
    render_state: Option<RenderState>,
    culling_active: bool,
    pub(crate) initial_bound: BoundingSphere,
    pub(crate) bound: BoundCache<BoundingSphere>,
    pub(crate) compute_bound_callback: Option<ComputeBoundCallback>,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: String, kind: NodeKind, node_mask: NodeMask) -> Self {
        Self {
            id,
            name,
            kind,
            children: Vec::new(),
            parents: Vec::new(),
            node_mask,
            render_state: None,
            culling_active: true,
            initial_bound: BoundingSphere::invalid(),
            bound: BoundCache::dirty(),
            compute_bound_callback: None,
        }
    }

    /// Handle of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Node variant
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Child nodes in traversal order (empty for geodes)
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Groups holding this node, in the order they adopted it
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Number of parents
    pub fn num_parents(&self) -> usize {
        self.parents.len()
    }

    /// Drawables owned by a geode (empty for other kinds)
    pub fn drawables(&self) -> &[DrawableId] {
        match &self.kind {
            NodeKind::Geode(drawables) => drawables,
            _ => &[],
        }
    }

    /// Local matrix of a transform node
    pub fn matrix(&self) -> Option<&Mat4> {
        match &self.kind {
            NodeKind::Transform(matrix) => Some(matrix),
            _ => None,
        }
    }

    /// Traversal mask
    pub fn node_mask(&self) -> NodeMask {
        self.node_mask
    }

    /// Change the traversal mask
    pub fn set_node_mask(&mut self, mask: NodeMask) {
        self.node_mask = mask;
    }

    /// Render state override, if any
    pub fn render_state(&self) -> Option<&RenderState> {
        self.render_state.as_ref()
    }

    /// Set or clear the render state override
    pub fn set_render_state(&mut self, render_state: Option<RenderState>) {
        self.render_state = render_state;
    }

    /// Render state override, created with defaults when absent
    pub fn get_or_create_render_state(&mut self) -> &mut RenderState {
        self.render_state.get_or_insert_with(RenderState::default)
    }

    /// Whether cull traversals may skip this subtree when it is off screen
    pub fn culling_active(&self) -> bool {
        self.culling_active
    }

    /// Enable or disable view-frustum culling for this subtree
    pub fn set_culling_active(&mut self, active: bool) {
        self.culling_active = active;
    }

    /// User-supplied floor the computed bound always contains
    pub fn initial_bound(&self) -> BoundingSphere {
        self.initial_bound
    }

    /// Whether the cached bound must be recomputed before use
    pub fn is_bound_dirty(&self) -> bool {
        self.bound.is_dirty()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("children", &self.children)
            .field("parents", &self.parents)
            .field("node_mask", &self.node_mask)
            .field("bound", &self.bound.get())
            .finish_non_exhaustive()
    }
}
