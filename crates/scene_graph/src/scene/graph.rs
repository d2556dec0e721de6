//! Arena-backed scene graph
//!
//! [`SceneGraph`] owns every node and drawable. Edges are id lists kept in
//! both directions: a group lists its children, every node lists the groups
//! holding it. A child may have several parents (instancing); a drawable is
//! owned by exactly one geode.
//!
//! Bounds are lazy. Structural mutations call [`SceneGraph::dirty_bound`],
//! which marks the node and every ancestor dirty and stops at nodes that are
//! already dirty. [`SceneGraph::get_bound`] recomputes only dirty subtrees.
//!
//! Cycles are a caller error. With [`GraphConfig::check_cycles`] enabled,
//! `add_child` rejects edges that would create one.

use std::cell::Cell;
use std::collections::HashSet;

use crate::bounds::{BoundingBox, BoundingSphere};
use crate::core::config::GraphConfig;
use crate::core::error::{SceneError, SceneResult};
use crate::core::thread_guard::RenderThreadGuard;
use crate::foundation::collections::{DrawableArena, DrawableId, NodeArena, NodeId};
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::device::{GraphicsDevice, ResourceFactory};
use crate::scene::drawable::Drawable;
use crate::scene::node::{ComputeBoundCallback, Node, NodeKind};
use crate::scene::render_state::RenderState;
use crate::visitor::{CollectParentPaths, NodePath, NodeVisitor};

/// Retained-mode scene graph
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: NodeArena<Node>,
    drawables: DrawableArena<Drawable>,
    config: GraphConfig,
    bound_computations: Cell<u64>,
}

impl SceneGraph {
    /// Empty graph with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty graph with the given configuration
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Node creation and lookup
    // ---------------------------------------------------------------------

    fn create_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        let name = name.into();
        let mask = self.config.default_node_mask;
        let id = self
            .nodes
            .insert_with_key(|id| Node::new(id, name, kind, mask));
        log::debug!("Created node {:?}", id);
        id
    }

    /// Create a group node
    pub fn create_group(&mut self, name: impl Into<String>) -> NodeId {
        self.create_node(name, NodeKind::Group)
    }

    /// Create a transform node with the given local matrix
    pub fn create_transform(&mut self, name: impl Into<String>, matrix: Mat4) -> NodeId {
        self.create_node(name, NodeKind::Transform(matrix))
    }

    /// Create a geode with no drawables
    pub fn create_geode(&mut self, name: impl Into<String>) -> NodeId {
        self.create_node(name, NodeKind::Geode(Vec::new()))
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Node by id, mutably. Structure and bounds are changed through the
    /// graph; this only exposes names, masks and render state.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over every live node
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    fn get(&self, id: NodeId) -> SceneResult<&Node> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    /// Children of a node, empty for geodes and stale ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(Node::children).unwrap_or(&[])
    }

    /// Parents of a node, empty for roots and stale ids
    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(Node::parents).unwrap_or(&[])
    }

    // ---------------------------------------------------------------------
    // Structure
    // ---------------------------------------------------------------------

    /// Append `child` to the children of `parent`
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        let index = self.get(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    /// Insert `child` at `index` in the children of `parent`; indices past
    /// the end append.
    ///
    /// Adding a child that is already present is a no-op. Self references,
    /// non-group parents and (with cycle checks on) edges that would close a
    /// cycle fail with [`SceneError::InvalidOperation`].
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> SceneResult<()> {
        if parent == child {
            return Err(SceneError::InvalidOperation(format!(
                "node {parent:?} cannot be its own child"
            )));
        }
        self.get(child)?;
        let parent_node = self.get(parent)?;
        if !parent_node.kind.is_group() {
            return Err(SceneError::InvalidOperation(format!(
                "node {parent:?} ('{}') cannot hold child nodes",
                parent_node.name()
            )));
        }
        if parent_node.children.contains(&child) {
            log::debug!("Node {:?} is already a child of {:?}", child, parent);
            return Ok(());
        }
        if self.config.check_cycles && self.is_ancestor_of(child, parent) {
            return Err(SceneError::InvalidOperation(format!(
                "adding {child:?} under {parent:?} would create a cycle"
            )));
        }

        let parent_node = self.get_mut(parent)?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);
        self.get_mut(child)?.parents.push(parent);
        self.dirty_bound(parent);
        log::debug!("Added child {:?} to {:?} at {}", child, parent, index);
        Ok(())
    }

    /// Remove `child` from the children of `parent`.
    ///
    /// Returns `Ok(false)` when `child` was not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<bool> {
        let parent_node = self.get_mut(parent)?;
        if !parent_node.kind.is_group() {
            return Err(SceneError::InvalidOperation(format!(
                "node {parent:?} cannot hold child nodes"
            )));
        }
        let Some(position) = parent_node.children.iter().position(|c| *c == child) else {
            return Ok(false);
        };
        parent_node.children.remove(position);

        if let Some(child_node) = self.nodes.get_mut(child) {
            if let Some(p) = child_node.parents.iter().position(|p| *p == parent) {
                child_node.parents.remove(p);
            }
        }
        self.dirty_bound(parent);
        log::debug!("Removed child {:?} from {:?}", child, parent);
        Ok(true)
    }

    /// Whether `ancestor` is reachable by walking up from `node` (or is `node`)
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            if current == ancestor {
                return true;
            }
            if visited.insert(current) {
                pending.extend_from_slice(self.parents(current));
            }
        }
        false
    }

    /// Detach a node from its parents and children and free it together
    /// with the drawables it owns. Former children stay in the arena.
    pub fn remove_node(&mut self, id: NodeId) -> SceneResult<()> {
        let node = self.nodes.remove(id).ok_or(SceneError::NodeNotFound(id))?;

        for parent in &node.parents {
            if let Some(parent_node) = self.nodes.get_mut(*parent) {
                parent_node.children.retain(|c| *c != id);
            }
            self.dirty_bound(*parent);
        }
        for child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(*child) {
                child_node.parents.retain(|p| *p != id);
            }
        }
        for drawable in node.drawables() {
            self.drawables.remove(*drawable);
        }
        log::debug!("Removed node {:?} ('{}')", id, node.name());
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Drawables
    // ---------------------------------------------------------------------

    /// Move `drawable` into the graph, owned by `geode`
    pub fn add_drawable(&mut self, geode: NodeId, mut drawable: Drawable) -> SceneResult<DrawableId> {
        let node = self.get(geode)?;
        if !matches!(node.kind, NodeKind::Geode(_)) {
            return Err(SceneError::InvalidOperation(format!(
                "node {geode:?} ('{}') is not a geode",
                node.name()
            )));
        }

        drawable.owner = Some(geode);
        let id = self.drawables.insert(drawable);
        if let NodeKind::Geode(drawables) = &mut self.get_mut(geode)?.kind {
            drawables.push(id);
        }
        self.dirty_bound(geode);
        log::debug!("Added drawable {:?} to geode {:?}", id, geode);
        Ok(id)
    }

    /// Remove a drawable from its geode and return it.
    ///
    /// Returns `Ok(None)` when `drawable` is not owned by `geode`.
    pub fn remove_drawable(&mut self, geode: NodeId, drawable: DrawableId) -> SceneResult<Option<Drawable>> {
        let NodeKind::Geode(drawables) = &mut self.get_mut(geode)?.kind else {
            return Err(SceneError::InvalidOperation(format!("node {geode:?} is not a geode")));
        };
        let Some(position) = drawables.iter().position(|d| *d == drawable) else {
            return Ok(None);
        };
        drawables.remove(position);

        let mut removed = self.drawables.remove(drawable);
        if let Some(removed) = removed.as_mut() {
            removed.owner = None;
        }
        self.dirty_bound(geode);
        log::debug!("Removed drawable {:?} from geode {:?}", drawable, geode);
        Ok(removed)
    }

    /// Drawable by id
    pub fn drawable(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.get(id)
    }

    /// Iterate over every drawable in the graph
    pub fn drawables(&self) -> impl Iterator<Item = (DrawableId, &Drawable)> {
        self.drawables.iter()
    }

    /// Change a drawable and dirty its bounding box and the bounds of its
    /// geode and every ancestor
    pub fn modify_drawable<R>(
        &mut self,
        id: DrawableId,
        modify: impl FnOnce(&mut Drawable) -> R,
    ) -> SceneResult<R> {
        let drawable = self
            .drawables
            .get_mut(id)
            .ok_or(SceneError::DrawableNotFound(id))?;
        let result = modify(drawable);
        drawable.dirty_bound();
        let owner = drawable.owner;
        if let Some(owner) = owner {
            self.dirty_bound(owner);
        }
        Ok(result)
    }

    /// Bounding box of a drawable, recomputed when dirty
    pub fn drawable_bounding_box(&self, id: DrawableId) -> BoundingBox {
        self.drawables
            .get(id)
            .map_or_else(BoundingBox::invalid, Drawable::get_bounding_box)
    }

    /// Create device buffers for every drawable that has none on `device`
    pub fn configure_device_buffers(
        &mut self,
        guard: &RenderThreadGuard,
        device: &mut dyn GraphicsDevice,
        factory: &mut dyn ResourceFactory,
    ) -> SceneResult<()> {
        for (_, drawable) in self.drawables.iter_mut() {
            drawable.configure_device_buffers(guard, device, factory)?;
        }
        Ok(())
    }

    /// Upload changed geometry of every drawable to `device`
    pub fn update_device_buffers(
        &mut self,
        guard: &RenderThreadGuard,
        device: &mut dyn GraphicsDevice,
    ) -> SceneResult<()> {
        for (_, drawable) in self.drawables.iter_mut() {
            drawable.update_device_buffers(guard, device)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Transforms and per-node state
    // ---------------------------------------------------------------------

    /// Local matrix of a transform node
    pub fn matrix(&self, id: NodeId) -> Option<Mat4> {
        self.nodes.get(id).and_then(|node| node.matrix().copied())
    }

    /// Replace the local matrix of a transform node
    pub fn set_matrix(&mut self, id: NodeId, matrix: Mat4) -> SceneResult<()> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Transform(current) => *current = matrix,
            _ => {
                return Err(SceneError::InvalidOperation(format!(
                    "node {id:?} is not a transform"
                )))
            }
        }
        self.dirty_bound(id);
        Ok(())
    }

    /// Change the floor every computed bound of `id` contains
    pub fn set_initial_bound(&mut self, id: NodeId, bound: BoundingSphere) -> SceneResult<()> {
        self.get_mut(id)?.initial_bound = bound;
        self.dirty_bound(id);
        Ok(())
    }

    /// Replace the default bound computation of `id`
    pub fn set_compute_bound_callback(
        &mut self,
        id: NodeId,
        callback: Option<ComputeBoundCallback>,
    ) -> SceneResult<()> {
        self.get_mut(id)?.compute_bound_callback = callback;
        self.dirty_bound(id);
        Ok(())
    }

    /// Product of every transform on `path`, root first
    pub fn compute_local_to_world(&self, path: &[NodeId]) -> Mat4 {
        path.iter()
            .filter_map(|id| self.matrix(*id))
            .fold(Mat4::identity(), |world, local| world * local)
    }

    /// Inverse of [`compute_local_to_world`](Self::compute_local_to_world);
    /// `None` when a transform on the path is singular
    pub fn compute_world_to_local(&self, path: &[NodeId]) -> Option<Mat4> {
        self.compute_local_to_world(path).inverse_or_none()
    }

    /// Render state of the deepest node on `path` that carries one
    pub fn resolve_render_state(&self, path: &[NodeId]) -> Option<&RenderState> {
        path.iter()
            .rev()
            .find_map(|id| self.nodes.get(*id).and_then(Node::render_state))
    }

    // ---------------------------------------------------------------------
    // Bounds
    // ---------------------------------------------------------------------

    /// Mark `id` and every ancestor dirty, stopping at nodes already dirty
    pub fn dirty_bound(&self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if node.bound.mark_dirty() {
                pending.extend_from_slice(&node.parents);
            }
        }
    }

    /// Bounding sphere of `id`, recomputed when dirty.
    ///
    /// A stale id yields the invalid sphere.
    pub fn get_bound(&self, id: NodeId) -> BoundingSphere {
        let Some(node) = self.nodes.get(id) else {
            log::warn!("Bound requested for missing node {:?}", id);
            return BoundingSphere::invalid();
        };
        if let Some(bound) = node.bound.get() {
            return bound;
        }

        let mut bound = node.initial_bound;
        bound.expand_by(&self.compute_bound(node));
        node.bound.set_clean(bound);
        self.bound_computations.set(self.bound_computations.get() + 1);
        log::trace!("Recomputed bound of {:?}: {:?}", id, bound);
        bound
    }

    /// Default bound of a node, ignoring its initial bound
    pub fn compute_bound(&self, node: &Node) -> BoundingSphere {
        // Children are always brought up to date so dirtying keeps
        // propagating through nodes with a custom callback.
        let children = match &node.kind {
            NodeKind::Group => self.children_bound(node),
            NodeKind::Transform(matrix) => self.children_bound(node).transformed(matrix),
            NodeKind::Geode(drawables) => {
                let mut bounding_box = BoundingBox::invalid();
                for drawable in drawables {
                    bounding_box.expand_by(&self.drawable_bounding_box(*drawable));
                }
                BoundingSphere::from(bounding_box)
            }
        };

        match &node.compute_bound_callback {
            Some(callback) => callback(self, node.id),
            None => children,
        }
    }

    fn children_bound(&self, node: &Node) -> BoundingSphere {
        let mut bound = BoundingSphere::invalid();
        for child in &node.children {
            bound.expand_by(&self.get_bound(*child));
        }
        bound
    }

    /// Number of node bound recomputations since the graph was created
    pub fn bound_computations(&self) -> u64 {
        self.bound_computations.get()
    }

    // ---------------------------------------------------------------------
    // Visitor entry points
    // ---------------------------------------------------------------------

    /// Visit `id` unless the visitor's mask rejects it
    pub fn accept<V: NodeVisitor + ?Sized>(&self, id: NodeId, visitor: &mut V) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !visitor.valid_node_mask(node.node_mask()) {
            return;
        }
        visitor.push_onto_node_path(id);
        visitor.apply(self, id);
        visitor.pop_from_node_path();
    }

    /// Accept every child of `id` in order, or visit every drawable of a geode
    pub fn traverse<V: NodeVisitor + ?Sized>(&self, id: NodeId, visitor: &mut V) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Geode(drawables) => {
                for drawable in drawables {
                    visitor.apply_drawable(self, id, *drawable);
                }
            }
            _ => {
                for child in &node.children {
                    self.accept(*child, visitor);
                }
            }
        }
    }

    /// Accept every parent of `id`
    pub fn ascend<V: NodeVisitor + ?Sized>(&self, id: NodeId, visitor: &mut V) {
        for parent in self.parents(id) {
            self.accept(*parent, visitor);
        }
    }

    /// Every path from a root (or from `halt`) down to `id`, root first
    pub fn parental_node_paths(&self, id: NodeId, halt: Option<NodeId>) -> Vec<NodePath> {
        let mut collector = CollectParentPaths::new(halt);
        self.accept(id, &mut collector);
        collector.into_paths()
    }
}
