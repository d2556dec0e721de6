//! Cull traversal building a render queue
//!
//! The visitor keeps a model-matrix stack and a render-state stack while it
//! walks down. Subtrees whose world-space bounding sphere lies outside the
//! view frustum are skipped unless culling is disabled on their root node.

use crate::bounds::{BoundingSphere, Frustum};
use crate::foundation::collections::{DrawableId, NodeId};
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::render_queue::{RenderItem, RenderQueue};
use crate::scene::node::NodeKind;
use crate::scene::{RenderState, SceneGraph};
use crate::visitor::{NodeVisitor, TraversalMode, VisitorState, VisitorType};

/// Collects visible drawables for one view
#[derive(Debug)]
pub struct CullVisitor {
    state: VisitorState,
    view: Mat4,
    frustum: Frustum,
    model_stack: Vec<Mat4>,
    render_state_stack: Vec<RenderState>,
    items: Vec<RenderItem>,
    culled: usize,
}

impl CullVisitor {
    /// Visitor for the given view and projection matrices
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            state: VisitorState::new(VisitorType::Cull, TraversalMode::TraverseAllChildren),
            view,
            frustum: Frustum::from_matrix(&(projection * view)),
            model_stack: vec![Mat4::identity()],
            render_state_stack: Vec::new(),
            items: Vec::new(),
            culled: 0,
        }
    }

    /// Number of nodes and drawables rejected by the frustum test
    pub fn culled_count(&self) -> usize {
        self.culled
    }

    /// Sort the collected items into a render queue
    pub fn into_render_queue(self) -> RenderQueue {
        RenderQueue::from_items(self.items)
    }

    fn model(&self) -> Mat4 {
        self.model_stack.last().copied().unwrap_or_else(Mat4::identity)
    }

    fn is_culled(&mut self, bound: &BoundingSphere) -> bool {
        if !bound.valid() {
            return false;
        }
        let world = bound.transformed(&self.model());
        if self.frustum.intersects_sphere(&world) {
            false
        } else {
            self.culled += 1;
            true
        }
    }
}

impl NodeVisitor for CullVisitor {
    fn state(&self) -> &VisitorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut VisitorState {
        &mut self.state
    }

    fn apply(&mut self, graph: &SceneGraph, node: NodeId) {
        let Some(current) = graph.node(node) else {
            return;
        };
        if current.culling_active() && self.is_culled(&graph.get_bound(node)) {
            log::trace!("Culled node {:?}", node);
            return;
        }

        let pushed_state = match current.render_state() {
            Some(state) => {
                self.render_state_stack.push(state.clone());
                true
            }
            None => false,
        };
        let pushed_matrix = match current.kind() {
            NodeKind::Transform(local) => {
                self.model_stack.push(self.model() * local);
                true
            }
            _ => false,
        };

        self.traverse(graph, node);

        if pushed_matrix {
            self.model_stack.pop();
        }
        if pushed_state {
            self.render_state_stack.pop();
        }
    }

    fn apply_drawable(&mut self, graph: &SceneGraph, geode: NodeId, drawable: DrawableId) {
        let Some(payload) = graph.drawable(drawable) else {
            return;
        };
        let culling_active = graph.node(geode).is_some_and(|node| node.culling_active());
        let bound = payload.get_bound();
        if culling_active && self.is_culled(&bound) {
            return;
        }

        let model = self.model();
        let depth = if bound.valid() {
            -(self.view * model).pre_multiply(&bound.center).z
        } else {
            0.0
        };
        let render_state = payload
            .render_state()
            .or_else(|| self.render_state_stack.last())
            .cloned();

        self.items.push(RenderItem {
            drawable,
            model_matrix: model,
            render_state,
            depth,
        });
    }
}
