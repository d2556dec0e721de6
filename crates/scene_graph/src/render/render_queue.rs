//! Render queue produced by the cull traversal
//!
//! Collects visible drawables with their model matrices and resolved render
//! state. Opaque items are batched by shader set and drawn front to back;
//! transparent items are drawn back to front after them.

use crate::core::error::{SceneError, SceneResult};
use crate::core::thread_guard::RenderThreadGuard;
use crate::foundation::collections::DrawableId;
use crate::foundation::math::Mat4;
use crate::render::device::{CommandList, GraphicsDevice, ResourceSetHandle};
use crate::scene::{RenderState, SceneGraph};

/// One visible drawable
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    /// Drawable to submit
    pub drawable: DrawableId,
    /// Local-to-world matrix of the drawable
    pub model_matrix: Mat4,
    /// Nearest render state above (or on) the drawable
    pub render_state: Option<RenderState>,
    /// View-space distance of the drawable's bound centre from the eye
    pub depth: f32,
}

impl RenderItem {
    fn is_transparent(&self) -> bool {
        self.render_state.as_ref().is_some_and(|state| state.transparent)
    }

    fn shader_set(&self) -> Option<&str> {
        self.render_state.as_ref().and_then(|state| state.shader_set.as_deref())
    }
}

/// Opaque items sharing one shader set
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBatch {
    /// Shader set shared by every item; `None` for the backend default
    pub shader_set: Option<String>,
    /// Items in front-to-back order
    pub items: Vec<RenderItem>,
}

/// Sorted render queue for one frame
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    opaque_batches: Vec<RenderBatch>,
    transparent_items: Vec<RenderItem>,
}

impl RenderQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort and batch a list of items
    pub fn from_items(items: Vec<RenderItem>) -> Self {
        let (mut opaque, mut transparent): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|item| !item.is_transparent());

        opaque.sort_by(|a, b| a.depth.total_cmp(&b.depth));
        transparent.sort_by(|a, b| b.depth.total_cmp(&a.depth));

        // Batches appear in the order of their nearest item
        let mut opaque_batches: Vec<RenderBatch> = Vec::new();
        for item in opaque {
            let shader_set = item.shader_set().map(str::to_owned);
            match opaque_batches.iter_mut().find(|batch| batch.shader_set == shader_set) {
                Some(batch) => batch.items.push(item),
                None => opaque_batches.push(RenderBatch {
                    shader_set,
                    items: vec![item],
                }),
            }
        }

        Self {
            opaque_batches,
            transparent_items: transparent,
        }
    }

    /// Opaque batches, each front to back
    pub fn opaque_batches(&self) -> &[RenderBatch] {
        &self.opaque_batches
    }

    /// Transparent items, back to front
    pub fn transparent_items(&self) -> &[RenderItem] {
        &self.transparent_items
    }

    /// Number of opaque items
    pub fn opaque_item_count(&self) -> usize {
        self.opaque_batches.iter().map(|batch| batch.items.len()).sum()
    }

    /// Number of items of any kind
    pub fn total_item_count(&self) -> usize {
        self.opaque_item_count() + self.transparent_items.len()
    }

    /// Every item in submission order
    pub fn iter(&self) -> impl Iterator<Item = &RenderItem> {
        self.opaque_batches
            .iter()
            .flat_map(|batch| batch.items.iter())
            .chain(self.transparent_items.iter())
    }

    /// Record every item into `commands`
    pub fn draw(
        &self,
        guard: &RenderThreadGuard,
        graph: &SceneGraph,
        device: &dyn GraphicsDevice,
        resource_sets: &[(u32, ResourceSetHandle)],
        commands: &mut dyn CommandList,
    ) -> SceneResult<()> {
        guard.assert_rendering_thread()?;

        for item in self.iter() {
            let drawable = graph
                .drawable(item.drawable)
                .ok_or(SceneError::DrawableNotFound(item.drawable))?;
            commands.bind_render_state(item.render_state.as_ref());
            commands.set_model_matrix(&item.model_matrix);
            drawable.draw(guard, device, resource_sets, commands)?;
        }
        log::trace!("Submitted {} render items", self.total_item_count());
        Ok(())
    }
}
