//! Rendering boundary
//!
//! The scene graph does not own a GPU backend. [`device`] declares the narrow
//! interfaces a backend implements; [`render_queue`] holds the sorted output of
//! a cull traversal and submits it through those interfaces.

pub mod device;
pub mod render_queue;

pub use device::{
    BufferDescription, BufferHandle, BufferUsage, CommandList, DeviceId, GraphicsDevice,
    ResourceFactory, ResourceSetHandle,
};
pub use render_queue::{RenderBatch, RenderItem, RenderQueue};
