//! Graphics backend abstraction consumed by drawables
//!
//! The scene graph never talks to a GPU API directly. A backend implements
//! these traits; drawables upload their vertex data through them and record
//! draw calls into a [`CommandList`].

use crate::core::error::SceneResult;
use crate::foundation::math::Mat4;
use crate::scene::RenderState;

/// Identifies one graphics device; drawables keep buffers per device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u64);

/// Handle to a device buffer created by a [`ResourceFactory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Handle to a bound resource set (uniforms, textures, samplers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceSetHandle(pub u64);

/// What a buffer will be bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Index buffer (u32 indices)
    Index,
}

/// Buffer creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescription {
    /// Capacity in bytes
    pub size_in_bytes: u64,
    /// Binding usage
    pub usage: BufferUsage,
}

/// Device that owns buffers and accepts uploads
pub trait GraphicsDevice {
    /// Identity of the device
    fn device_id(&self) -> DeviceId;

    /// Copy `data` into `buffer` starting at `offset_in_bytes`
    fn update_buffer(&mut self, buffer: BufferHandle, offset_in_bytes: u64, data: &[u8]) -> SceneResult<()>;
}

/// Creates device resources
pub trait ResourceFactory {
    /// Allocate a buffer
    fn create_buffer(&mut self, description: &BufferDescription) -> SceneResult<BufferHandle>;
}

/// Recorder for draw commands
pub trait CommandList {
    /// Bind a vertex buffer to `slot`
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferHandle);

    /// Bind the index buffer
    fn set_index_buffer(&mut self, buffer: BufferHandle);

    /// Bind a resource set to `slot`
    fn set_resource_set(&mut self, slot: u32, set: ResourceSetHandle);

    /// Set the model matrix for the following draws
    fn set_model_matrix(&mut self, _matrix: &Mat4) {}

    /// Bind the pipeline state for the following draws
    fn bind_render_state(&mut self, _state: Option<&RenderState>) {}

    /// Non-indexed draw
    fn draw(&mut self, vertex_count: u32, instance_count: u32, vertex_start: u32, instance_start: u32);

    /// Indexed draw
    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        index_start: u32,
        vertex_offset: i32,
        instance_start: u32,
    );
}
