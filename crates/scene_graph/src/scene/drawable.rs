//! Drawable geometry payload
//!
//! A [`Drawable`] holds vertex and index data plus the primitive sets that
//! describe how to draw them. Its bounding box follows the same lazy contract
//! as node bounds: any geometry change marks it dirty and the next
//! [`Drawable::get_bounding_box`] recomputes it.
//!
//! Drawables stored in a [`SceneGraph`](super::SceneGraph) are owned by
//! exactly one geode; change them through
//! [`SceneGraph::modify_drawable`](super::SceneGraph::modify_drawable) so the
//! geode and its ancestors are dirtied as well.

use std::collections::HashMap;
use std::fmt;

use crate::bounds::{BoundingBox, BoundingSphere};
use crate::core::error::{SceneError, SceneResult};
use crate::core::thread_guard::RenderThreadGuard;
use crate::foundation::collections::NodeId;
use crate::foundation::math::Vec3;
use crate::render::device::{
    BufferDescription, BufferHandle, BufferUsage, CommandList, DeviceId, GraphicsDevice,
    ResourceFactory, ResourceSetHandle,
};
use crate::scene::geometry::{PrimitiveSet, PrimitiveTopology, Vertex};
use crate::scene::node::BoundCache;
use crate::scene::render_state::RenderState;

/// Replaces the default bounding-box computation of a drawable
pub type ComputeBoundingBoxCallback = Box<dyn Fn(&Drawable) -> BoundingBox + Send>;

/// Replaces the default draw implementation of a drawable
pub type DrawCallback = Box<dyn Fn(&Drawable, &mut dyn CommandList) + Send>;

/// Buffers of one drawable on one device
#[derive(Debug, Clone, Copy)]
struct DeviceBuffers {
    vertex: BufferHandle,
    vertex_capacity: u64,
    index: Option<BufferHandle>,
    index_capacity: u64,
    revision: u64,
}

/// Renderable geometry payload
pub struct Drawable {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    primitive_sets: Vec<PrimitiveSet>,
    render_state: Option<RenderState>,
    initial_bounding_box: BoundingBox,
    fixed_bounding_box: Option<BoundingBox>,
    bounding_box: BoundCache<BoundingBox>,
    compute_bounding_box_callback: Option<ComputeBoundingBoxCallback>,
    draw_callback: Option<DrawCallback>,
    device_buffers: HashMap<DeviceId, DeviceBuffers>,
    revision: u64,
    pub(crate) owner: Option<NodeId>,
}

impl Drawable {
    /// Empty drawable
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            indices: Vec::new(),
            primitive_sets: Vec::new(),
            render_state: None,
            initial_bounding_box: BoundingBox::invalid(),
            fixed_bounding_box: None,
            bounding_box: BoundCache::dirty(),
            compute_bounding_box_callback: None,
            draw_callback: None,
            device_buffers: HashMap::new(),
            revision: 0,
            owner: None,
        }
    }

    /// Drawable with geometry and a single primitive set
    pub fn with_geometry(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        primitive_set: PrimitiveSet,
    ) -> Self {
        let mut drawable = Self::new(name);
        drawable.vertices = vertices;
        drawable.indices = indices;
        drawable.primitive_sets.push(primitive_set);
        drawable
    }

    /// Non-indexed line strip through `points`
    pub fn line_strip(name: impl Into<String>, points: &[Vec3], color: [f32; 3]) -> Self {
        let vertices: Vec<Vertex> = points.iter().map(|p| Vertex::colored(*p, color)).collect();
        let count = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
        Self::with_geometry(
            name,
            vertices,
            Vec::new(),
            PrimitiveSet::draw_arrays(PrimitiveTopology::LineStrip, 0, count),
        )
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the drawable
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Geode owning this drawable, if it is stored in a graph
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Vertex data
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Replace the vertex data
    pub fn set_vertices(&mut self, vertices: Vec<Vertex>) {
        self.vertices = vertices;
        self.geometry_changed();
    }

    /// Index data
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Replace the index data
    pub fn set_indices(&mut self, indices: Vec<u32>) {
        self.indices = indices;
        self.geometry_changed();
    }

    /// Draw ranges
    pub fn primitive_sets(&self) -> &[PrimitiveSet] {
        &self.primitive_sets
    }

    /// Append a draw range
    pub fn add_primitive_set(&mut self, primitive_set: PrimitiveSet) {
        self.primitive_sets.push(primitive_set);
        self.dirty_bound();
    }

    /// Render state override, if any
    pub fn render_state(&self) -> Option<&RenderState> {
        self.render_state.as_ref()
    }

    /// Set or clear the render state override
    pub fn set_render_state(&mut self, render_state: Option<RenderState>) {
        self.render_state = render_state;
    }

    /// Floor that the computed bounding box always contains
    pub fn initial_bounding_box(&self) -> BoundingBox {
        self.initial_bounding_box
    }

    /// Change the floor bounding box
    pub fn set_initial_bounding_box(&mut self, bounding_box: BoundingBox) {
        self.initial_bounding_box = bounding_box;
        self.dirty_bound();
    }

    /// Pin the bounding box, bypassing computation; `None` unpins it
    pub fn set_fixed_bounding_box(&mut self, bounding_box: Option<BoundingBox>) {
        self.fixed_bounding_box = bounding_box;
        self.dirty_bound();
    }

    /// Install a custom bounding-box computation
    pub fn set_compute_bounding_box_callback(&mut self, callback: Option<ComputeBoundingBoxCallback>) {
        self.compute_bounding_box_callback = callback;
        self.dirty_bound();
    }

    /// Install a custom draw implementation
    pub fn set_draw_callback(&mut self, callback: Option<DrawCallback>) {
        self.draw_callback = callback;
    }

    /// Mark the bounding box stale
    pub fn dirty_bound(&self) {
        self.bounding_box.mark_dirty();
    }

    /// Whether the bounding box must be recomputed
    pub fn is_bound_dirty(&self) -> bool {
        self.bounding_box.is_dirty()
    }

    /// Counter bumped on every vertex or index change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn geometry_changed(&mut self) {
        self.revision += 1;
        self.dirty_bound();
    }

    /// Bounding box, recomputed when dirty
    pub fn get_bounding_box(&self) -> BoundingBox {
        if let Some(bounding_box) = self.bounding_box.get() {
            return bounding_box;
        }

        let bounding_box = if let Some(fixed) = self.fixed_bounding_box {
            fixed
        } else {
            let mut bounding_box = self.initial_bounding_box;
            let computed = match &self.compute_bounding_box_callback {
                Some(callback) => callback(self),
                None => self.compute_bounding_box(),
            };
            bounding_box.expand_by(&computed);
            bounding_box
        };

        self.bounding_box.set_clean(bounding_box);
        bounding_box
    }

    /// Bounding sphere derived from the bounding box
    pub fn get_bound(&self) -> BoundingSphere {
        BoundingSphere::from(self.get_bounding_box())
    }

    /// Box around every vertex
    pub fn compute_bounding_box(&self) -> BoundingBox {
        let mut bounding_box = BoundingBox::invalid();
        for vertex in &self.vertices {
            bounding_box.expand_by_point(vertex.position());
        }
        bounding_box
    }

    /// Visit every triangle as `(primitive_index, a, b, c)` with object-space
    /// corners. Lines and points are skipped, as are out-of-range indices.
    pub fn for_each_triangle(&self, mut visit: impl FnMut(usize, Vec3, Vec3, Vec3)) {
        let mut primitive_index = 0;
        for primitive_set in &self.primitive_sets {
            for [i0, i1, i2] in primitive_set.triangle_indices() {
                let corners = [i0, i1, i2].map(|i| self.vertex_for(primitive_set, i));
                if let [Some(a), Some(b), Some(c)] = corners {
                    visit(primitive_index, a, b, c);
                }
                primitive_index += 1;
            }
        }
    }

    fn vertex_for(&self, primitive_set: &PrimitiveSet, element: usize) -> Option<Vec3> {
        let slot = primitive_set.first as usize + element;
        let vertex_index = if primitive_set.indexed {
            let index = i64::from(*self.indices.get(slot)?) + i64::from(primitive_set.vertex_offset);
            usize::try_from(index).ok()?
        } else {
            slot
        };
        self.vertices.get(vertex_index).map(Vertex::position)
    }

    /// Create this drawable's buffers on `device` and upload the geometry.
    /// Does nothing when the device already has buffers for it.
    pub fn configure_device_buffers(
        &mut self,
        guard: &RenderThreadGuard,
        device: &mut dyn GraphicsDevice,
        factory: &mut dyn ResourceFactory,
    ) -> SceneResult<()> {
        guard.assert_rendering_thread()?;

        let device_id = device.device_id();
        if self.device_buffers.contains_key(&device_id) {
            return Ok(());
        }

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        let vertex_capacity = vertex_bytes.len() as u64;
        let vertex = factory.create_buffer(&BufferDescription {
            size_in_bytes: vertex_capacity,
            usage: BufferUsage::Vertex,
        })?;
        device.update_buffer(vertex, 0, vertex_bytes)?;

        let index_bytes: &[u8] = bytemuck::cast_slice(&self.indices);
        let index_capacity = index_bytes.len() as u64;
        let index = if self.indices.is_empty() {
            None
        } else {
            let index = factory.create_buffer(&BufferDescription {
                size_in_bytes: index_capacity,
                usage: BufferUsage::Index,
            })?;
            device.update_buffer(index, 0, index_bytes)?;
            Some(index)
        };

        log::debug!(
            "Configured buffers for drawable '{}' on {:?}: {} vertices, {} indices",
            self.name,
            device_id,
            self.vertices.len(),
            self.indices.len()
        );

        self.device_buffers.insert(
            device_id,
            DeviceBuffers {
                vertex,
                vertex_capacity,
                index,
                index_capacity,
                revision: self.revision,
            },
        );
        Ok(())
    }

    /// Re-upload geometry changed since the last upload to `device`.
    ///
    /// Data that outgrew the existing buffers drops them and fails with
    /// [`SceneError::Device`]; the next
    /// [`configure_device_buffers`](Self::configure_device_buffers) recreates them.
    pub fn update_device_buffers(
        &mut self,
        guard: &RenderThreadGuard,
        device: &mut dyn GraphicsDevice,
    ) -> SceneResult<()> {
        guard.assert_rendering_thread()?;

        let device_id = device.device_id();
        let Some(buffers) = self.device_buffers.get(&device_id).copied() else {
            return Ok(());
        };
        if buffers.revision == self.revision {
            return Ok(());
        }

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&self.indices);
        let index_fits = match buffers.index {
            Some(_) => index_bytes.len() as u64 <= buffers.index_capacity,
            None => index_bytes.is_empty(),
        };
        if vertex_bytes.len() as u64 > buffers.vertex_capacity || !index_fits {
            self.device_buffers.remove(&device_id);
            return Err(SceneError::Device(format!(
                "geometry of drawable '{}' outgrew its buffers on {:?}",
                self.name, device_id
            )));
        }

        device.update_buffer(buffers.vertex, 0, vertex_bytes)?;
        if let Some(index) = buffers.index {
            device.update_buffer(index, 0, index_bytes)?;
        }
        if let Some(entry) = self.device_buffers.get_mut(&device_id) {
            entry.revision = self.revision;
        }
        log::trace!("Updated buffers for drawable '{}' on {:?}", self.name, device_id);
        Ok(())
    }

    /// Whether buffers exist for `device_id`
    pub fn has_device_buffers(&self, device_id: DeviceId) -> bool {
        self.device_buffers.contains_key(&device_id)
    }

    /// Whether the geometry changed since the last upload to `device_id`
    pub fn needs_device_update(&self, device_id: DeviceId) -> bool {
        self.device_buffers
            .get(&device_id)
            .is_some_and(|buffers| buffers.revision != self.revision)
    }

    /// Record this drawable's draw calls
    pub fn draw(
        &self,
        guard: &RenderThreadGuard,
        device: &dyn GraphicsDevice,
        resource_sets: &[(u32, ResourceSetHandle)],
        commands: &mut dyn CommandList,
    ) -> SceneResult<()> {
        guard.assert_rendering_thread()?;

        if let Some(callback) = &self.draw_callback {
            callback(self, commands);
            return Ok(());
        }

        let device_id = device.device_id();
        let buffers = self.device_buffers.get(&device_id).ok_or_else(|| {
            SceneError::Device(format!(
                "drawable '{}' has no buffers on {:?}; configure them before drawing",
                self.name, device_id
            ))
        })?;

        commands.set_vertex_buffer(0, buffers.vertex);
        if let Some(index) = buffers.index {
            commands.set_index_buffer(index);
        }
        for (slot, set) in resource_sets {
            commands.set_resource_set(*slot, *set);
        }

        for primitive_set in &self.primitive_sets {
            if primitive_set.indexed {
                commands.draw_indexed(
                    primitive_set.count,
                    primitive_set.instance_count,
                    primitive_set.first,
                    primitive_set.vertex_offset,
                    primitive_set.instance_start,
                );
            } else {
                commands.draw(
                    primitive_set.count,
                    primitive_set.instance_count,
                    primitive_set.first,
                    primitive_set.instance_start,
                );
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Drawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drawable")
            .field("name", &self.name)
            .field("vertices", &self.vertices.len())
            .field("indices", &self.indices.len())
            .field("primitive_sets", &self.primitive_sets)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
