//! Vertex layout and primitive-set descriptors

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec3;

/// Interleaved vertex uploaded to device buffers
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Texture coordinate
    pub tex_coord: [f32; 2],
    /// Vertex color (RGB)
    pub color: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
}

impl Vertex {
    /// Create a vertex from its components
    pub fn new(position: Vec3, tex_coord: [f32; 2], color: [f32; 3], normal: Vec3) -> Self {
        Self {
            position: position.into(),
            tex_coord,
            color,
            normal: normal.into(),
        }
    }

    /// Vertex with only a position and color
    pub fn colored(position: Vec3, color: [f32; 3]) -> Self {
        Self::new(position, [0.0, 0.0], color, Vec3::zeros())
    }

    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }
}

/// Primitive topology of a draw range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Independent triangles
    TriangleList,
    /// Triangle strip
    TriangleStrip,
    /// Independent line segments
    LineList,
    /// Connected line segments
    LineStrip,
    /// Points
    PointList,
}

/// One draw range of a drawable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveSet {
    /// Topology of the range
    pub topology: PrimitiveTopology,
    /// Whether the range reads the index buffer
    pub indexed: bool,
    /// First index (indexed) or first vertex (non-indexed)
    pub first: u32,
    /// Number of indices or vertices
    pub count: u32,
    /// Value added to each index before fetching a vertex
    pub vertex_offset: i32,
    /// Number of instances
    pub instance_count: u32,
    /// First instance
    pub instance_start: u32,
}

impl PrimitiveSet {
    /// Indexed range
    pub fn draw_elements(
        topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
        index_start: u32,
        vertex_offset: i32,
        instance_start: u32,
    ) -> Self {
        Self {
            topology,
            indexed: true,
            first: index_start,
            count: index_count,
            vertex_offset,
            instance_count,
            instance_start,
        }
    }

    /// Non-indexed range
    pub fn draw_arrays(topology: PrimitiveTopology, first: u32, count: u32) -> Self {
        Self {
            topology,
            indexed: false,
            first,
            count,
            vertex_offset: 0,
            instance_count: 1,
            instance_start: 0,
        }
    }

    /// Vertex-index triples of the triangles in this range; empty for lines
    /// and points. Strips alternate winding so every triangle keeps the
    /// orientation of the first.
    pub fn triangle_indices(&self) -> Vec<[usize; 3]> {
        let count = self.count as usize;
        match self.topology {
            PrimitiveTopology::TriangleList => (0..count / 3)
                .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
                .collect(),
            PrimitiveTopology::TriangleStrip => (0..count.saturating_sub(2))
                .map(|i| if i % 2 == 0 { [i, i + 1, i + 2] } else { [i + 1, i, i + 2] })
                .collect(),
            _ => Vec::new(),
        }
    }
}
