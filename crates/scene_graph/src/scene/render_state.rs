//! Per-node render state overrides
//!
//! A node or drawable either carries a [`RenderState`] or inherits the one of
//! its nearest ancestor. Inheritance is resolved during a render traversal;
//! the graph never stores inherited copies.

use serde::{Deserialize, Serialize};

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FaceCullMode {
    /// Cull back faces
    #[default]
    Back,
    /// Cull front faces
    Front,
    /// Draw both sides
    None,
}

/// Polygon fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PolygonFillMode {
    /// Filled polygons
    #[default]
    Solid,
    /// Wireframe
    Wireframe,
}

/// Pipeline and material override attached to a node or drawable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    /// Name of the shader set the backend should bind
    pub shader_set: Option<String>,
    /// Base material color (RGBA)
    pub color: [f32; 4],
    /// Face culling
    pub cull_mode: FaceCullMode,
    /// Fill mode
    pub fill_mode: PolygonFillMode,
    /// Depth testing enabled
    pub depth_test: bool,
    /// Alpha blended; drawn after opaque geometry, back to front
    pub transparent: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            shader_set: None,
            color: [1.0, 1.0, 1.0, 1.0],
            cull_mode: FaceCullMode::Back,
            fill_mode: PolygonFillMode::Solid,
            depth_test: true,
            transparent: false,
        }
    }
}

impl RenderState {
    /// Render state with the given base color
    pub fn with_color(color: [f32; 4]) -> Self {
        Self {
            color,
            transparent: color[3] < 1.0,
            ..Self::default()
        }
    }

    /// Set the shader set name
    pub fn shader_set(mut self, name: impl Into<String>) -> Self {
        self.shader_set = Some(name.into());
        self
    }

    /// Set the face culling mode
    pub fn cull_mode(mut self, cull_mode: FaceCullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }
}
