//! Scene graph data model
//!
//! ## Architecture
//!
//! ```text
//! SceneGraph (arena)
//!   ├── Node: Group | Transform(Mat4) | Geode(drawables)
//!   └── Drawable: vertices, indices, primitive sets
//! ```
//!
//! Nodes reference each other by [`NodeId`](crate::foundation::collections::NodeId);
//! geodes reference their drawables by
//! [`DrawableId`](crate::foundation::collections::DrawableId). All mutation goes
//! through [`SceneGraph`] so bounds stay consistent.

pub mod drawable;
pub mod geometry;
pub mod graph;
pub mod node;
pub mod render_state;
pub mod shapes;

pub use drawable::{ComputeBoundingBoxCallback, DrawCallback, Drawable};
pub use geometry::{PrimitiveSet, PrimitiveTopology, Vertex};
pub use graph::SceneGraph;
pub use node::{
    BoundCache, CacheState, ComputeBoundCallback, Node, NodeKind, NodeMask, NODE_MASK_ALL,
    NODE_MASK_NONE,
};
pub use render_state::{FaceCullMode, PolygonFillMode, RenderState};
pub use shapes::{ColorsType, NormalsType, Shape, TessellationHints};
