//! # Scene Graph
//!
//! A retained-mode 3D scene graph: a hierarchy of nodes describing geometry,
//! transforms and render state, walked by visitors to compute bounds, cull,
//! pick and draw.
//!
//! ## Features
//!
//! - **Arena graph**: groups, transforms and geodes addressed by stable handles,
//!   with multiple parents per node
//! - **Visitor protocol**: one accept/traverse/ascend dispatch shared by every
//!   traversal, with node-mask filtering
//! - **Lazy bounds**: cached bounding spheres invalidated upward on mutation
//! - **Picking**: line-segment intersection with hit limits
//! - **Manipulators**: translate and scale draggers driven by pointer events
//! - **Render boundary**: cull visitor, render queue and device traits for a
//!   backend to implement
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_graph::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     scene_graph::foundation::logging::init();
//!
//!     let mut graph = SceneGraph::new();
//!     let root = graph.create_group("root");
//!     let placement = graph.create_transform("placement", Mat4::new_translation(&Vec3::new(0.0, 0.0, -5.0)));
//!     let geode = graph.create_geode("sphere");
//!
//!     let sphere = Shape::sphere(Vec3::zeros(), 1.0)
//!         .build_drawable("sphere", &TessellationHints::default(), &[[1.0, 0.0, 0.0]])?;
//!     graph.add_drawable(geode, sphere)?;
//!     graph.add_child(placement, geode)?;
//!     graph.add_child(root, placement)?;
//!
//!     let bound = graph.get_bound(root);
//!     log::info!("Scene radius {}", bound.radius);
//!
//!     let intersector = LineSegmentIntersector::new(
//!         Vec3::new(0.0, 0.0, 10.0),
//!         Vec3::new(0.0, 0.0, -10.0),
//!         IntersectionLimit::LimitNearest,
//!     );
//!     let mut picker = IntersectionVisitor::new(intersector);
//!     graph.accept(root, &mut picker);
//!     if let Some(hit) = picker.intersector().first() {
//!         log::info!("Picked at {:?}", hit.world_point);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod foundation;
pub mod core;
pub mod bounds;
pub mod scene;
pub mod visitor;
pub mod intersect;
pub mod render;
pub mod input;
pub mod manipulators;

#[cfg(test)]
mod tests;

/// Common imports for scene graph users
pub mod prelude {
    pub use crate::{
        bounds::{BoundingBox, BoundingSphere, Frustum, Plane},
        core::{
            config::{Config, GraphConfig, IntersectionConfig, ManipulatorConfig, SceneConfig},
            error::{SceneError, SceneResult},
            thread_guard::{RenderThreadGuard, RENDER_THREAD},
        },
        foundation::{
            collections::{DrawableId, NodeId},
            math::{Mat4, Mat4Ext, Quat, Vec2, Vec3},
        },
        input::{
            ActionAdapter, CameraManipulator, EventDispatcher, InputEventHandler, PointerInfo, RedrawFlag,
            UiEvent, UiEventType,
        },
        intersect::{Intersection, IntersectionLimit, IntersectionVisitor, Intersector, LineSegmentIntersector},
        manipulators::{
            BoundingBoxConstraint, Constraint, Dragger, DraggerCallback, DraggerTransformCallback,
            GridConstraint, MotionCommand, MotionStage, ScaleMode,
        },
        render::{CommandList, GraphicsDevice, RenderQueue, ResourceFactory},
        scene::{Drawable, NodeKind, RenderState, SceneGraph, Shape, TessellationHints},
        visitor::{ComputeBoundsVisitor, CullVisitor, NodeVisitor, TraversalMode},
    };
}
