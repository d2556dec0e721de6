//! Spatial primitives
//!
//! Pure value types used for bounds maintenance, culling, projection and
//! intersection: bounding sphere, axis-aligned box, plane and frustum.

mod aabb;
mod frustum;
mod plane;
mod sphere;

pub use aabb::BoundingBox;
pub use frustum::Frustum;
pub use plane::Plane;
pub use sphere::BoundingSphere;
