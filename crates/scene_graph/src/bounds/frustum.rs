//! View frustum for visibility culling

use crate::bounds::{BoundingSphere, Plane};
use crate::foundation::math::Mat4;

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far),
    /// normals pointing inward
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix using the
    /// Gribb-Hartmann method. Clip-space depth is expected in `[0, 1]`.
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |i: usize| vp_matrix.row(i).transpose();
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Check if a sphere is inside or intersects the frustum
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        if !sphere.valid() {
            return false;
        }
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(sphere.center) >= -sphere.radius)
    }
}
