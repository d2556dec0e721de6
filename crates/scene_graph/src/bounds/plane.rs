//! Plane in Hessian normal form

use serde::{Deserialize, Serialize};

use crate::foundation::math::{constants::EPSILON, Vec3, Vec4};

/// Plane `{normal, d}` containing every point `p` with `normal · p + d = 0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Normal vector (normalized by the constructors)
    pub normal: Vec3,
    /// Signed offset along the normal
    pub d: f32,
}

impl Plane {
    /// Create a plane from its four coefficients `{Nx, Ny, Nz, D}`
    pub fn new(nx: f32, ny: f32, nz: f32, d: f32) -> Self {
        Self::from_coefficients(Vec4::new(nx, ny, nz, d))
    }

    /// Create a plane from a coefficient vector, normalizing it when possible
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.norm();
        if length > EPSILON {
            Self { normal: normal / length, d: coefficients.w / length }
        } else {
            Self { normal, d: coefficients.w }
        }
    }

    /// Plane through `point` with the given normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self { normal, d: -normal.dot(&point) }
    }

    /// The four coefficients as a vector
    pub fn as_vec4(&self) -> Vec4 {
        Vec4::new(self.normal.x, self.normal.y, self.normal.z, self.d)
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.d
    }

    /// Intersection of the infinite line through `start` and `end` with the
    /// plane; `None` when the line is parallel to it
    pub fn intersect_line(&self, start: Vec3, end: Vec3) -> Option<Vec3> {
        let delta = end - start;
        let denominator = self.normal.dot(&delta);
        if denominator.abs() < EPSILON {
            return None;
        }
        let c = self.distance_to_point(start) / denominator;
        Some(start - delta * c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plane_line_intersection() {
        let plane = Plane::new(0.0, 1.0, 0.0, 0.0);
        let hit = plane.intersect_line(Vec3::new(1.0, 5.0, 2.0), Vec3::new(1.0, -5.0, 2.0));
        assert_relative_eq!(hit.unwrap(), Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_parallel_line_misses() {
        let plane = Plane::new(0.0, 1.0, 0.0, 0.0);
        assert!(plane.intersect_line(Vec3::new(0.0, 1.0, 0.0), Vec3::new(5.0, 1.0, 0.0)).is_none());
    }

    #[test]
    fn test_coefficients_are_normalized() {
        let plane = Plane::new(0.0, 2.0, 0.0, -4.0);
        assert_relative_eq!(plane.normal, Vec3::y());
        assert_relative_eq!(plane.d, -2.0);
        assert_relative_eq!(plane.distance_to_point(Vec3::new(0.0, 2.0, 0.0)), 0.0);
    }
}
