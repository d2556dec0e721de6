//! Bounding sphere
//!
//! A sphere with a negative radius is *invalid*: it encloses nothing and is
//! the identity element of every `expand_by` operation.

use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Bounding sphere used for node bounds, culling and intersection pruning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// Center of the sphere
    pub center: Vec3,
    /// Radius of the sphere; negative when invalid
    pub radius: f32,
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::invalid()
    }
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// The empty sphere
    pub fn invalid() -> Self {
        Self {
            center: Vec3::zeros(),
            radius: -1.0,
        }
    }

    /// Whether the sphere encloses anything
    pub fn valid(&self) -> bool {
        self.radius >= 0.0
    }

    /// Reset to the empty sphere
    pub fn init(&mut self) {
        *self = Self::invalid();
    }

    /// Grow the sphere to contain `point`, moving the center toward it
    pub fn expand_by_point(&mut self, point: Vec3) {
        if !self.valid() {
            self.center = point;
            self.radius = 0.0;
            return;
        }

        let delta = point - self.center;
        let distance = delta.norm();
        if distance > self.radius {
            let grow = (distance - self.radius) * 0.5;
            self.center += delta * (grow / distance);
            self.radius += grow;
        }
    }

    /// Grow the sphere to the smallest sphere containing both itself and `other`
    pub fn expand_by(&mut self, other: &BoundingSphere) {
        if !other.valid() {
            return;
        }
        if !self.valid() {
            *self = *other;
            return;
        }

        let distance = (other.center - self.center).norm();

        // other is already inside self
        if distance + other.radius <= self.radius {
            return;
        }

        // self is inside other
        if distance + self.radius <= other.radius {
            *self = *other;
            return;
        }

        let new_radius = (self.radius + distance + other.radius) * 0.5;
        let ratio = (new_radius - self.radius) / distance;
        self.center += (other.center - self.center) * ratio;
        self.radius = new_radius;
    }

    /// Grow the sphere to contain every corner of `bounding_box`
    pub fn expand_by_box(&mut self, bounding_box: &BoundingBox) {
        if !bounding_box.valid() {
            return;
        }
        if !self.valid() {
            *self = BoundingSphere::from(*bounding_box);
            return;
        }
        for i in 0..8 {
            self.expand_by_point(bounding_box.corner(i));
        }
    }

    /// Check if `point` lies inside the sphere
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.valid() && (point - self.center).norm_squared() <= self.radius * self.radius
    }

    /// Check if `other` lies entirely inside the sphere, with a small tolerance
    pub fn contains(&self, other: &BoundingSphere) -> bool {
        if !other.valid() {
            return true;
        }
        self.valid()
            && (other.center - self.center).norm() + other.radius <= self.radius * (1.0 + 1.0e-5) + 1.0e-5
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        if !self.valid() || !other.valid() {
            return false;
        }
        let distance_squared = (self.center - other.center).norm_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Sphere enclosing this sphere after `matrix` is applied
    pub fn transformed(&self, matrix: &Mat4) -> BoundingSphere {
        if !self.valid() {
            return *self;
        }
        BoundingSphere {
            center: matrix.pre_multiply(&self.center),
            radius: self.radius * matrix.max_axis_scale(),
        }
    }

    /// Segment parameters `(t_enter, t_exit)` where the line `start + t (end - start)`
    /// crosses the sphere surface, or `None` when the line misses it
    pub fn intersect_line(&self, start: Vec3, end: Vec3) -> Option<(f32, f32)> {
        if !self.valid() {
            return None;
        }
        let direction = end - start;
        let a = direction.norm_squared();
        if a <= f32::EPSILON {
            return None;
        }

        let oc = start - self.center;
        let b = 2.0 * oc.dot(&direction);
        let c = oc.norm_squared() - self.radius * self.radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = (-b - sqrt_discriminant) / (2.0 * a);
        let t2 = (-b + sqrt_discriminant) / (2.0 * a);
        Some((t1, t2))
    }

    /// Whether the segment from `start` to `end` touches the sphere
    pub fn intersects_segment(&self, start: Vec3, end: Vec3) -> bool {
        if self.contains_point(start) || self.contains_point(end) {
            return true;
        }
        matches!(self.intersect_line(start, end), Some((t1, t2)) if t2 >= 0.0 && t1 <= 1.0)
    }
}

impl From<BoundingBox> for BoundingSphere {
    fn from(bounding_box: BoundingBox) -> Self {
        if bounding_box.valid() {
            Self::new(bounding_box.center(), bounding_box.radius())
        } else {
            Self::invalid()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_is_identity() {
        let mut sphere = BoundingSphere::invalid();
        let unit = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 1.0);
        sphere.expand_by(&unit);
        assert_eq!(sphere, unit);

        let mut copy = unit;
        copy.expand_by(&BoundingSphere::invalid());
        assert_eq!(copy, unit);
    }

    #[test]
    fn test_expand_by_disjoint_spheres_is_minimal() {
        let mut sphere = BoundingSphere::new(Vec3::new(-2.0, 0.0, 0.0), 1.0);
        sphere.expand_by(&BoundingSphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0));
        assert_relative_eq!(sphere.center, Vec3::zeros(), epsilon = 1.0e-6);
        assert_relative_eq!(sphere.radius, 3.0, epsilon = 1.0e-6);
    }

    #[test]
    fn test_expand_by_contained_sphere_is_noop() {
        let mut sphere = BoundingSphere::new(Vec3::zeros(), 5.0);
        sphere.expand_by(&BoundingSphere::new(Vec3::new(1.0, 1.0, 1.0), 1.0));
        assert_eq!(sphere, BoundingSphere::new(Vec3::zeros(), 5.0));
    }

    #[test]
    fn test_expand_by_point() {
        let mut sphere = BoundingSphere::invalid();
        sphere.expand_by_point(Vec3::new(0.0, 0.0, 0.0));
        sphere.expand_by_point(Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(sphere.center, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(sphere.radius, 1.0);
    }

    #[test]
    fn test_transformed_scales_radius() {
        let sphere = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 1.0);
        let matrix = Mat4::new_translation(&Vec3::new(0.0, 3.0, 0.0)) * Mat4::new_scaling(2.0);
        let moved = sphere.transformed(&matrix);
        assert_relative_eq!(moved.center, Vec3::new(2.0, 3.0, 0.0));
        assert_relative_eq!(moved.radius, 2.0);
    }

    #[test]
    fn test_segment_intersection() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        assert!(sphere.intersects_segment(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0)));
        assert!(!sphere.intersects_segment(Vec3::new(-5.0, 2.0, 0.0), Vec3::new(5.0, 2.0, 0.0)));
        // Segment ends before reaching the sphere
        assert!(!sphere.intersects_segment(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(-3.0, 0.0, 0.0)));
    }
}
