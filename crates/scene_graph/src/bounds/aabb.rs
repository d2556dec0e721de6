//! Axis-aligned bounding box
//!
//! An inverted box (`min > max` on any axis) is *invalid* and acts as the
//! identity for `expand_by`.

use serde::{Deserialize, Serialize};

use crate::bounds::BoundingSphere;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Axis-Aligned Bounding Box for drawables and spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::invalid()
    }
}

impl BoundingBox {
    /// Create a new box from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The empty box
    pub fn invalid() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Create a box centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point in `points`
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bounding_box = Self::invalid();
        for point in points {
            bounding_box.expand_by_point(*point);
        }
        bounding_box
    }

    /// Whether the box encloses anything
    pub fn valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Half of the diagonal length
    pub fn radius(&self) -> f32 {
        self.extents().norm()
    }

    /// Corner `index` (0..8); bit 0 selects x, bit 1 y, bit 2 z
    pub fn corner(&self, index: usize) -> Vec3 {
        Vec3::new(
            if index & 1 == 0 { self.min.x } else { self.max.x },
            if index & 2 == 0 { self.min.y } else { self.max.y },
            if index & 4 == 0 { self.min.z } else { self.max.z },
        )
    }

    /// Grow the box to contain `point`
    pub fn expand_by_point(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Grow the box to contain `other`
    pub fn expand_by(&mut self, other: &BoundingBox) {
        if !other.valid() {
            return;
        }
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// Grow the box to contain `sphere`
    pub fn expand_by_sphere(&mut self, sphere: &BoundingSphere) {
        if !sphere.valid() {
            return;
        }
        let extents = Vec3::repeat(sphere.radius);
        self.expand_by(&Self::from_center_extents(sphere.center, extents));
    }

    /// Box enclosing all eight corners after `matrix` is applied
    pub fn transformed(&self, matrix: &Mat4) -> BoundingBox {
        if !self.valid() {
            return *self;
        }
        let mut result = Self::invalid();
        for i in 0..8 {
            result.expand_by_point(matrix.pre_multiply(&self.corner(i)));
        }
        result
    }

    /// Check if this box contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Nearest point inside the box
    pub fn clamp_point(&self, point: Vec3) -> Vec3 {
        point.sup(&self.min).inf(&self.max)
    }

    /// Check if this box intersects another box
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Test ray intersection with this box using the slab method.
    /// Returns the ray parameter of the entry point if the ray intersects, None otherwise.
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let inv_dir = Vec3::new(
            if ray_dir.x != 0.0 { 1.0 / ray_dir.x } else { f32::INFINITY },
            if ray_dir.y != 0.0 { 1.0 / ray_dir.y } else { f32::INFINITY },
            if ray_dir.z != 0.0 { 1.0 / ray_dir.z } else { f32::INFINITY },
        );

        let t1 = (self.min.x - ray_origin.x) * inv_dir.x;
        let t2 = (self.max.x - ray_origin.x) * inv_dir.x;
        let t3 = (self.min.y - ray_origin.y) * inv_dir.y;
        let t4 = (self.max.y - ray_origin.y) * inv_dir.y;
        let t5 = (self.min.z - ray_origin.z) * inv_dir.z;
        let t6 = (self.max.z - ray_origin.z) * inv_dir.z;

        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        // Ray intersects if tmax >= tmin and tmax >= 0
        if tmax >= tmin && tmax >= 0.0 {
            // Entry point (or 0 if we're inside the box)
            Some(tmin.max(0.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_contains_point() {
        let bounding_box = BoundingBox::new(
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
        );

        assert!(bounding_box.contains_point(Vec3::zeros()));
        assert!(bounding_box.contains_point(Vec3::new(0.5, 0.5, 0.5)));
        assert!(!bounding_box.contains_point(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_box_intersects() {
        let box1 = BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let box2 = BoundingBox::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let box3 = BoundingBox::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));

        assert!(box1.intersects(&box2));
        assert!(!box1.intersects(&box3));
    }

    #[test]
    fn test_invalid_box_is_identity() {
        let unit = BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let mut bounding_box = BoundingBox::invalid();
        assert!(!bounding_box.valid());
        bounding_box.expand_by(&unit);
        assert_eq!(bounding_box, unit);
        bounding_box.expand_by(&BoundingBox::invalid());
        assert_eq!(bounding_box, unit);
    }

    #[test]
    fn test_sphere_from_box() {
        let bounding_box = BoundingBox::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let sphere = BoundingSphere::from(bounding_box);
        assert_relative_eq!(sphere.center, Vec3::zeros());
        assert_relative_eq!(sphere.radius, 3.0_f32.sqrt());
    }

    #[test]
    fn test_transformed_box() {
        let bounding_box = BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let moved = bounding_box.transformed(&Mat4::new_translation(&Vec3::new(2.0, 0.0, 0.0)));
        assert_relative_eq!(moved.min, Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(moved.max, Vec3::new(3.0, 1.0, 1.0));
    }
}
