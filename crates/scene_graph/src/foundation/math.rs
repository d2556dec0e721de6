//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene graph. All matrices
//! use the column-vector convention: a point `p` is transformed by `M * p`, and
//! a chain of transforms along a node path composes as `root * ... * leaf`.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Tolerance used by the geometric predicates
    pub const EPSILON: f32 = 1.0e-6;
}

/// Extension trait for Mat4 with scene-graph specific helpers
pub trait Mat4Ext {
    /// Transform a position (w = 1) by this matrix, dividing by w when the
    /// matrix is projective
    fn pre_multiply(&self, point: &Vec3) -> Vec3;

    /// Transform a direction (w = 0) by this matrix
    fn transform_direction(&self, direction: &Vec3) -> Vec3;

    /// Largest scale factor applied along any of the three axes
    fn max_axis_scale(&self) -> f32;

    /// Inverse of the matrix, or `None` if it is singular
    fn inverse_or_none(&self) -> Option<Mat4>;

    /// Rotation matrix that turns `from` onto `to`
    fn make_rotate(from: &Vec3, to: &Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn pre_multiply(&self, point: &Vec3) -> Vec3 {
        let p = self * Vec4::new(point.x, point.y, point.z, 1.0);
        if p.w.abs() > constants::EPSILON && (p.w - 1.0).abs() > constants::EPSILON {
            Vec3::new(p.x / p.w, p.y / p.w, p.z / p.w)
        } else {
            p.xyz()
        }
    }

    fn transform_direction(&self, direction: &Vec3) -> Vec3 {
        self.fixed_view::<3, 3>(0, 0) * direction
    }

    fn max_axis_scale(&self) -> f32 {
        let sx = self.fixed_view::<3, 1>(0, 0).norm();
        let sy = self.fixed_view::<3, 1>(0, 1).norm();
        let sz = self.fixed_view::<3, 1>(0, 2).norm();
        sx.max(sy).max(sz)
    }

    fn inverse_or_none(&self) -> Option<Mat4> {
        self.try_inverse()
    }

    fn make_rotate(from: &Vec3, to: &Vec3) -> Mat4 {
        match Quat::rotation_between(from, to) {
            Some(rotation) => rotation.to_homogeneous(),
            // Opposite vectors: any axis perpendicular to `from` works
            None => {
                let axis = if from.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
                let perpendicular = from.cross(&axis).normalize();
                Mat4::from_axis_angle(&Unit::new_normalize(perpendicular), constants::PI)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pre_multiply_translation() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(m.pre_multiply(&Vec3::zeros()), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(m.transform_direction(&Vec3::x()), Vec3::x());
    }

    #[test]
    fn test_max_axis_scale() {
        let m = Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 4.0, 2.0));
        assert_relative_eq!(m.max_axis_scale(), 4.0);
    }

    #[test]
    fn test_make_rotate_opposite_vectors() {
        let m = Mat4::make_rotate(&Vec3::z(), &(-Vec3::z()));
        assert_relative_eq!(m.transform_direction(&Vec3::z()), -Vec3::z(), epsilon = 1.0e-5);
    }
}
