//! Projectors map a pointer segment onto a constrained sub-space
//!
//! A projector works in the local frame of its dragger. The pointer's near
//! and far points are moved from world space into that frame before the
//! projection, and the result stays in local space.

use crate::bounds::Plane;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::input::PointerInfo;

/// Local-to-world matrix of a projector together with its inverse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectorFrame {
    local_to_world: Mat4,
    world_to_local: Mat4,
}

impl Default for ProjectorFrame {
    fn default() -> Self {
        Self {
            local_to_world: Mat4::identity(),
            world_to_local: Mat4::identity(),
        }
    }
}

impl ProjectorFrame {
    /// Set the local-to-world matrix and recompute its inverse.
    ///
    /// A singular matrix is rejected and the frame keeps its previous value.
    pub fn set_local_to_world(&mut self, local_to_world: Mat4) -> bool {
        match local_to_world.inverse_or_none() {
            Some(world_to_local) => {
                self.local_to_world = local_to_world;
                self.world_to_local = world_to_local;
                true
            }
            None => {
                log::warn!("Ignoring singular local-to-world matrix for projector");
                false
            }
        }
    }

    /// Local-to-world matrix
    pub fn local_to_world(&self) -> &Mat4 {
        &self.local_to_world
    }

    /// World-to-local matrix
    pub fn world_to_local(&self) -> &Mat4 {
        &self.world_to_local
    }

    /// Pointer segment in the local frame
    pub fn local_segment(&self, pointer: &PointerInfo) -> (Vec3, Vec3) {
        (
            self.world_to_local.pre_multiply(&pointer.near_point),
            self.world_to_local.pre_multiply(&pointer.far_point),
        )
    }
}

/// Maps a pointer segment to a point in a projector's local frame
pub trait Projector {
    /// Frame the projection happens in
    fn frame(&self) -> &ProjectorFrame;

    /// Frame the projection happens in, mutably
    fn frame_mut(&mut self) -> &mut ProjectorFrame;

    /// Projected point in local coordinates; `None` when the pointer does
    /// not determine a point (e.g. it runs parallel to the sub-space)
    fn project(&self, pointer: &PointerInfo) -> Option<Vec3>;

    /// Shorthand for [`ProjectorFrame::set_local_to_world`]
    fn set_local_to_world(&mut self, local_to_world: Mat4) -> bool {
        self.frame_mut().set_local_to_world(local_to_world)
    }
}

/// Projects onto a plane given in local coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneProjector {
    plane: Plane,
    frame: ProjectorFrame,
}

impl PlaneProjector {
    /// Projector onto `plane`
    pub fn new(plane: Plane) -> Self {
        Self {
            plane,
            frame: ProjectorFrame::default(),
        }
    }

    /// Target plane
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Change the target plane
    pub fn set_plane(&mut self, plane: Plane) {
        self.plane = plane;
    }
}

impl Projector for PlaneProjector {
    fn frame(&self) -> &ProjectorFrame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut ProjectorFrame {
        &mut self.frame
    }

    fn project(&self, pointer: &PointerInfo) -> Option<Vec3> {
        let (near, far) = self.frame.local_segment(pointer);
        self.plane.intersect_line(near, far)
    }
}

/// Projects onto the infinite line through two local points
#[derive(Debug, Clone, PartialEq)]
pub struct LineProjector {
    line_start: Vec3,
    line_end: Vec3,
    frame: ProjectorFrame,
}

impl LineProjector {
    /// Projector onto the line through `line_start` and `line_end`
    pub fn new(line_start: Vec3, line_end: Vec3) -> Self {
        Self {
            line_start,
            line_end,
            frame: ProjectorFrame::default(),
        }
    }

    /// First point defining the line
    pub fn line_start(&self) -> Vec3 {
        self.line_start
    }

    /// Second point defining the line
    pub fn line_end(&self) -> Vec3 {
        self.line_end
    }
}

impl Projector for LineProjector {
    fn frame(&self) -> &ProjectorFrame {
        &self.frame
    }

    fn frame_mut(&mut self) -> &mut ProjectorFrame {
        &mut self.frame
    }

    /// Point on the line closest to the pointer line
    fn project(&self, pointer: &PointerInfo) -> Option<Vec3> {
        let (near, far) = self.frame.local_segment(pointer);

        let u = self.line_end - self.line_start;
        let v = far - near;
        let w0 = self.line_start - near;

        let a = u.dot(&u);
        let b = u.dot(&v);
        let c = v.dot(&v);
        let d = u.dot(&w0);
        let e = v.dot(&w0);

        let denominator = a * c - b * b;
        if denominator.abs() <= f32::EPSILON * a * c || a <= f32::EPSILON {
            return None;
        }
        let s = (b * e - c * d) / denominator;
        Some(self.line_start + u * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn xz_plane_projector() -> PlaneProjector {
        PlaneProjector::new(Plane::new(0.0, 1.0, 0.0, 0.0))
    }

    #[test]
    fn test_plane_projection_through_origin() {
        let projector = xz_plane_projector();
        let pointer = PointerInfo::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0));
        assert_relative_eq!(projector.project(&pointer).unwrap(), Vec3::zeros());
    }

    #[test]
    fn test_plane_projection_off_axis() {
        let projector = xz_plane_projector();
        let pointer = PointerInfo::new(Vec3::new(1.0, 5.0, 2.0), Vec3::new(1.0, -5.0, 2.0));
        assert_relative_eq!(projector.project(&pointer).unwrap(), Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_plane_projection_parallel_ray_has_no_result() {
        let projector = xz_plane_projector();
        let pointer = PointerInfo::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(5.0, 1.0, 0.0));
        assert!(projector.project(&pointer).is_none());
    }

    #[test]
    fn test_plane_projection_uses_local_frame() {
        let mut projector = xz_plane_projector();
        assert!(projector.set_local_to_world(Mat4::new_translation(&Vec3::new(0.0, 2.0, 0.0))));

        let pointer = PointerInfo::new(Vec3::new(1.0, 5.0, 1.0), Vec3::new(1.0, -5.0, 1.0));
        // World y = 2 is local y = 0
        assert_relative_eq!(projector.project(&pointer).unwrap(), Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_singular_frame_is_rejected() {
        let mut projector = xz_plane_projector();
        assert!(!projector.set_local_to_world(Mat4::zeros()));
        assert_eq!(projector.frame().local_to_world(), &Mat4::identity());
    }

    #[test]
    fn test_line_projection_closest_point() {
        let projector = LineProjector::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let pointer = PointerInfo::new(Vec3::new(0.3, 4.0, 2.0), Vec3::new(0.3, -4.0, 2.0));
        assert_relative_eq!(projector.project(&pointer).unwrap(), Vec3::new(0.3, 0.0, 0.0), epsilon = 1.0e-5);

        let parallel = PointerInfo::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 1.0, 0.0));
        assert!(projector.project(&parallel).is_none());
    }
}
