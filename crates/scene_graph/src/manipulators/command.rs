//! Motion commands emitted by draggers

use crate::bounds::Plane;
use crate::foundation::math::{Mat4, Quat, Vec2, Vec3};

/// Phase of an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MotionStage {
    /// Not part of an interaction
    #[default]
    None,
    /// Pointer went down on a handle
    Start,
    /// Pointer moved while dragging
    Move,
    /// Pointer was released
    Finish,
}

/// Motion described in the dragger's local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Translation constrained to a line
    TranslateInLine {
        /// First point on the line
        line_start: Vec3,
        /// Second point on the line
        line_end: Vec3,
        /// Offset from the reference point
        translation: Vec3,
    },
    /// Translation constrained to a plane
    TranslateInPlane {
        /// Plane the motion lies in
        plane: Plane,
        /// Offset from the reference point
        translation: Vec3,
    },
    /// Non-uniform scale in the XZ plane about a pivot
    Scale2D {
        /// Scale along X and Z
        scale: Vec2,
        /// Pivot in XZ
        scale_center: Vec2,
        /// Handle position the scale was measured from, in XZ
        reference_point: Vec2,
    },
    /// Rotation about the local origin
    Rotate3D {
        /// Rotation
        rotation: Quat,
    },
}

/// One step of a drag, with the frame it was measured in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    /// Interaction phase
    pub stage: MotionStage,
    /// The motion itself
    pub motion: Motion,
    /// Local point the motion started from
    pub reference_point: Vec3,
    /// Dragger local-to-world captured when the drag started
    pub local_to_world: Mat4,
    /// Inverse of `local_to_world`
    pub world_to_local: Mat4,
}

impl MotionCommand {
    /// Command in an identity frame
    pub fn new(stage: MotionStage, motion: Motion) -> Self {
        Self {
            stage,
            motion,
            reference_point: Vec3::zeros(),
            local_to_world: Mat4::identity(),
            world_to_local: Mat4::identity(),
        }
    }

    /// Same command measured in another frame
    pub fn with_frame(mut self, local_to_world: Mat4, world_to_local: Mat4) -> Self {
        self.local_to_world = local_to_world;
        self.world_to_local = world_to_local;
        self
    }

    /// Same command with a reference point
    pub fn with_reference_point(mut self, reference_point: Vec3) -> Self {
        self.reference_point = reference_point;
        self
    }

    /// Translation carried by translate commands
    pub fn translation(&self) -> Option<Vec3> {
        match self.motion {
            Motion::TranslateInLine { translation, .. } | Motion::TranslateInPlane { translation, .. } => {
                Some(translation)
            }
            Motion::Scale2D { .. } | Motion::Rotate3D { .. } => None,
        }
    }

    /// Replace the translation of a translate command; other commands are
    /// left unchanged
    pub fn set_translation(&mut self, new_translation: Vec3) {
        match &mut self.motion {
            Motion::TranslateInLine { translation, .. } | Motion::TranslateInPlane { translation, .. } => {
                *translation = new_translation;
            }
            Motion::Scale2D { .. } | Motion::Rotate3D { .. } => {}
        }
    }

    /// Matrix applying the motion in the local frame
    pub fn motion_matrix(&self) -> Mat4 {
        match self.motion {
            Motion::TranslateInLine { translation, .. } | Motion::TranslateInPlane { translation, .. } => {
                Mat4::new_translation(&translation)
            }
            Motion::Scale2D { scale, scale_center, .. } => {
                let pivot = Vec3::new(scale_center.x, 0.0, scale_center.y);
                Mat4::new_translation(&pivot)
                    * Mat4::new_nonuniform_scaling(&Vec3::new(scale.x, 1.0, scale.y))
                    * Mat4::new_translation(&(-pivot))
            }
            Motion::Rotate3D { rotation } => rotation.to_homogeneous(),
        }
    }
}
