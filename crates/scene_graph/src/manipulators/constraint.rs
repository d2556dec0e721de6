//! Constraints filter motion commands before a dragger dispatches them
//!
//! Constraints work in the dragger's local frame, the frame commands are
//! expressed in. Returning `false` vetoes the command.

use crate::bounds::BoundingBox;
use crate::foundation::math::{constants::EPSILON, Vec2, Vec3};
use crate::manipulators::command::{Motion, MotionCommand};

/// Pre-dispatch filter for motion commands
pub trait Constraint {
    /// Adjust `command` in place; `false` drops it
    fn constrain(&self, _command: &mut MotionCommand) -> bool {
        true
    }
}

/// Snaps translated and scaled positions onto a regular grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConstraint {
    origin: Vec3,
    spacing: Vec3,
}

impl GridConstraint {
    /// Grid through `origin` with cell size `spacing`; a zero component
    /// leaves that axis free
    pub fn new(origin: Vec3, spacing: Vec3) -> Self {
        Self {
            origin,
            spacing: spacing.abs(),
        }
    }

    /// Nearest grid point to `point`
    pub fn snap(&self, point: Vec3) -> Vec3 {
        let mut snapped = point;
        for axis in 0..3 {
            let cell = self.spacing[axis];
            if cell > EPSILON {
                let offset = point[axis] - self.origin[axis];
                snapped[axis] = self.origin[axis] + (offset / cell).round() * cell;
            }
        }
        snapped
    }
}

impl Constraint for GridConstraint {
    fn constrain(&self, command: &mut MotionCommand) -> bool {
        match command.motion {
            Motion::TranslateInLine { translation, .. } | Motion::TranslateInPlane { translation, .. } => {
                let target = self.snap(command.reference_point + translation);
                command.set_translation(target - command.reference_point);
                true
            }
            Motion::Scale2D { .. } => {
                rescale_reference(command, |point| self.snap(point));
                true
            }
            Motion::Rotate3D { .. } => false,
        }
    }
}

/// Keeps the moved reference point inside a local-space box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBoxConstraint {
    bounds: BoundingBox,
}

impl BoundingBoxConstraint {
    /// Constraint to `bounds`; an invalid box admits no motion at all
    pub fn new(bounds: BoundingBox) -> Self {
        Self { bounds }
    }

    /// Allowed region
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }
}

impl Constraint for BoundingBoxConstraint {
    fn constrain(&self, command: &mut MotionCommand) -> bool {
        if !self.bounds.valid() {
            return false;
        }
        match command.motion {
            Motion::TranslateInLine { translation, .. } | Motion::TranslateInPlane { translation, .. } => {
                let target = self.bounds.clamp_point(command.reference_point + translation);
                command.set_translation(target - command.reference_point);
                true
            }
            Motion::Scale2D { .. } => {
                rescale_reference(command, |point| self.bounds.clamp_point(point));
                true
            }
            Motion::Rotate3D { .. } => false,
        }
    }
}

/// Move the scaled reference point of a scale command through `adjust` and
/// recompute the scale that lands it there.
///
/// The result may reach zero or flip sign when the adjusted point crosses the
/// scale center; the dragger clamps it to its minimum scale before dispatch.
fn rescale_reference(command: &mut MotionCommand, adjust: impl Fn(Vec3) -> Vec3) {
    let Motion::Scale2D { scale, scale_center, reference_point } = &mut command.motion else {
        return;
    };
    let from_center = *reference_point - *scale_center;
    let scaled = *scale_center + from_center.component_mul(&*scale);
    let adjusted = adjust(Vec3::new(scaled.x, 0.0, scaled.y));
    let adjusted = Vec2::new(adjusted.x, adjusted.z);

    for axis in 0..2 {
        if from_center[axis].abs() > EPSILON {
            scale[axis] = (adjusted[axis] - scale_center[axis]) / from_center[axis];
        }
    }
}
