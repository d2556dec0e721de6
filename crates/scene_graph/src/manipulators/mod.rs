//! Interactive manipulators
//!
//! Draggers turn pointer events into [`MotionCommand`]s. A projector maps
//! the pointer ray into the dragger's local frame, constraints filter each
//! command, and callbacks apply it, typically to a transform node through
//! [`DraggerTransformCallback`].

pub mod callback;
pub mod command;
pub mod constraint;
pub mod dragger;
pub mod path;
pub mod projector;

pub use callback::{DraggerCallback, DraggerTransformCallback};
pub use command::{Motion, MotionCommand, MotionStage};
pub use constraint::{BoundingBoxConstraint, Constraint, GridConstraint};
pub use dragger::{Dragger, DraggerKind, ScaleMode};
pub use path::compute_node_path_to_root;
pub use projector::{LineProjector, PlaneProjector, Projector, ProjectorFrame};
