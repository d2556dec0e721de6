//! Input boundary
//!
//! The windowing layer produces [`UiEvent`]s; manipulators turn pointer
//! positions into [`PointerInfo`] segments and pick results, and the
//! [`CameraManipulator`] returns the view to a framing home position.

pub mod camera;
pub mod events;
pub mod pointer;

pub use camera::{CameraManipulator, DEFAULT_HOME_KEY};
pub use events::{
    ActionAdapter, EventDispatcher, InputEventHandler, KeyCode, ModKeyMask, MouseButton,
    RedrawFlag, UiEvent, UiEventType,
};
pub use pointer::PointerInfo;
