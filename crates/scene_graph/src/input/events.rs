//! Normalized UI events and their handlers
//!
//! The windowing layer translates raw input into [`UiEvent`]s. Handlers
//! registered with an [`EventDispatcher`] receive them in registration order;
//! a handler returning `true` consumes the event and stops forwarding.

use bitflags::bitflags;

use crate::core::error::SceneResult;
use crate::foundation::math::Mat4;
use crate::scene::SceneGraph;

/// Kind of a UI event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UiEventType {
    /// No event
    #[default]
    None,
    /// A mouse button went down
    Push,
    /// A mouse button went up
    Release,
    /// Two pushes in quick succession
    DoubleClick,
    /// Pointer moved with a button held
    Drag,
    /// Pointer moved with no button held
    Move,
    /// A key went down
    KeyDown,
    /// A key went up
    KeyUp,
    /// Window was resized
    Resize,
    /// Scroll wheel moved
    Scroll,
    /// Start of a new frame
    Frame,
}

/// Mouse button that triggered a push or release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Wheel button
    Middle,
    /// Secondary button
    Right,
}

/// Platform key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

bitflags! {
    /// Modifier keys held while the event happened
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModKeyMask: u32 {
        /// Either shift key
        const SHIFT = 1 << 0;
        /// Either control key
        const CTRL = 1 << 1;
        /// Either alt key
        const ALT = 1 << 2;
        /// Either super/command key
        const SUPER = 1 << 3;
    }
}

/// Normalized UI event
///
/// Pointer coordinates are normalized device coordinates in `[-1, 1]`:
/// `x = -1` is the left edge and `y = -1` the top edge of the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UiEvent {
    /// Kind of event
    pub event_type: UiEventType,
    /// Seconds since the event stream started
    pub time: f64,
    /// Pointer x in normalized device coordinates
    pub x: f32,
    /// Pointer y in normalized device coordinates
    pub y: f32,
    /// Button for push, release and drag events
    pub button: Option<MouseButton>,
    /// Key for key events
    pub key: Option<KeyCode>,
    /// Held modifier keys
    pub modifiers: ModKeyMask,
}

impl UiEvent {
    /// Pointer event from window-space pixel coordinates
    pub fn from_window(
        event_type: UiEventType,
        screen_x: f64,
        screen_y: f64,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        let ndc_x = (screen_x / f64::from(window_width.max(1))) as f32 * 2.0 - 1.0;
        let ndc_y = (screen_y / f64::from(window_height.max(1))) as f32 * 2.0 - 1.0;
        Self::pointer(event_type, ndc_x, ndc_y)
    }

    /// Pointer event at normalized device coordinates
    pub fn pointer(event_type: UiEventType, x: f32, y: f32) -> Self {
        Self {
            event_type,
            x,
            y,
            button: Some(MouseButton::Left),
            ..Self::default()
        }
    }

    /// Key event
    pub fn key(event_type: UiEventType, key: KeyCode, modifiers: ModKeyMask) -> Self {
        Self {
            event_type,
            key: Some(key),
            modifiers,
            ..Self::default()
        }
    }

    /// Same event with a timestamp
    pub fn at_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Same event with modifier keys
    pub fn with_modifiers(mut self, modifiers: ModKeyMask) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Services the viewer offers to event handlers
pub trait ActionAdapter {
    /// Ask for a new frame to be drawn
    fn request_redraw(&mut self);

    /// Inverse of `projection * view` of the view that produced the event,
    /// used to turn pointer positions into world-space rays
    fn inverse_view_projection(&self) -> Option<Mat4> {
        None
    }
}

/// Minimal [`ActionAdapter`] that records redraw requests
#[derive(Debug, Clone, Default)]
pub struct RedrawFlag {
    redraw_requested: bool,
    inverse_view_projection: Option<Mat4>,
}

impl RedrawFlag {
    /// Adapter without a camera
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter for a view with the given matrices.
    ///
    /// A singular `projection * view` leaves the adapter without a camera.
    pub fn with_camera(view: &Mat4, projection: &Mat4) -> Self {
        let inverse = (projection * view).try_inverse();
        if inverse.is_none() {
            log::warn!("View-projection matrix is singular; pointer rays are unavailable");
        }
        Self {
            redraw_requested: false,
            inverse_view_projection: inverse,
        }
    }

    /// Whether a redraw was requested since the last call, clearing the flag
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Whether a redraw is pending
    pub fn is_set(&self) -> bool {
        self.redraw_requested
    }
}

impl ActionAdapter for RedrawFlag {
    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    fn inverse_view_projection(&self) -> Option<Mat4> {
        self.inverse_view_projection
    }
}

/// Consumer of UI events
pub trait InputEventHandler {
    /// Handle an event; `Ok(true)` consumes it
    fn handle(
        &mut self,
        graph: &mut SceneGraph,
        event: &UiEvent,
        action: &mut dyn ActionAdapter,
    ) -> SceneResult<bool>;
}

/// Chain of responsibility over registered handlers
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Box<dyn InputEventHandler>>,
    pending: Vec<UiEvent>,
}

impl EventDispatcher {
    /// Dispatcher without handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler; earlier handlers see events first
    pub fn add_handler(&mut self, handler: Box<dyn InputEventHandler>) {
        self.handlers.push(handler);
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Queue an event for the next [`dispatch_pending`](Self::dispatch_pending)
    pub fn send(&mut self, event: UiEvent) {
        self.pending.push(event);
    }

    /// Deliver one event now; returns whether a handler consumed it
    pub fn dispatch(
        &mut self,
        graph: &mut SceneGraph,
        event: &UiEvent,
        action: &mut dyn ActionAdapter,
    ) -> SceneResult<bool> {
        for handler in &mut self.handlers {
            if handler.handle(graph, event, action)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Deliver every queued event in order
    pub fn dispatch_pending(
        &mut self,
        graph: &mut SceneGraph,
        action: &mut dyn ActionAdapter,
    ) -> SceneResult<()> {
        let pending = std::mem::take(&mut self.pending);
        for event in &pending {
            self.dispatch(graph, event, action)?;
        }
        Ok(())
    }
}
