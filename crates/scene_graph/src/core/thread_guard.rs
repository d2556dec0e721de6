//! Rendering-thread affinity guard
//!
//! GPU resource updates and draw submission must all happen on one thread.
//! The guard records that thread once and rejects calls from any other thread
//! with [`SceneError::CrossThread`]. It does not schedule anything.

use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use crate::core::error::{SceneError, SceneResult};

/// Process-wide guard used when the application does not supply its own
pub static RENDER_THREAD: RenderThreadGuard = RenderThreadGuard::new();

/// Set-once record of the rendering thread
#[derive(Debug, Default)]
pub struct RenderThreadGuard {
    owner: OnceLock<ThreadId>,
}

impl RenderThreadGuard {
    /// Create a guard with no rendering thread registered
    pub const fn new() -> Self {
        Self { owner: OnceLock::new() }
    }

    /// Register the calling thread as the rendering thread.
    ///
    /// Calling this again from the registered thread is a no-op; calling it
    /// from another thread fails with [`SceneError::CrossThread`].
    pub fn set_rendering_thread_current(&self) -> SceneResult<()> {
        let current = thread::current().id();
        let owner = *self.owner.get_or_init(|| current);
        if owner == current {
            log::debug!("Rendering thread set to {:?}", current);
            Ok(())
        } else {
            Err(Self::violation(owner, current))
        }
    }

    /// Fail unless the calling thread is the rendering thread.
    ///
    /// The first rendering-sensitive call claims the thread when none has
    /// been registered yet.
    pub fn assert_rendering_thread(&self) -> SceneResult<()> {
        let current = thread::current().id();
        let owner = *self.owner.get_or_init(|| current);
        if owner == current {
            Ok(())
        } else {
            Err(Self::violation(owner, current))
        }
    }

    /// Registered rendering thread, if any
    pub fn rendering_thread(&self) -> Option<ThreadId> {
        self.owner.get().copied()
    }

    fn violation(owner: ThreadId, current: ThreadId) -> SceneError {
        log::error!(
            "Rendering-sensitive call from {:?}; rendering thread is {:?}",
            current,
            owner
        );
        SceneError::CrossThread { owner, current }
    }
}
