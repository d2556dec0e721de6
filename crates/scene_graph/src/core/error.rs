//! Error types shared by the scene graph subsystems

use std::thread::ThreadId;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::foundation::collections::{DrawableId, NodeId};

/// Result type for scene graph operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Scene graph errors
///
/// Structural and contract violations surface here. Geometric degeneracy
/// (parallel rays, zero-length segments) is never an error; those paths
/// return `None` or an empty collection instead.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The requested structural change is not allowed
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The node handle does not refer to a live node
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// The drawable handle does not refer to a live drawable
    #[error("Drawable not found: {0:?}")]
    DrawableNotFound(DrawableId),

    /// A rendering-sensitive call was made off the rendering thread
    #[error("Cross-thread usage: rendering thread is {owner:?}, called from {current:?}")]
    CrossThread {
        /// Thread registered as the rendering thread
        owner: ThreadId,
        /// Thread that made the call
        current: ThreadId,
    },

    /// A construction request the implementation cannot honour
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Failure reported by the graphics device collaborator
    #[error("Device error: {0}")]
    Device(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
