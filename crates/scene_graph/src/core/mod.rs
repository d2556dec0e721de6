//! # Core Scene Graph Systems
//!
//! Cross-cutting pieces every subsystem depends on:
//!
//! - **config**: serializable configuration for graph, intersection and manipulators
//! - **error**: the crate error type
//! - **thread_guard**: rendering-thread affinity checks

pub mod config;
pub mod error;
pub mod thread_guard;

pub use config::{Config, ConfigError, GraphConfig, IntersectionConfig, ManipulatorConfig, SceneConfig};
pub use error::{SceneError, SceneResult};
pub use thread_guard::{RenderThreadGuard, RENDER_THREAD};
