//! # Unified Configuration System
//!
//! Configuration for the scene graph core, the intersection subsystem and the
//! interactive manipulators. Every section is serializable and can be loaded
//! from TOML or RON files through the [`Config`] trait.
//!
//! ## Configuration Categories
//!
//! - **Graph Config**: default node masks, debug cycle detection
//! - **Intersection Config**: hit limits and numeric tolerance
//! - **Manipulator Config**: dragger handle sizes, colors and pick gating

use serde::{Deserialize, Serialize};

use crate::intersect::IntersectionLimit;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # Graph Configuration
///
/// Behaviour of the node arena itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Node mask given to freshly created nodes
    pub default_node_mask: u32,
    /// Reject `add_child` calls that would introduce a cycle
    pub check_cycles: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_node_mask: u32::MAX,
            check_cycles: cfg!(debug_assertions),
        }
    }
}

impl GraphConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_node_mask == 0 {
            return Err(ConfigError::Invalid(
                "default_node_mask of 0 would hide every new node from all visitors".to_string(),
            ));
        }
        Ok(())
    }
}

/// # Intersection Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionConfig {
    /// Default hit limit for new line-segment intersectors
    pub limit: IntersectionLimit,
    /// Tolerance for parallel and degenerate tests
    pub epsilon: f32,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            limit: IntersectionLimit::NoLimit,
            epsilon: 1.0e-6,
        }
    }
}

impl IntersectionConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.epsilon > 0.0 && self.epsilon < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "intersection epsilon must be in (0, 1), got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// # Manipulator Configuration
///
/// Defaults applied to draggers when their handle geometry is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManipulatorConfig {
    /// Only accept a push when the pointer hit one of the dragger's handles
    pub check_for_node_in_path: bool,
    /// Handle color at rest (RGBA)
    pub handle_color: [f32; 4],
    /// Handle color while being dragged (RGBA)
    pub pick_color: [f32; 4],
    /// Edge length of box handles and radius of cone handles
    pub handle_size: f32,
    /// Smallest scale factor a scale dragger will emit
    pub min_scale: f32,
}

impl Default for ManipulatorConfig {
    fn default() -> Self {
        Self {
            check_for_node_in_path: true,
            handle_color: [0.0, 1.0, 0.0, 1.0],
            pick_color: [1.0, 0.0, 1.0, 1.0],
            handle_size: 0.05,
            min_scale: 0.001,
        }
    }
}

impl ManipulatorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.handle_size <= 0.0 {
            return Err(ConfigError::Invalid("handle_size must be positive".to_string()));
        }
        if self.min_scale <= 0.0 {
            return Err(ConfigError::Invalid("min_scale must be positive".to_string()));
        }
        Ok(())
    }
}

/// # Scene Configuration
///
/// Top-level configuration, one section per subsystem.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Node arena behaviour
    pub graph: GraphConfig,
    /// Intersection defaults
    pub intersection: IntersectionConfig,
    /// Dragger defaults
    pub manipulators: ManipulatorConfig,
}

impl SceneConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.graph.validate()?;
        self.intersection.validate()?;
        self.manipulators.validate()
    }
}

impl Config for SceneConfig {}
