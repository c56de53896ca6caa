//! # Configuration System
//!
//! Composer settings and the file loading trait shared by every config type.
//! Files are read as TOML or RON depending on their extension.

pub use serde::{Serialize, Deserialize};

use std::path::Path;

/// Default allowed deviation of a rotation quaternion's norm from 1
pub const DEFAULT_ROTATION_TOLERANCE: f32 = 1e-4;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        match extension(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
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

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What the composer does with a rotation whose norm falls outside tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Fail the whole declaration
    #[default]
    Reject,
    /// Scale the quaternion back to unit length and carry on
    Renormalize,
}

/// # Composer Configuration
///
/// Controls validation strictness of [`SceneComposer`](crate::scene::SceneComposer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Allowed absolute deviation of a rotation's norm from 1
    pub rotation_tolerance: f32,
    /// Handling of rotations outside the tolerance band
    pub rotation_policy: RotationPolicy,
    /// Run registered payload schemas during composition
    pub validate_payloads: bool,
}

impl ComposerConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self {
            rotation_tolerance: DEFAULT_ROTATION_TOLERANCE,
            rotation_policy: RotationPolicy::Reject,
            validate_payloads: true,
        }
    }

    /// Set the rotation tolerance
    pub fn with_rotation_tolerance(mut self, tolerance: f32) -> Self {
        self.rotation_tolerance = tolerance;
        self
    }

    /// Set the out-of-tolerance rotation policy
    pub fn with_rotation_policy(mut self, policy: RotationPolicy) -> Self {
        self.rotation_policy = policy;
        self
    }

    /// Enable or disable payload schema checks
    pub fn with_payload_validation(mut self, enabled: bool) -> Self {
        self.validate_payloads = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rotation_tolerance.is_finite() || self.rotation_tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "rotation_tolerance must be a non-negative number, got {}",
                self.rotation_tolerance
            )));
        }
        if self.rotation_tolerance >= 1.0 {
            return Err(ConfigError::Invalid(
                "rotation_tolerance must be below 1.0 or zero quaternions would pass".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for ComposerConfig {}
