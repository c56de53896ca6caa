//! Factory payloads

use crate::config::ComposerConfig;
use crate::scene::{ComponentKind, Payload};

use super::{parse_payload, required, warn_unknown, PayloadError, PayloadSchema};

/// Spawner configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryDesc {
    /// Path of the game object spawned by this factory
    pub prototype: String,
    /// Load the prototype's resources on first spawn instead of with the parent
    pub load_dynamically: bool,
}

impl FactoryDesc {
    /// Parse a factory payload
    pub fn from_payload(payload: &Payload) -> Result<Self, PayloadError> {
        let message = parse_payload(payload)?;
        warn_unknown("factory", &message, &["prototype", "load_dynamically", "dynamic_prototype"]);

        let prototype = required(message.get_str("prototype")?, "prototype")?;
        if prototype.is_empty() {
            return Err(PayloadError::InvalidField {
                field: "prototype",
                reason: "path is empty".to_string(),
            });
        }

        Ok(Self {
            prototype: prototype.to_string(),
            load_dynamically: message.get_bool("load_dynamically")?.unwrap_or(false),
        })
    }
}

/// Schema for `factory` components
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorySchema;

impl PayloadSchema for FactorySchema {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Factory
    }

    fn check(&self, payload: &Payload, _settings: &ComposerConfig) -> Result<(), PayloadError> {
        FactoryDesc::from_payload(payload).map(|_| ())
    }
}
