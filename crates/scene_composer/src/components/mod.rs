//! Typed views of component payloads
//!
//! The composer never interprets configuration blobs. Consumers that do read
//! them go through the schemas here, which parse a [`Payload`] into a typed
//! descriptor and report anything unusable as a [`PayloadError`].

pub mod collision;
pub mod factory;
pub mod sprite;

pub use collision::{CollisionObjectDesc, CollisionObjectSchema, CollisionObjectType, CollisionShape, ShapeType};
pub use factory::{FactoryDesc, FactorySchema};
pub use sprite::{BlendMode, SpriteDesc, SpriteSchema};

use crate::config::ComposerConfig;
use crate::format::{FormatError, TextMessage};
use crate::scene::{ComponentKind, Payload};

/// Errors raised by payload schema checks
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    /// The payload is not valid text format
    #[error("{0}")]
    Format(#[from] FormatError),

    /// A required field is absent
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A field is present but its value is not acceptable
    #[error("field `{field}`: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Enum value outside the known set
    #[error("field `{field}`: unknown value `{value}`")]
    UnknownValue {
        /// Field name
        field: &'static str,
        /// The value found
        value: String,
    },
}

/// Schema check for one component kind
///
/// Implementations are shared by the composer across threads.
pub trait PayloadSchema: Send + Sync {
    /// Kind this schema applies to
    fn kind(&self) -> ComponentKind;

    /// Check a payload without keeping the parsed result.
    ///
    /// `settings` are the composer's; schemas read the tolerances they need from it.
    fn check(&self, payload: &Payload, settings: &ComposerConfig) -> Result<(), PayloadError>;
}

/// The schemas for every kind with a known payload layout
pub fn standard_schemas() -> Vec<Box<dyn PayloadSchema>> {
    vec![
        Box::new(FactorySchema),
        Box::new(CollisionObjectSchema),
        Box::new(SpriteSchema),
    ]
}

fn parse_payload(payload: &Payload) -> Result<TextMessage, PayloadError> {
    Ok(TextMessage::parse(payload.as_str())?)
}

fn warn_unknown(kind: &str, message: &TextMessage, known: &[&str]) {
    for field in message.unknown_fields(known) {
        log::debug!("{} payload: ignoring field `{}`", kind, field);
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, PayloadError> {
    value.ok_or(PayloadError::MissingField(field))
}

fn non_negative(value: f32, field: &'static str) -> Result<f32, PayloadError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PayloadError::InvalidField {
            field,
            reason: format!("expected a non-negative number, got {value}"),
        })
    }
}
