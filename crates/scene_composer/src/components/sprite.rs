//! Sprite payloads

use crate::config::ComposerConfig;
use crate::scene::{ComponentKind, Payload};

use super::{parse_payload, required, warn_unknown, PayloadError, PayloadSchema};

/// Material used when a sprite does not name one
pub const DEFAULT_SPRITE_MATERIAL: &str = "/builtins/materials/sprite.material";

/// How a sprite is blended with what is behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard alpha blending
    #[default]
    Alpha,
    /// Additive
    Add,
    /// Additive, scaled by source alpha
    AddAlpha,
    /// Multiply
    Mult,
    /// Screen
    Screen,
}

impl BlendMode {
    /// Parse a `BLEND_MODE_*` value
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "BLEND_MODE_ALPHA" => Some(BlendMode::Alpha),
            "BLEND_MODE_ADD" => Some(BlendMode::Add),
            "BLEND_MODE_ADD_ALPHA" => Some(BlendMode::AddAlpha),
            "BLEND_MODE_MULT" => Some(BlendMode::Mult),
            "BLEND_MODE_SCREEN" => Some(BlendMode::Screen),
            _ => None,
        }
    }
}

/// Sprite configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteDesc {
    /// Atlas or tile source the animation comes from
    pub tile_set: String,
    /// Animation played when the sprite is created
    pub default_animation: String,
    /// Material path
    pub material: String,
    /// Blend mode
    pub blend_mode: BlendMode,
}

impl SpriteDesc {
    /// Parse a sprite payload
    pub fn from_payload(payload: &Payload) -> Result<Self, PayloadError> {
        let message = parse_payload(payload)?;
        warn_unknown(
            "sprite",
            &message,
            &["tile_set", "default_animation", "material", "blend_mode", "size_mode", "size", "offset", "playback_rate"],
        );

        let tile_set = required(message.get_str("tile_set")?, "tile_set")?;
        if tile_set.is_empty() {
            return Err(PayloadError::InvalidField {
                field: "tile_set",
                reason: "path is empty".to_string(),
            });
        }
        let default_animation = required(message.get_str("default_animation")?, "default_animation")?;

        let blend_mode = match message.get_ident("blend_mode")? {
            Some(ident) => BlendMode::from_ident(ident).ok_or_else(|| PayloadError::UnknownValue {
                field: "blend_mode",
                value: ident.to_string(),
            })?,
            None => BlendMode::default(),
        };

        Ok(Self {
            tile_set: tile_set.to_string(),
            default_animation: default_animation.to_string(),
            material: message
                .get_str("material")?
                .unwrap_or(DEFAULT_SPRITE_MATERIAL)
                .to_string(),
            blend_mode,
        })
    }
}

/// Schema for `sprite` components
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteSchema;

impl PayloadSchema for SpriteSchema {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Sprite
    }

    fn check(&self, payload: &Payload, _settings: &ComposerConfig) -> Result<(), PayloadError> {
        SpriteDesc::from_payload(payload).map(|_| ())
    }
}
