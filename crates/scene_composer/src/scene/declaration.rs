//! Game object declarations
//!
//! A [`Declaration`] is the composer's input: one primary component plus an
//! ordered list of embedded components, each with an id, a kind tag, an
//! opaque configuration blob and a local position/rotation. Declarations are
//! read from the text format of `.go` files or deserialized with serde.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::format::{self, FormatError, TextField, TextMessage, TextValue};
use crate::foundation::math::{quat_xyzw, Quaternion, Vec3};

use super::entity::Payload;

/// Errors raised while reading a declaration
#[derive(thiserror::Error, Debug)]
pub enum DeclarationError {
    /// Text format error
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// The document has no `components` block to act as the root
    #[error("declaration has no primary component")]
    MissingPrimary,

    /// A required field is absent
    #[error("line {line}: `{block}` block is missing `{field}`")]
    MissingField {
        /// Block name
        block: &'static str,
        /// Field name
        field: &'static str,
        /// Line the block starts on
        line: usize,
    },

    /// A field is present but unusable
    #[error("line {line}: {message}")]
    InvalidValue {
        /// Line of the offending field
        line: usize,
        /// What is wrong with it
        message: String,
    },

    /// The declaration file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Declared position, as written in the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    /// X
    pub x: f32,
    /// Y
    pub y: f32,
    /// Z
    pub z: f32,
}

impl Position {
    /// Create a position
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// As a vector
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Declared rotation quaternion, not yet checked for unit length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    /// X
    pub x: f32,
    /// Y
    pub y: f32,
    /// Z
    pub z: f32,
    /// W
    pub w: f32,
}

impl Rotation {
    /// Create a rotation from components
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// As a raw quaternion
    pub fn to_quaternion(self) -> Quaternion<f32> {
        quat_xyzw(self.x, self.y, self.z, self.w)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl From<Quaternion<f32>> for Rotation {
    fn from(q: Quaternion<f32>) -> Self {
        Self::new(q.i, q.j, q.k, q.w)
    }
}

/// One declared component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Identifier
    pub id: String,
    /// Kind tag (`script`, `factory`, `collisionobject`, `sprite`, ...)
    pub kind: String,
    /// Configuration passed through to the kind's consumer
    #[serde(default)]
    pub config: Payload,
    /// Position relative to the parent
    #[serde(default)]
    pub position: Position,
    /// Rotation relative to the parent
    #[serde(default)]
    pub rotation: Rotation,
}

impl ComponentDescriptor {
    /// Create a descriptor at the origin with no rotation
    pub fn new(id: impl Into<String>, kind: impl Into<String>, config: impl Into<Payload>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            config: config.into(),
            position: Position::default(),
            rotation: Rotation::default(),
        }
    }

    /// Builder pattern: set position
    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Position::new(x, y, z);
        self
    }

    /// Builder pattern: set rotation components
    pub fn rotated(mut self, x: f32, y: f32, z: f32, w: f32) -> Self {
        self.rotation = Rotation::new(x, y, z, w);
        self
    }
}

/// Everything needed to compose one game object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Root component
    pub primary: ComponentDescriptor,
    /// Inline components, in declaration order
    #[serde(default)]
    pub embedded: Vec<ComponentDescriptor>,
    /// Further file-referenced components after the primary one
    #[serde(default)]
    pub referenced: Vec<ComponentDescriptor>,
}

impl Declaration {
    /// Create a declaration with only a root component
    pub fn new(primary: ComponentDescriptor) -> Self {
        Self { primary, embedded: Vec::new(), referenced: Vec::new() }
    }

    /// Builder pattern: append an embedded component
    pub fn with_embedded(mut self, component: ComponentDescriptor) -> Self {
        self.embedded.push(component);
        self
    }

    /// Every descriptor: primary first, then embedded, then referenced
    pub fn descriptors(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        std::iter::once(&self.primary)
            .chain(self.embedded.iter())
            .chain(self.referenced.iter())
    }

    /// Number of declared components including the primary one
    pub fn component_count(&self) -> usize {
        1 + self.embedded.len() + self.referenced.len()
    }

    /// Read a declaration from game object text.
    ///
    /// The first `components` block is the primary component; its kind is the
    /// extension of its `component` path and its configuration is the path
    /// itself. Every `embedded_components` block keeps its `data` verbatim.
    pub fn from_text(input: &str) -> Result<Self, DeclarationError> {
        let document = TextMessage::parse(input)?;

        for unknown in document.unknown_fields(&["components", "embedded_components"]) {
            log::warn!("Ignoring unsupported game object field `{}`", unknown);
        }

        let mut referenced = document
            .named("components")
            .map(referenced_component)
            .collect::<Result<Vec<_>, _>>()?;
        if referenced.is_empty() {
            return Err(DeclarationError::MissingPrimary);
        }
        let primary = referenced.remove(0);

        let embedded = document
            .named("embedded_components")
            .map(embedded_component)
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "Read declaration `{}` with {} embedded and {} referenced components",
            primary.id,
            embedded.len(),
            referenced.len()
        );

        Ok(Self { primary, embedded, referenced })
    }

    /// Read a declaration from a game object file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeclarationError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| DeclarationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loading declaration from {}", path.display());
        Self::from_text(&contents)
    }

    /// Write the declaration back out as game object text
    pub fn to_text(&self) -> String {
        let mut document = TextMessage::new();
        for component in std::iter::once(&self.primary).chain(self.referenced.iter()) {
            let block = TextMessage::new()
                .with("id", TextValue::Str(component.id.clone()))
                .with("component", TextValue::Str(component.config.as_str().to_string()));
            document.push("components", TextValue::Message(with_transform(block, component)));
        }
        for component in &self.embedded {
            let block = TextMessage::new()
                .with("id", TextValue::Str(component.id.clone()))
                .with("type", TextValue::Str(component.kind.clone()))
                .with("data", TextValue::Str(component.config.as_str().to_string()));
            document.push("embedded_components", TextValue::Message(with_transform(block, component)));
        }
        document.to_string()
    }
}

fn with_transform(block: TextMessage, component: &ComponentDescriptor) -> TextMessage {
    block
        .with("position", TextValue::Message(format::vec3_message(&component.position.to_vec3())))
        .with("rotation", TextValue::Message(format::quat_message(&component.rotation.to_quaternion())))
}

fn required_str<'a>(
    block: &'a TextMessage,
    block_name: &'static str,
    field: &'static str,
    line: usize,
) -> Result<&'a str, DeclarationError> {
    block
        .get_str(field)?
        .ok_or(DeclarationError::MissingField { block: block_name, field, line })
}

fn transform_of(block: &TextMessage) -> Result<(Position, Rotation), DeclarationError> {
    let position = format::read_vec3(block, "position")?.map(Position::from).unwrap_or_default();
    let rotation = format::read_quat(block, "rotation")?.map(Rotation::from).unwrap_or_default();
    Ok((position, rotation))
}

fn block_of(field: &TextField) -> Result<&TextMessage, DeclarationError> {
    match &field.value {
        TextValue::Message(block) => Ok(block),
        _ => Err(DeclarationError::Format(FormatError::Type {
            line: field.line,
            field: field.name.clone(),
            expected: "message",
        })),
    }
}

fn referenced_component(field: &TextField) -> Result<ComponentDescriptor, DeclarationError> {
    let block = block_of(field)?;
    let id = required_str(block, "components", "id", field.line)?;
    let path = required_str(block, "components", "component", field.line)?;

    let kind = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| DeclarationError::InvalidValue {
            line: field.line,
            message: format!("component path `{path}` has no extension to derive its kind from"),
        })?;

    let (position, rotation) = transform_of(block)?;
    Ok(ComponentDescriptor {
        id: id.to_string(),
        kind: kind.to_string(),
        config: Payload::new(path),
        position,
        rotation,
    })
}

fn embedded_component(field: &TextField) -> Result<ComponentDescriptor, DeclarationError> {
    let block = block_of(field)?;
    let id = required_str(block, "embedded_components", "id", field.line)?;
    let kind = required_str(block, "embedded_components", "type", field.line)?;
    let data = block.get_str("data")?.unwrap_or_default();

    let (position, rotation) = transform_of(block)?;
    Ok(ComponentDescriptor {
        id: id.to_string(),
        kind: kind.to_string(),
        config: Payload::new(data),
        position,
        rotation,
    })
}
