//! Composed entities
//!
//! An [`Entity`] is one node of a composed game object: its identity, the kind
//! of component it carries, the configuration blob handed to that component's
//! consumer, and both its local and resolved world transform.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Quat, Transform, Vec3};

/// Category of behaviour or data a component carries
///
/// Tags outside the known set are kept as [`ComponentKind::Opaque`] so newer
/// declarations still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    /// Behaviour script attached to the game object
    Script,
    /// Spawner for a prototype game object
    Factory,
    /// Physics body with collision shapes
    CollisionObject,
    /// Animated sprite from a tile set
    Sprite,
    /// Any other tag, kept verbatim
    Opaque(String),
}

impl ComponentKind {
    /// Map a declaration tag onto a kind
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "script" => ComponentKind::Script,
            "factory" => ComponentKind::Factory,
            "collisionobject" => ComponentKind::CollisionObject,
            "sprite" => ComponentKind::Sprite,
            other => ComponentKind::Opaque(other.to_string()),
        }
    }

    /// The declaration tag for this kind
    pub fn tag(&self) -> &str {
        match self {
            ComponentKind::Script => "script",
            ComponentKind::Factory => "factory",
            ComponentKind::CollisionObject => "collisionobject",
            ComponentKind::Sprite => "sprite",
            ComponentKind::Opaque(tag) => tag,
        }
    }

    /// Whether the tag was outside the known set
    pub fn is_opaque(&self) -> bool {
        matches!(self, ComponentKind::Opaque(_))
    }
}

impl From<String> for ComponentKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.tag().to_string()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Uninterpreted component configuration
///
/// The composer stores this byte-for-byte; only the consumer of the
/// component's kind reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    /// Wrap configuration text
    pub fn new(contents: impl Into<String>) -> Self {
        Self(contents.into())
    }

    /// Configuration as text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Configuration as raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Whether the configuration is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Payload {
    fn from(contents: &str) -> Self {
        Self::new(contents)
    }
}

impl From<String> for Payload {
    fn from(contents: String) -> Self {
        Self(contents)
    }
}

/// A node of a composed scene
///
/// Entities are built by [`SceneComposer`](super::SceneComposer) and are
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: String,
    kind: ComponentKind,
    payload: Payload,
    local: Transform,
    world: Transform,
    children: Vec<Entity>,
}

impl Entity {
    pub(crate) fn new(
        id: String,
        kind: ComponentKind,
        payload: Payload,
        local: Transform,
        world: Transform,
        children: Vec<Entity>,
    ) -> Self {
        Self { id, kind, payload, local, world, children }
    }

    /// Identifier, unique among siblings
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Component kind
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Configuration exactly as declared
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Transform relative to the parent
    pub fn local_transform(&self) -> &Transform {
        &self.local
    }

    /// Transform relative to the scene origin
    pub fn world_transform(&self) -> &Transform {
        &self.world
    }

    /// Position relative to the parent
    pub fn local_position(&self) -> Vec3 {
        self.local.position
    }

    /// Rotation relative to the parent
    pub fn local_rotation(&self) -> Quat {
        self.local.rotation
    }

    /// Position relative to the scene origin
    pub fn world_position(&self) -> Vec3 {
        self.world.position
    }

    /// Rotation relative to the scene origin
    pub fn world_rotation(&self) -> Quat {
        self.world.rotation
    }

    /// Child entities in declaration order
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Direct child by id
    pub fn child(&self, id: &str) -> Option<&Entity> {
        self.children.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_round_trip() {
        for tag in ["script", "factory", "collisionobject", "sprite"] {
            let kind = ComponentKind::from_tag(tag);
            assert!(!kind.is_opaque());
            assert_eq!(kind.tag(), tag);
        }
    }

    #[test]
    fn test_unknown_tag_is_opaque() {
        let kind = ComponentKind::from_tag("particlefx");
        assert_eq!(kind, ComponentKind::Opaque("particlefx".to_string()));
        assert_eq!(kind.to_string(), "particlefx");
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert!(ComponentKind::from_tag("Sprite").is_opaque());
    }

    #[test]
    fn test_payload_kept_verbatim() {
        let raw = "tile_set: \"/level/level.atlas\"\n";
        let payload = Payload::from(raw);
        assert_eq!(payload.as_str(), raw);
        assert_eq!(payload.as_bytes(), raw.as_bytes());
        assert!(!payload.is_empty());
        assert!(Payload::default().is_empty());
    }
}
