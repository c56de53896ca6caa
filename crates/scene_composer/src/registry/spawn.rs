//! Factory registration

use crate::components::FactoryDesc;
use crate::foundation::math::Transform;
use crate::scene::{ComponentKind, Entity};

use super::{RegistrationError, Registrar};

/// A place new game objects can be spawned from
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPoint {
    /// Entity id of the factory
    pub id: String,
    /// Where spawned objects appear
    pub world: Transform,
    /// Game object spawned
    pub prototype: String,
    /// Load prototype resources lazily
    pub load_dynamically: bool,
}

/// Collects factories
#[derive(Debug, Clone, Default)]
pub struct SpawnRegistrar {
    spawn_points: Vec<SpawnPoint>,
}

impl SpawnRegistrar {
    /// Create an empty registrar
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn points in registration order
    pub fn spawn_points(&self) -> &[SpawnPoint] {
        &self.spawn_points
    }

    /// Prototypes that must be loaded together with the scene
    pub fn eager_prototypes(&self) -> impl Iterator<Item = &str> {
        self.spawn_points
            .iter()
            .filter(|point| !point.load_dynamically)
            .map(|point| point.prototype.as_str())
    }
}

impl Registrar for SpawnRegistrar {
    fn name(&self) -> &'static str {
        "spawn"
    }

    fn accepts(&self, kind: &ComponentKind) -> bool {
        *kind == ComponentKind::Factory
    }

    fn register(&mut self, entity: &Entity) -> Result<(), RegistrationError> {
        let desc = FactoryDesc::from_payload(entity.payload()).map_err(|source| RegistrationError::Payload {
            registrar: self.name(),
            id: entity.id().to_string(),
            source,
        })?;

        self.spawn_points.push(SpawnPoint {
            id: entity.id().to_string(),
            world: *entity.world_transform(),
            prototype: desc.prototype,
            load_dynamically: desc.load_dynamically,
        });
        Ok(())
    }
}
