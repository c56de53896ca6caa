//! Registration of composed entities with downstream systems
//!
//! Each registrar recognises a subset of component kinds. [`register_all`]
//! offers every entity of a tree to every registrar; entities whose kind a
//! registrar does not accept are skipped by it without error.

pub mod physics;
pub mod render;
pub mod spawn;

pub use physics::{CollisionLayers, PhysicsBody, PhysicsRegistrar, PhysicsShape};
pub use render::{RenderRegistrar, SpriteInstance};
pub use spawn::{SpawnPoint, SpawnRegistrar};

use crate::components::PayloadError;
use crate::scene::{ComponentKind, Entity, SceneTree};

/// Registration failures
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// The entity's payload could not be read by the registrar
    #[error("{registrar} registrar rejected `{id}`: {source}")]
    Payload {
        /// Registrar name
        registrar: &'static str,
        /// Entity id
        id: String,
        /// Schema failure
        #[source]
        source: PayloadError,
    },

    /// The registrar ran out of a bounded resource
    #[error("{registrar} registrar cannot take `{id}`: {reason}")]
    Capacity {
        /// Registrar name
        registrar: &'static str,
        /// Entity id
        id: String,
        /// What ran out
        reason: String,
    },
}

/// A consumer of composed entities
pub trait Registrar {
    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    /// Whether entities of this kind are handled
    fn accepts(&self, kind: &ComponentKind) -> bool;

    /// Record one accepted entity
    fn register(&mut self, entity: &Entity) -> Result<(), RegistrationError>;
}

/// Offer every entity in `tree` to each registrar that accepts its kind.
///
/// Returns the number of registrations made. Stops at the first failure.
pub fn register_all(tree: &SceneTree, registrars: &mut [&mut dyn Registrar]) -> Result<usize, RegistrationError> {
    let mut registered = 0;
    for entity in tree.iter() {
        for registrar in registrars.iter_mut() {
            if registrar.accepts(entity.kind()) {
                registrar.register(entity)?;
                log::trace!("{} registered `{}`", registrar.name(), entity.id());
                registered += 1;
            }
        }
    }
    log::debug!("Registered {} of {} entities", registered, tree.len());
    Ok(registered)
}
