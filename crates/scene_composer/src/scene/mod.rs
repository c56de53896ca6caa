//! Scene composition
//!
//! Resolves a declared game object into an entity tree ready to be handed to
//! the physics, render and spawn registrars.
//!
//! ## Pipeline
//!
//! ```text
//! .go text ──► Declaration ──► SceneComposer ──► SceneTree ──► Registrars
//!             (declaration)     (composer)      (scene_graph)   (registry)
//! ```

mod composer;
mod declaration;
mod entity;
mod scene_graph;

#[cfg(test)]
mod tests;

pub use composer::{compose, CompositionError, SceneComposer};
pub use declaration::{ComponentDescriptor, Declaration, DeclarationError, Position, Rotation};
pub use entity::{ComponentKind, Entity, Payload};
pub use scene_graph::SceneTree;

use std::path::Path;

/// Any failure between reading a declaration and composing it
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// The declaration could not be read
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// The declaration was read but is not valid
    #[error(transparent)]
    Composition(#[from] CompositionError),
}

/// Read a game object file and compose it at the scene origin
pub fn load_and_compose(path: impl AsRef<Path>, composer: &SceneComposer) -> Result<SceneTree, SceneError> {
    let declaration = Declaration::from_file(path)?;
    Ok(composer.compose(&declaration)?)
}
