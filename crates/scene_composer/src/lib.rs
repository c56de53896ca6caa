//! # Scene Composer
//!
//! Resolves declared game objects into entity trees with world transforms.
//!
//! ## Features
//!
//! - **Declarations**: Read `.go` game object files into typed descriptors
//! - **Composition**: Validate ids and rotations, then build the entity tree
//! - **Payload Schemas**: Optional typed checks for factory, sprite and collision payloads
//! - **Registration**: Hand composed entities to physics, render and spawn registrars
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_composer::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let declaration = Declaration::from_file("level/objects/platform.go")?;
//!     let tree = SceneComposer::standard().compose(&declaration)?;
//!
//!     let mut render = RenderRegistrar::new();
//!     let mut registrars: [&mut dyn Registrar; 1] = [&mut render];
//!     register_all(&tree, &mut registrars)?;
//!
//!     for sprite in render.sorted_instances() {
//!         println!("{} at {:?}", sprite.id, sprite.world.position);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod components;
pub mod config;
pub mod format;
pub mod foundation;
pub mod registry;
pub mod scene;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        components::{standard_schemas, PayloadError, PayloadSchema},
        config::{ComposerConfig, Config, RotationPolicy},
        foundation::math::{Quat, Transform, Vec3},
        registry::{register_all, PhysicsRegistrar, Registrar, RegistrationError, RenderRegistrar, SpawnRegistrar},
        scene::{
            compose, load_and_compose, ComponentDescriptor, ComponentKind, CompositionError, Declaration,
            DeclarationError, Entity, Payload, SceneComposer, SceneError, SceneTree,
        },
    };
}
