//! Scene composition
//!
//! Turns a [`Declaration`] into a [`SceneTree`]. Every check runs before any
//! entity is built, so a declaration is either composed completely or
//! rejected with the first problem found:
//!
//! 1. ids are unique across the primary and all other components
//! 2. every rotation is a unit quaternion within tolerance
//! 3. payloads pass the schema registered for their kind (optional)
//!
//! World transforms are then resolved top-down as `parent ∘ local`.

use std::collections::HashSet;

use crate::components::{self, PayloadError, PayloadSchema};
use crate::config::{ComposerConfig, ConfigError, RotationPolicy};
use crate::foundation::math::{check_rotation, Quat, RotationCheck, Transform};

use super::declaration::{ComponentDescriptor, Declaration};
use super::entity::{ComponentKind, Entity};
use super::scene_graph::SceneTree;

/// Reasons a declaration cannot be composed
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CompositionError {
    /// Two components share an id
    #[error("duplicate component id `{id}`")]
    DuplicateId {
        /// The repeated id
        id: String,
    },

    /// A rotation is not a unit quaternion
    #[error("component `{id}` has a non-unit rotation (norm {norm})")]
    InvalidRotation {
        /// Offending component
        id: String,
        /// Norm of the declared quaternion
        norm: f64,
    },

    /// A payload failed its kind's schema check
    #[error("component `{id}` has a malformed {kind} payload: {source}")]
    MalformedPayload {
        /// Offending component
        id: String,
        /// Kind tag
        kind: String,
        /// Schema failure
        #[source]
        source: PayloadError,
    },
}

/// Builds validated entity trees from declarations
///
/// A composer holds no per-composition state and can be shared between
/// threads; each call returns an independent tree.
pub struct SceneComposer {
    config: ComposerConfig,
    schemas: Vec<Box<dyn PayloadSchema>>,
}

impl SceneComposer {
    /// Composer with default settings and no payload schemas
    pub fn new() -> Self {
        Self { config: ComposerConfig::default(), schemas: Vec::new() }
    }

    /// Composer with default settings and the factory, collision object and sprite schemas
    pub fn standard() -> Self {
        let mut composer = Self::new();
        composer.schemas = components::standard_schemas();
        composer
    }

    /// Composer with custom configuration and no payload schemas
    ///
    /// Fails if the configuration does not validate.
    pub fn with_config(config: ComposerConfig) -> Result<Self, ConfigError> {
        Self::new().config(config)
    }

    /// Builder pattern: replace the configuration after validating it
    pub fn config(mut self, config: ComposerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Builder pattern: add a payload schema; a later schema for the same kind wins
    pub fn with_schema(mut self, schema: Box<dyn PayloadSchema>) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Current configuration
    pub fn settings(&self) -> &ComposerConfig {
        &self.config
    }

    /// Compose a declaration with the root placed at the scene origin
    pub fn compose(&self, declaration: &Declaration) -> Result<SceneTree, CompositionError> {
        self.compose_under(declaration, &Transform::identity())
    }

    /// Compose a declaration with the root placed under `parent`
    pub fn compose_under(
        &self,
        declaration: &Declaration,
        parent: &Transform,
    ) -> Result<SceneTree, CompositionError> {
        log::debug!(
            "Composing `{}` with {} components",
            declaration.primary.id,
            declaration.component_count()
        );

        check_unique_ids(declaration)?;

        let rotations = declaration
            .descriptors()
            .map(|descriptor| self.resolve_rotation(descriptor))
            .collect::<Result<Vec<Quat>, _>>()?;

        if self.config.validate_payloads {
            for descriptor in declaration.descriptors() {
                self.check_payload(descriptor)?;
            }
        }

        let mut locals = declaration
            .descriptors()
            .zip(rotations)
            .map(|(descriptor, rotation)| {
                Transform::from_position_rotation(descriptor.position.to_vec3(), rotation)
            });

        let root_local = locals.next().unwrap_or_default();
        let root_world = parent.combine(&root_local);

        let children = declaration
            .descriptors()
            .skip(1)
            .zip(locals)
            .map(|(descriptor, local)| build_entity(descriptor, local, root_world.combine(&local), Vec::new()))
            .collect();

        let root = build_entity(&declaration.primary, root_local, root_world, children);
        log::info!(
            "Composed `{}` at ({:.3}, {:.3}, {:.3}) with {} children",
            root.id(),
            root_world.position.x,
            root_world.position.y,
            root_world.position.z,
            root.children().len()
        );

        Ok(SceneTree::new(root))
    }

    fn resolve_rotation(&self, descriptor: &ComponentDescriptor) -> Result<Quat, CompositionError> {
        let raw = descriptor.rotation.to_quaternion();
        match check_rotation(&raw, self.config.rotation_tolerance) {
            RotationCheck::Unit(rotation) => Ok(rotation),
            RotationCheck::OutOfTolerance(norm) if self.config.rotation_policy == RotationPolicy::Renormalize => {
                log::warn!(
                    "Renormalizing rotation of `{}` (norm {:.6})",
                    descriptor.id,
                    norm
                );
                Ok(Quat::new_normalize(raw))
            }
            RotationCheck::OutOfTolerance(norm) | RotationCheck::Degenerate(norm) => {
                Err(CompositionError::InvalidRotation { id: descriptor.id.clone(), norm })
            }
        }
    }

    fn check_payload(&self, descriptor: &ComponentDescriptor) -> Result<(), CompositionError> {
        let kind = ComponentKind::from_tag(&descriptor.kind);
        let Some(schema) = self.schemas.iter().rev().find(|schema| schema.kind() == kind) else {
            log::trace!("No payload schema for `{}` ({})", descriptor.id, kind);
            return Ok(());
        };
        schema.check(&descriptor.config, &self.config).map_err(|source| CompositionError::MalformedPayload {
            id: descriptor.id.clone(),
            kind: descriptor.kind.clone(),
            source,
        })
    }
}

impl Default for SceneComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SceneComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneComposer")
            .field("config", &self.config)
            .field("schemas", &self.schemas.iter().map(|s| s.kind()).collect::<Vec<_>>())
            .finish()
    }
}

fn check_unique_ids(declaration: &Declaration) -> Result<(), CompositionError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(declaration.component_count());
    for descriptor in declaration.descriptors() {
        if !seen.insert(descriptor.id.as_str()) {
            return Err(CompositionError::DuplicateId { id: descriptor.id.clone() });
        }
    }
    Ok(())
}

fn build_entity(
    descriptor: &ComponentDescriptor,
    local: Transform,
    world: Transform,
    children: Vec<Entity>,
) -> Entity {
    let kind = ComponentKind::from_tag(&descriptor.kind);
    if kind.is_opaque() {
        log::debug!("Component `{}` has unrecognized kind `{}`", descriptor.id, kind);
    }
    Entity::new(descriptor.id.clone(), kind, descriptor.config.clone(), local, world, children)
}

/// Compose with a default [`SceneComposer`]
pub fn compose(declaration: &Declaration) -> Result<SceneTree, CompositionError> {
    SceneComposer::new().compose(declaration)
}
