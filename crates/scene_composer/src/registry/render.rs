//! Sprite registration
//!
//! Sprites become [`SpriteInstance`] records carrying their world placement.
//! Draw order is back-to-front by world z; sprites at the same depth keep
//! declaration order.

use crate::components::{BlendMode, SpriteDesc};
use crate::foundation::math::{Mat4, Transform};
use crate::scene::{ComponentKind, Entity};

use super::{RegistrationError, Registrar};

/// A sprite ready for the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteInstance {
    /// Entity id
    pub id: String,
    /// World placement
    pub world: Transform,
    /// Atlas the animation comes from
    pub tile_set: String,
    /// Animation to start
    pub animation: String,
    /// Material path
    pub material: String,
    /// Blend mode
    pub blend_mode: BlendMode,
}

impl SpriteInstance {
    /// Model matrix for the instance
    pub fn model_matrix(&self) -> Mat4 {
        self.world.to_matrix()
    }

    /// World depth used for ordering
    pub fn depth(&self) -> f32 {
        self.world.position.z
    }
}

/// Sprites sharing a material and blend mode
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteBatch<'a> {
    /// Material path
    pub material: &'a str,
    /// Blend mode
    pub blend_mode: BlendMode,
    /// Instances in draw order
    pub instances: Vec<&'a SpriteInstance>,
}

/// Collects sprites
#[derive(Debug, Clone, Default)]
pub struct RenderRegistrar {
    instances: Vec<SpriteInstance>,
}

impl RenderRegistrar {
    /// Create an empty registrar
    pub fn new() -> Self {
        Self::default()
    }

    /// Instances in registration order
    pub fn instances(&self) -> &[SpriteInstance] {
        &self.instances
    }

    /// Instances back-to-front
    pub fn sorted_instances(&self) -> Vec<&SpriteInstance> {
        let mut sorted: Vec<&SpriteInstance> = self.instances.iter().collect();
        // stable: equal depths stay in declaration order
        sorted.sort_by(|a, b| a.depth().total_cmp(&b.depth()));
        sorted
    }

    /// Consecutive runs of the draw order that can share one pipeline state
    pub fn batches(&self) -> Vec<SpriteBatch<'_>> {
        let mut batches: Vec<SpriteBatch<'_>> = Vec::new();
        for instance in self.sorted_instances() {
            match batches.last_mut() {
                Some(batch) if batch.material == instance.material && batch.blend_mode == instance.blend_mode => {
                    batch.instances.push(instance);
                }
                _ => batches.push(SpriteBatch {
                    material: &instance.material,
                    blend_mode: instance.blend_mode,
                    instances: vec![instance],
                }),
            }
        }
        batches
    }
}

impl Registrar for RenderRegistrar {
    fn name(&self) -> &'static str {
        "render"
    }

    fn accepts(&self, kind: &ComponentKind) -> bool {
        *kind == ComponentKind::Sprite
    }

    fn register(&mut self, entity: &Entity) -> Result<(), RegistrationError> {
        let desc = SpriteDesc::from_payload(entity.payload()).map_err(|source| RegistrationError::Payload {
            registrar: self.name(),
            id: entity.id().to_string(),
            source,
        })?;

        self.instances.push(SpriteInstance {
            id: entity.id().to_string(),
            world: *entity.world_transform(),
            tile_set: desc.tile_set,
            animation: desc.default_animation,
            material: desc.material,
            blend_mode: desc.blend_mode,
        });
        Ok(())
    }
}
