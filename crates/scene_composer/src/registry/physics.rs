//! Physics registration
//!
//! Collision objects become [`PhysicsBody`] records with world-space shapes.
//! Group and mask names are mapped onto layer bits in the order they are
//! first seen, following the usual layer/mask filtering scheme: two bodies
//! interact only if each one's layer is in the other's mask.

use crate::components::{CollisionObjectDesc, CollisionObjectType, ShapeType};
use crate::config::DEFAULT_ROTATION_TOLERANCE;
use crate::foundation::math::Transform;
use crate::scene::{ComponentKind, Entity};

use super::{RegistrationError, Registrar};

/// Number of distinct collision group names a registrar can hold
pub const MAX_COLLISION_GROUPS: usize = 16;

bitflags::bitflags! {
    /// Collision layer bits, one per group name
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionLayers: u16 {
        /// Every layer
        const ALL = u16::MAX;
    }
}

impl CollisionLayers {
    /// Layer bit with the given index
    pub fn layer(index: usize) -> Self {
        Self::from_bits_retain(1 << index)
    }

    /// Check if two bodies should collide based on their layers and masks
    ///
    /// A's layer must be in B's mask and B's layer must be in A's mask.
    pub fn should_collide(layer_a: Self, mask_a: Self, layer_b: Self, mask_b: Self) -> bool {
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }
}

/// A shape placed in world space
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsShape {
    /// Shape kind
    pub shape_type: ShapeType,
    /// World placement
    pub world: Transform,
    /// Radius, half extents or radius/height depending on `shape_type`
    pub dimensions: Vec<f32>,
}

/// A body ready to hand to the physics engine
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBody {
    /// Entity id
    pub id: String,
    /// World placement of the body
    pub world: Transform,
    /// Body type
    pub object_type: CollisionObjectType,
    /// Mass
    pub mass: f32,
    /// Friction
    pub friction: f32,
    /// Restitution
    pub restitution: f32,
    /// Linear damping
    pub linear_damping: f32,
    /// Angular damping
    pub angular_damping: f32,
    /// Rotation locked
    pub locked_rotation: bool,
    /// External shape resource, if any
    pub collision_shape: Option<String>,
    /// Layer of this body
    pub group: CollisionLayers,
    /// Layers this body interacts with
    pub mask: CollisionLayers,
    /// Embedded shapes in world space
    pub shapes: Vec<PhysicsShape>,
}

/// Collects collision objects
#[derive(Debug, Clone)]
pub struct PhysicsRegistrar {
    groups: Vec<String>,
    bodies: Vec<PhysicsBody>,
    rotation_tolerance: f32,
}

impl PhysicsRegistrar {
    /// Create an empty registrar
    pub fn new() -> Self {
        Self::with_rotation_tolerance(DEFAULT_ROTATION_TOLERANCE)
    }

    /// Create a registrar checking shape rotations against `tolerance`
    pub fn with_rotation_tolerance(tolerance: f32) -> Self {
        Self { groups: Vec::new(), bodies: Vec::new(), rotation_tolerance: tolerance }
    }

    /// Registered bodies in registration order
    pub fn bodies(&self) -> &[PhysicsBody] {
        &self.bodies
    }

    /// Body by entity id
    pub fn body(&self, id: &str) -> Option<&PhysicsBody> {
        self.bodies.iter().find(|body| body.id == id)
    }

    /// Group names in bit order
    pub fn group_names(&self) -> &[String] {
        &self.groups
    }

    /// Layer bit assigned to a group name
    pub fn layer_of(&self, group: &str) -> Option<CollisionLayers> {
        self.groups.iter().position(|g| g == group).map(CollisionLayers::layer)
    }

    /// Whether two registered bodies interact
    pub fn should_collide(&self, a: &PhysicsBody, b: &PhysicsBody) -> bool {
        CollisionLayers::should_collide(a.group, a.mask, b.group, b.mask)
    }

    /// Layer bits for a set of names; the empty name has no layer
    fn layers(&self, names: &[&str]) -> CollisionLayers {
        names
            .iter()
            .filter_map(|name| self.layer_of(name))
            .fold(CollisionLayers::empty(), |layers, layer| layers | layer)
    }

    /// Give every unseen name a layer, or none of them if they do not all fit
    fn reserve(&mut self, id: &str, names: &[&str]) -> Result<(), RegistrationError> {
        let mut staged: Vec<&str> = Vec::new();
        for &name in names {
            if !name.is_empty() && self.layer_of(name).is_none() && !staged.contains(&name) {
                staged.push(name);
            }
        }
        if self.groups.len() + staged.len() > MAX_COLLISION_GROUPS {
            return Err(RegistrationError::Capacity {
                registrar: self.name(),
                id: id.to_string(),
                reason: format!(
                    "more than {MAX_COLLISION_GROUPS} collision groups (adding {})",
                    staged.join(", ")
                ),
            });
        }
        for name in staged {
            log::debug!("Collision group `{}` gets layer {}", name, self.groups.len());
            self.groups.push(name.to_string());
        }
        Ok(())
    }
}

impl Default for PhysicsRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl Registrar for PhysicsRegistrar {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn accepts(&self, kind: &ComponentKind) -> bool {
        *kind == ComponentKind::CollisionObject
    }

    fn register(&mut self, entity: &Entity) -> Result<(), RegistrationError> {
        let desc = CollisionObjectDesc::from_payload_with_tolerance(entity.payload(), self.rotation_tolerance)
            .map_err(|source| RegistrationError::Payload {
                registrar: self.name(),
                id: entity.id().to_string(),
                source,
            })?;

        let masks: Vec<&str> = desc.mask.iter().map(String::as_str).collect();
        let names: Vec<&str> = std::iter::once(desc.group.as_str()).chain(masks.iter().copied()).collect();
        self.reserve(entity.id(), &names)?;
        let group = self.layers(&[desc.group.as_str()]);
        let mask = self.layers(&masks);

        let world = *entity.world_transform();
        let shapes = desc
            .shapes
            .iter()
            .map(|shape| PhysicsShape {
                shape_type: shape.shape_type,
                world: world.combine(&shape.local),
                dimensions: desc.shape_data(shape).to_vec(),
            })
            .collect();

        self.bodies.push(PhysicsBody {
            id: entity.id().to_string(),
            world,
            object_type: desc.object_type,
            mass: desc.mass,
            friction: desc.friction,
            restitution: desc.restitution,
            linear_damping: desc.linear_damping,
            angular_damping: desc.angular_damping,
            locked_rotation: desc.locked_rotation,
            collision_shape: Some(desc.collision_shape).filter(|s| !s.is_empty()),
            group,
            mask,
            shapes,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::{ComponentDescriptor, Declaration, SceneComposer, SceneTree};
    use approx::assert_relative_eq;

    const PLATFORM: &str = include_str!("../../resources/platform.go");

    fn body_payload(group: &str, masks: &[&str]) -> String {
        let mut payload = format!("type: COLLISION_OBJECT_TYPE_KINEMATIC\ngroup: \"{group}\"\n");
        for mask in masks {
            payload.push_str(&format!("mask: \"{mask}\"\n"));
        }
        payload.push_str("embedded_collision_shape { shapes { shape_type: TYPE_SPHERE } data: 1.0 }\n");
        payload
    }

    fn register(tree: &SceneTree, registrar: &mut PhysicsRegistrar) {
        for entity in tree.entities_of_kind(&ComponentKind::CollisionObject) {
            registrar.register(entity).unwrap();
        }
    }

    #[test]
    fn test_platform_bodies() {
        let tree = SceneComposer::standard()
            .compose(&Declaration::from_text(PLATFORM).unwrap())
            .unwrap();
        let mut physics = PhysicsRegistrar::new();
        register(&tree, &mut physics);

        assert_eq!(physics.group_names(), &["geometry", "hero", "danger"]);

        let danger = physics.body("danger").unwrap();
        assert_eq!(danger.object_type, CollisionObjectType::Kinematic);
        assert_eq!(danger.group, physics.layer_of("danger").unwrap());
        assert_eq!(danger.mask, physics.layer_of("hero").unwrap());
        assert!(danger.collision_shape.is_none());
        assert_eq!(danger.shapes.len(), 1);
        assert_relative_eq!(danger.shapes[0].world.position, Vec3::new(0.173_503_61, -37.516_262, 0.0));
        assert_eq!(danger.shapes[0].dimensions, vec![197.679_15, 42.806_835, 10.0]);

        let ground = physics.body("collisionobject").unwrap();
        assert!(!physics.should_collide(ground, danger));
    }

    #[test]
    fn test_layer_filtering() {
        let declaration = Declaration::new(ComponentDescriptor::new("script", "script", "/a.script"))
            .with_embedded(ComponentDescriptor::new("hero", "collisionobject", body_payload("hero", &["geometry", "danger"])))
            .with_embedded(ComponentDescriptor::new("ground", "collisionobject", body_payload("geometry", &["hero"])))
            .with_embedded(ComponentDescriptor::new("cloud", "collisionobject", body_payload("cloud", &[])));
        let tree = SceneComposer::standard().compose(&declaration).unwrap();
        let mut physics = PhysicsRegistrar::new();
        register(&tree, &mut physics);

        let hero = physics.body("hero").unwrap();
        let ground = physics.body("ground").unwrap();
        let cloud = physics.body("cloud").unwrap();

        assert!(physics.should_collide(hero, ground));
        assert!(!physics.should_collide(hero, cloud));
        assert!(!physics.should_collide(ground, cloud));
    }

    #[test]
    fn test_shapes_follow_body_transform() {
        let declaration = Declaration::new(ComponentDescriptor::new("script", "script", "/a.script").at(10.0, 0.0, 0.0))
            .with_embedded(
                ComponentDescriptor::new(
                    "body",
                    "collisionobject",
                    "type: COLLISION_OBJECT_TYPE_STATIC\nembedded_collision_shape { shapes { shape_type: TYPE_BOX position { x: 1.0 } } data: 1 data: 2 data: 3 }",
                )
                .at(0.0, 5.0, 0.0)
                .rotated(0.0, 0.0, std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2),
            );
        let tree = SceneComposer::standard().compose(&declaration).unwrap();
        let mut physics = PhysicsRegistrar::new();
        register(&tree, &mut physics);

        let body = physics.body("body").unwrap();
        assert_relative_eq!(body.world.position, Vec3::new(10.0, 5.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(body.shapes[0].world.position, Vec3::new(10.0, 6.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_group_capacity() {
        let mut declaration = Declaration::new(ComponentDescriptor::new("script", "script", "/a.script"));
        for i in 0..=MAX_COLLISION_GROUPS {
            declaration = declaration.with_embedded(ComponentDescriptor::new(
                format!("body{i}"),
                "collisionobject",
                body_payload(&format!("group{i}"), &[]),
            ));
        }
        let tree = SceneComposer::standard().compose(&declaration).unwrap();
        let mut physics = PhysicsRegistrar::new();

        let results: Vec<_> = tree
            .entities_of_kind(&ComponentKind::CollisionObject)
            .map(|entity| physics.register(entity))
            .collect();

        assert!(results[..MAX_COLLISION_GROUPS].iter().all(Result::is_ok));
        assert!(matches!(results[MAX_COLLISION_GROUPS], Err(RegistrationError::Capacity { .. })));
    }

    #[test]
    fn test_layer_bits() {
        assert_eq!(CollisionLayers::layer(0).bits(), 1);
        assert_eq!(CollisionLayers::layer(15).bits(), 0x8000);
        assert!(CollisionLayers::should_collide(
            CollisionLayers::layer(0),
            CollisionLayers::layer(1),
            CollisionLayers::layer(1),
            CollisionLayers::layer(0),
        ));
    }

    #[test]
    fn test_failed_registration_takes_no_layers() {
        let mut declaration = Declaration::new(ComponentDescriptor::new("script", "script", "/a.script"));
        for i in 0..MAX_COLLISION_GROUPS - 1 {
            declaration = declaration.with_embedded(ComponentDescriptor::new(
                format!("body{i}"),
                "collisionobject",
                body_payload(&format!("g{i}"), &[]),
            ));
        }
        declaration = declaration
            .with_embedded(ComponentDescriptor::new("late", "collisionobject", body_payload("new_a", &["new_b"])))
            .with_embedded(ComponentDescriptor::new("fits", "collisionobject", body_payload("new_c", &["g0"])));
        let tree = SceneComposer::standard().compose(&declaration).unwrap();
        let mut physics = PhysicsRegistrar::new();

        for i in 0..MAX_COLLISION_GROUPS - 1 {
            physics.register(tree.get(&format!("body{i}")).unwrap()).unwrap();
        }
        let before = physics.group_names().to_vec();

        let err = physics.register(tree.get("late").unwrap()).unwrap_err();
        assert!(matches!(err, RegistrationError::Capacity { ref id, .. } if id == "late"));
        assert_eq!(physics.group_names(), before.as_slice());
        assert_eq!(physics.bodies().len(), MAX_COLLISION_GROUPS - 1);

        // the last free layer is still there for the next body
        physics.register(tree.get("fits").unwrap()).unwrap();
        assert_eq!(physics.group_names().len(), MAX_COLLISION_GROUPS);
        let fits = physics.body("fits").unwrap();
        assert_eq!(fits.group, physics.layer_of("new_c").unwrap());
        assert_eq!(fits.mask, physics.layer_of("g0").unwrap());
    }
}
