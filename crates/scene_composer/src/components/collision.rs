//! Collision object payloads
//!
//! A collision object either references an external shape resource or embeds
//! its shapes inline. Embedded shapes store their dimensions in one flat
//! `data` array; each shape owns the slice `data[index..index + count]`:
//!
//! | shape   | count | values               |
//! |---------|-------|----------------------|
//! | sphere  | 1     | radius               |
//! | box     | 3     | half extents x, y, z |
//! | capsule | 2     | radius, height       |

use crate::config::{ComposerConfig, DEFAULT_ROTATION_TOLERANCE};
use crate::format::{self, TextMessage};
use crate::foundation::math::{check_rotation, Quat, RotationCheck, Transform, Vec3};
use crate::scene::{ComponentKind, Payload};

use super::{non_negative, parse_payload, required, warn_unknown, PayloadError, PayloadSchema};

/// How the physics engine drives a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionObjectType {
    /// Simulated by the physics engine
    Dynamic,
    /// Moved by game code, pushes dynamic bodies
    Kinematic,
    /// Never moves
    Static,
    /// Reports overlaps, no collision response
    Trigger,
}

impl CollisionObjectType {
    /// Parse a `COLLISION_OBJECT_TYPE_*` value
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "COLLISION_OBJECT_TYPE_DYNAMIC" => Some(Self::Dynamic),
            "COLLISION_OBJECT_TYPE_KINEMATIC" => Some(Self::Kinematic),
            "COLLISION_OBJECT_TYPE_STATIC" => Some(Self::Static),
            "COLLISION_OBJECT_TYPE_TRIGGER" => Some(Self::Trigger),
            _ => None,
        }
    }
}

/// Primitive shape kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    /// Sphere
    Sphere,
    /// Axis-aligned box in shape space
    Box,
    /// Capsule along the shape's y axis
    Capsule,
}

impl ShapeType {
    /// Parse a `TYPE_*` value
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "TYPE_SPHERE" => Some(Self::Sphere),
            "TYPE_BOX" => Some(Self::Box),
            "TYPE_CAPSULE" => Some(Self::Capsule),
            _ => None,
        }
    }

    /// Number of `data` values the shape consumes
    pub fn data_len(self) -> usize {
        match self {
            Self::Sphere => 1,
            Self::Box => 3,
            Self::Capsule => 2,
        }
    }
}

/// One embedded shape, placed relative to its collision object
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionShape {
    /// Shape kind
    pub shape_type: ShapeType,
    /// Placement inside the collision object
    pub local: Transform,
    /// First dimension value in the object's `data`
    pub index: usize,
    /// Number of dimension values
    pub count: usize,
}

/// Collision object configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionObjectDesc {
    /// External shape resource, empty when shapes are embedded
    pub collision_shape: String,
    /// Body type
    pub object_type: CollisionObjectType,
    /// Mass, zero for non-dynamic bodies
    pub mass: f32,
    /// Friction coefficient
    pub friction: f32,
    /// Bounciness
    pub restitution: f32,
    /// Collision group name
    pub group: String,
    /// Groups this object collides with
    pub mask: Vec<String>,
    /// Embedded shapes
    pub shapes: Vec<CollisionShape>,
    /// Flat dimension values referenced by `shapes`
    pub data: Vec<f32>,
    /// Linear damping in [0, 1]
    pub linear_damping: f32,
    /// Angular damping in [0, 1]
    pub angular_damping: f32,
    /// Whether the body may rotate
    pub locked_rotation: bool,
}

impl CollisionObjectDesc {
    /// Parse with the default rotation tolerance
    pub fn from_payload(payload: &Payload) -> Result<Self, PayloadError> {
        Self::from_payload_with_tolerance(payload, DEFAULT_ROTATION_TOLERANCE)
    }

    /// Parse, checking shape rotations against `tolerance`
    pub fn from_payload_with_tolerance(payload: &Payload, tolerance: f32) -> Result<Self, PayloadError> {
        let message = parse_payload(payload)?;
        warn_unknown(
            "collisionobject",
            &message,
            &[
                "collision_shape", "type", "mass", "friction", "restitution", "group", "mask",
                "embedded_collision_shape", "linear_damping", "angular_damping", "locked_rotation",
                "bullet", "event_collision", "event_contact", "event_trigger",
            ],
        );

        let type_ident = required(message.get_ident("type")?, "type")?;
        let object_type = CollisionObjectType::from_ident(type_ident).ok_or_else(|| PayloadError::UnknownValue {
            field: "type",
            value: type_ident.to_string(),
        })?;

        let mass = non_negative(message.get_f32("mass")?.unwrap_or(0.0), "mass")?;
        match object_type {
            CollisionObjectType::Dynamic if mass <= 0.0 => {
                return Err(PayloadError::InvalidField {
                    field: "mass",
                    reason: "dynamic objects need a positive mass".to_string(),
                });
            }
            CollisionObjectType::Dynamic => {}
            _ if mass != 0.0 => {
                return Err(PayloadError::InvalidField {
                    field: "mass",
                    reason: format!("only dynamic objects may have mass, got {mass}"),
                });
            }
            _ => {}
        }

        let (shapes, data) = match message.get_message("embedded_collision_shape")? {
            Some(embedded) => read_embedded_shapes(embedded, tolerance)?,
            None => (Vec::new(), Vec::new()),
        };
        let collision_shape = message.get_str("collision_shape")?.unwrap_or_default().to_string();
        if collision_shape.is_empty() && shapes.is_empty() {
            return Err(PayloadError::InvalidField {
                field: "embedded_collision_shape",
                reason: "object has neither a shape resource nor embedded shapes".to_string(),
            });
        }

        Ok(Self {
            collision_shape,
            object_type,
            mass,
            friction: non_negative(message.get_f32("friction")?.unwrap_or(0.1), "friction")?,
            restitution: non_negative(message.get_f32("restitution")?.unwrap_or(0.5), "restitution")?,
            group: message.get_str("group")?.unwrap_or_default().to_string(),
            mask: message.all_str("mask")?.into_iter().map(str::to_string).collect(),
            shapes,
            data,
            linear_damping: unit_interval(message.get_f32("linear_damping")?.unwrap_or(0.0), "linear_damping")?,
            angular_damping: unit_interval(message.get_f32("angular_damping")?.unwrap_or(0.0), "angular_damping")?,
            locked_rotation: message.get_bool("locked_rotation")?.unwrap_or(false),
        })
    }

    /// Dimension values of one shape
    pub fn shape_data(&self, shape: &CollisionShape) -> &[f32] {
        &self.data[shape.index..shape.index + shape.count]
    }

    /// Half extents of a box shape
    pub fn half_extents(&self, shape: &CollisionShape) -> Option<Vec3> {
        match (shape.shape_type, self.shape_data(shape)) {
            (ShapeType::Box, [x, y, z]) => Some(Vec3::new(*x, *y, *z)),
            _ => None,
        }
    }
}

fn unit_interval(value: f32, field: &'static str) -> Result<f32, PayloadError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(PayloadError::InvalidField {
            field,
            reason: format!("expected a value in [0, 1], got {value}"),
        })
    }
}

fn read_embedded_shapes(
    embedded: &TextMessage,
    tolerance: f32,
) -> Result<(Vec<CollisionShape>, Vec<f32>), PayloadError> {
    let data = embedded.all_f32("data")?;
    let mut shapes = Vec::new();

    for block in embedded.all_messages("shapes")? {
        let shape_ident = required(block.get_ident("shape_type")?, "shape_type")?;
        let shape_type = ShapeType::from_ident(shape_ident).ok_or_else(|| PayloadError::UnknownValue {
            field: "shape_type",
            value: shape_ident.to_string(),
        })?;

        let index = block.get_u32("index")?.unwrap_or(0) as usize;
        let count = block.get_u32("count")?.map_or(shape_type.data_len(), |c| c as usize);
        if count != shape_type.data_len() {
            return Err(PayloadError::InvalidField {
                field: "count",
                reason: format!("{shape_type:?} shapes take {} values, got {count}", shape_type.data_len()),
            });
        }
        if index + count > data.len() {
            return Err(PayloadError::InvalidField {
                field: "index",
                reason: format!("shape reads data[{index}..{}] but only {} values exist", index + count, data.len()),
            });
        }
        for value in &data[index..index + count] {
            non_negative(*value, "data")?;
        }

        let position = format::read_vec3(block, "position")?.unwrap_or_else(Vec3::zeros);
        let rotation = match format::read_quat(block, "rotation")? {
            None => Quat::identity(),
            Some(raw) => match check_rotation(&raw, tolerance) {
                RotationCheck::Unit(rotation) => rotation,
                RotationCheck::OutOfTolerance(norm) | RotationCheck::Degenerate(norm) => {
                    return Err(PayloadError::InvalidField {
                        field: "rotation",
                        reason: format!("shape rotation is not a unit quaternion (norm {norm})"),
                    });
                }
            },
        };

        shapes.push(CollisionShape {
            shape_type,
            local: Transform::from_position_rotation(position, rotation),
            index,
            count,
        });
    }

    Ok((shapes, data))
}

/// Schema for `collisionobject` components
///
/// Embedded shape rotations are held to the composer's rotation tolerance.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionObjectSchema;

impl PayloadSchema for CollisionObjectSchema {
    fn kind(&self) -> ComponentKind {
        ComponentKind::CollisionObject
    }

    fn check(&self, payload: &Payload, settings: &ComposerConfig) -> Result<(), PayloadError> {
        CollisionObjectDesc::from_payload_with_tolerance(payload, settings.rotation_tolerance).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DANGER: &str = "collision_shape: \"\"\ntype: COLLISION_OBJECT_TYPE_KINEMATIC\nmass: 0.0\nfriction: 0.1\nrestitution: 0.5\ngroup: \"danger\"\nmask: \"hero\"\nembedded_collision_shape {\n  shapes {\n    shape_type: TYPE_BOX\n    position {\n      x: 0.17350361\n      y: -37.516262\n      z: 0.0\n    }\n    rotation {\n      x: 0.0\n      y: 0.0\n      z: 0.0\n      w: 1.0\n    }\n    index: 0\n    count: 3\n  }\n  data: 197.67915\n  data: 42.806835\n  data: 10.0\n}\nlinear_damping: 0.0\nangular_damping: 0.0\nlocked_rotation: false\n";

    fn with_body(body: &str) -> Payload {
        Payload::new(format!(
            "type: COLLISION_OBJECT_TYPE_DYNAMIC\n{body}\nembedded_collision_shape {{ shapes {{ shape_type: TYPE_SPHERE }} data: 2.0 }}\n"
        ))
    }

    #[test]
    fn test_danger_zone() {
        let desc = CollisionObjectDesc::from_payload(&Payload::from(DANGER)).unwrap();
        assert_eq!(desc.object_type, CollisionObjectType::Kinematic);
        assert_eq!(desc.group, "danger");
        assert_eq!(desc.mask, vec!["hero".to_string()]);
        assert_eq!(desc.shapes.len(), 1);
        assert!(desc.collision_shape.is_empty());

        let shape = &desc.shapes[0];
        assert_eq!(shape.shape_type, ShapeType::Box);
        assert_relative_eq!(shape.local.position, Vec3::new(0.173_503_61, -37.516_262, 0.0));
        assert_eq!(desc.half_extents(shape), Some(Vec3::new(197.679_15, 42.806_835, 10.0)));
    }

    #[test]
    fn test_sphere_defaults_count() {
        let desc = CollisionObjectDesc::from_payload(&with_body("mass: 1.0")).unwrap();
        assert_eq!(desc.shapes[0].count, 1);
        assert_eq!(desc.shape_data(&desc.shapes[0]), &[2.0]);
        assert_eq!(desc.half_extents(&desc.shapes[0]), None);
    }

    #[test]
    fn test_dynamic_needs_mass() {
        let err = CollisionObjectDesc::from_payload(&with_body("mass: 0.0")).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidField { field: "mass", .. }));
    }

    #[test]
    fn test_kinematic_with_mass_rejected() {
        let payload = DANGER.replace("mass: 0.0", "mass: 3.0");
        let err = CollisionObjectSchema.check(&Payload::new(payload), &ComposerConfig::default()).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidField { field: "mass", .. }));
    }

    #[test]
    fn test_data_out_of_range() {
        let payload = DANGER.replace("  data: 10.0\n", "");
        let err = CollisionObjectSchema.check(&Payload::new(payload), &ComposerConfig::default()).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidField { field: "index", .. }));
    }

    #[test]
    fn test_count_mismatch() {
        let payload = DANGER.replace("count: 3", "count: 2");
        let err = CollisionObjectSchema.check(&Payload::new(payload), &ComposerConfig::default()).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidField { field: "count", .. }));
    }

    #[test]
    fn test_unknown_type() {
        let payload = DANGER.replace("COLLISION_OBJECT_TYPE_KINEMATIC", "COLLISION_OBJECT_TYPE_GHOST");
        let err = CollisionObjectSchema.check(&Payload::new(payload), &ComposerConfig::default()).unwrap_err();
        assert_eq!(
            err,
            PayloadError::UnknownValue { field: "type", value: "COLLISION_OBJECT_TYPE_GHOST".to_string() }
        );
    }

    #[test]
    fn test_no_shapes_at_all() {
        let err = CollisionObjectSchema
            .check(&Payload::from("type: COLLISION_OBJECT_TYPE_STATIC\n"), &ComposerConfig::default())
            .unwrap_err();
        assert!(matches!(err, PayloadError::InvalidField { field: "embedded_collision_shape", .. }));
    }

    #[test]
    fn test_external_shape_resource() {
        let desc = CollisionObjectDesc::from_payload(&Payload::from(
            "collision_shape: \"/level/ground.tilemap\"\ntype: COLLISION_OBJECT_TYPE_STATIC\n",
        ))
        .unwrap();
        assert_eq!(desc.collision_shape, "/level/ground.tilemap");
        assert!(desc.shapes.is_empty());
    }

    #[test]
    fn test_bad_shape_rotation() {
        let payload = DANGER.replace("      w: 1.0\n", "      w: 2.0\n");
        let err = CollisionObjectSchema.check(&Payload::new(payload), &ComposerConfig::default()).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidField { field: "rotation", .. }));
    }

    #[test]
    fn test_damping_range() {
        let payload = DANGER.replace("linear_damping: 0.0", "linear_damping: 1.5");
        let err = CollisionObjectSchema.check(&Payload::new(payload), &ComposerConfig::default()).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidField { field: "linear_damping", .. }));
    }

    #[test]
    fn test_shape_rotation_uses_configured_tolerance() {
        let payload = Payload::new(DANGER.replace("      w: 1.0\n", "      w: 1.002\n"));
        assert!(CollisionObjectSchema.check(&payload, &ComposerConfig::default()).is_err());

        let loose = ComposerConfig::new().with_rotation_tolerance(0.01);
        assert!(CollisionObjectSchema.check(&payload, &loose).is_ok());
    }
}
