//! Math utilities and types
//!
//! Provides the vector, quaternion and rigid transform types used to place
//! declared components in the scene.

pub use nalgebra::{
    Vector3,
    Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Build a raw quaternion from components in declaration order (x, y, z, w).
///
/// nalgebra's constructor takes the scalar part first, which is easy to get
/// wrong when copying values out of a declaration.
pub fn quat_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quaternion<f32> {
    Quaternion::new(w, x, y, z)
}

/// Euclidean norm of a quaternion, accumulated in f64.
///
/// Authoring tools emit components such as `3.7493994E-33`; summing in
/// double precision keeps those from disturbing the result.
pub fn quat_norm(q: &Quaternion<f32>) -> f64 {
    q.coords
        .iter()
        .map(|c| f64::from(*c) * f64::from(*c))
        .sum::<f64>()
        .sqrt()
}

/// Outcome of checking a declared rotation against the unit-norm band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationCheck {
    /// Norm lies within tolerance of 1; the quaternion is kept exactly as declared.
    Unit(Quat),
    /// Norm is finite and non-zero but outside the band.
    OutOfTolerance(f64),
    /// Zero or non-finite; no rotation can be recovered from it.
    Degenerate(f64),
}

/// Classify a raw quaternion against `tolerance` (absolute deviation of the norm from 1).
pub fn check_rotation(q: &Quaternion<f32>, tolerance: f32) -> RotationCheck {
    let norm = quat_norm(q);
    if !norm.is_finite() || norm <= f64::from(f32::EPSILON) {
        return RotationCheck::Degenerate(norm);
    }
    if approx::abs_diff_eq!(norm, 1.0, epsilon = f64::from(tolerance)) {
        RotationCheck::Unit(Quat::new_unchecked(*q))
    } else {
        RotationCheck::OutOfTolerance(norm)
    }
}

/// Rigid transform: rotation followed by translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position) * self.rotation.to_homogeneous()
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        Point3::from(self.position + self.rotation * point.coords)
    }

    /// Combine this transform (parent) with another (child local).
    ///
    /// The child's offset is rotated by the parent rotation and added to the
    /// parent position; rotations compose as `parent * child`.
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * other.position,
            rotation: self.rotation * other.rotation,
        }
    }

    /// Get the inverse transform
    pub fn inverse(&self) -> Transform {
        let inv_rotation = self.rotation.inverse();
        Transform {
            position: inv_rotation * (-self.position),
            rotation: inv_rotation,
        }
    }
}

/// Math utility functions
pub mod utils {
    use super::Quat;

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians.to_degrees()
    }

    /// Euler angles (roll, pitch, yaw) of a rotation in degrees
    pub fn euler_degrees(rotation: &Quat) -> (f32, f32, f32) {
        let (roll, pitch, yaw) = rotation.euler_angles();
        (rad_to_deg(roll), rad_to_deg(pitch), rad_to_deg(yaw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_1_SQRT_2;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_quat_xyzw_component_order() {
        let q = quat_xyzw(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        assert_eq!(q.i, 0.0);
        assert_eq!(q.k, FRAC_1_SQRT_2);
        assert_eq!(q.w, FRAC_1_SQRT_2);
    }

    #[test]
    fn test_rotation_tolerance_band() {
        let inside = quat_xyzw(0.0, 0.0, 0.0, 1.000_09);
        let outside_high = quat_xyzw(0.0, 0.0, 0.0, 1.000_2);
        let outside_low = quat_xyzw(0.0, 0.0, 0.0, 0.999_8);

        assert!(matches!(check_rotation(&inside, 1e-4), RotationCheck::Unit(_)));
        assert!(matches!(check_rotation(&outside_high, 1e-4), RotationCheck::OutOfTolerance(_)));
        assert!(matches!(check_rotation(&outside_low, 1e-4), RotationCheck::OutOfTolerance(_)));
    }

    #[test]
    fn test_authoring_noise_is_unit() {
        // 180 degrees about -z as exported by the level editor
        let q = quat_xyzw(6.123_234E-17, 6.123_234E-17, -1.0, 3.749_399_4E-33);
        match check_rotation(&q, 1e-4) {
            RotationCheck::Unit(unit) => assert_eq!(*unit.quaternion(), q),
            other => panic!("expected unit rotation, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_quaternion_is_degenerate() {
        let q = quat_xyzw(0.0, 0.0, 0.0, 0.0);
        assert!(matches!(check_rotation(&q, 1e-4), RotationCheck::Degenerate(_)));

        let nan = quat_xyzw(f32::NAN, 0.0, 0.0, 1.0);
        assert!(matches!(check_rotation(&nan, 1e-4), RotationCheck::Degenerate(_)));
    }

    #[test]
    fn test_combine_rotates_child_offset() {
        let parent = Transform::from_position_rotation(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2),
        );
        let child = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));

        let world = parent.combine(&child);

        assert_relative_eq!(world.position, Vec3::new(1.0, 1.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(world.rotation, parent.rotation, epsilon = EPSILON);
    }

    #[test]
    fn test_identity_combine_is_noop() {
        let child = Transform::from_position(Vec3::new(-204.694_26, 0.0, -0.1));
        let world = Transform::identity().combine(&child);
        assert_eq!(world, child);
    }

    #[test]
    fn test_inverse_undoes_transform() {
        let transform = Transform::from_position_rotation(
            Vec3::new(2.0, 3.0, 1.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.785),
        );

        let should_be_identity = transform.combine(&transform.inverse());

        assert_relative_eq!(should_be_identity.position, Vec3::zeros(), epsilon = EPSILON);
        let dot = should_be_identity.rotation.coords.dot(&Quat::identity().coords);
        assert!(dot.abs() > 0.999, "Inverse rotation validation failed");
    }

    #[test]
    fn test_matrix_matches_point_transform() {
        let transform = Transform::from_position_rotation(
            Vec3::new(73.723_724, -86.0, -0.1),
            Quat::new_unchecked(quat_xyzw(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2)),
        );
        let point = Point3::new(1.0, 2.0, 3.0);

        let via_matrix = transform.to_matrix().transform_point(&point);
        let direct = transform.transform_point(point);

        assert_relative_eq!(via_matrix, direct, epsilon = 1e-4);
    }
}
