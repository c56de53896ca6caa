//! Declaration file formats

pub mod text;

pub use text::{FormatError, TextField, TextMessage, TextValue, MAX_NESTING_DEPTH};

use crate::foundation::math::{quat_xyzw, Quaternion, Vec3};

/// Read a `name { x: .. y: .. z: .. }` block; absent axes are zero
pub fn read_vec3(message: &TextMessage, name: &str) -> Result<Option<Vec3>, FormatError> {
    let Some(block) = message.get_message(name)? else {
        return Ok(None);
    };
    Ok(Some(Vec3::new(
        block.get_f32("x")?.unwrap_or(0.0),
        block.get_f32("y")?.unwrap_or(0.0),
        block.get_f32("z")?.unwrap_or(0.0),
    )))
}

/// Read a `name { x: .. y: .. z: .. w: .. }` block without normalizing it.
///
/// Absent imaginary parts are zero and an absent `w` is one, so an empty
/// block reads as the identity rotation.
pub fn read_quat(message: &TextMessage, name: &str) -> Result<Option<Quaternion<f32>>, FormatError> {
    let Some(block) = message.get_message(name)? else {
        return Ok(None);
    };
    Ok(Some(quat_xyzw(
        block.get_f32("x")?.unwrap_or(0.0),
        block.get_f32("y")?.unwrap_or(0.0),
        block.get_f32("z")?.unwrap_or(0.0),
        block.get_f32("w")?.unwrap_or(1.0),
    )))
}

/// Build a `{ x y z }` block
pub fn vec3_message(v: &Vec3) -> TextMessage {
    TextMessage::new()
        .with("x", number(v.x))
        .with("y", number(v.y))
        .with("z", number(v.z))
}

/// Build a `{ x y z w }` block
pub fn quat_message(q: &Quaternion<f32>) -> TextMessage {
    TextMessage::new()
        .with("x", number(q.i))
        .with("y", number(q.j))
        .with("z", number(q.k))
        .with("w", number(q.w))
}

/// Float literal that parses back to the same value
pub fn number(value: f32) -> TextValue {
    TextValue::Number(format!("{value:?}"))
}
