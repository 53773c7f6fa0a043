use bevy::math::Vec3;

/// Tracking space is right-handed, Y-up, metres. Cameras look down their
/// local -Z axis.
pub const CAMERA_FORWARD: Vec3 = Vec3::NEG_Z;

/// Long axis of the line/cylinder primitive drawn between two vertices.
/// `rotation_aligned_to` rotates this axis onto the segment direction.
pub const PRIMITIVE_AXIS: Vec3 = Vec3::Y;
