//! Stateless vector and quaternion helpers shared by the measure tool and
//! reticle.
//!
//! Every function here is total: degenerate input (zero-length segments,
//! zero directions, antiparallel axes) yields a well-defined result instead of
//! NaN, because the callers run inside the per-frame loop.

use bevy::math::{Quat, Vec3};
use constants::coordinate_system::PRIMITIVE_AXIS;
use constants::measure_settings::SLERP_LINEAR_THRESHOLD;

const DEGENERATE_LENGTH_SQ: f32 = 1e-12;

pub fn distance(a: Vec3, b: Vec3) -> f32 {
    a.distance(b)
}

pub fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    (a + b) * 0.5
}

pub fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Closest point to `point` on the closed segment `[seg_start, seg_end]`.
///
/// The projection parameter is clamped to `[0, 1]`, so the result never leaves
/// the segment. A zero-length segment returns `seg_start`.
pub fn project_point_on_segment(point: Vec3, seg_start: Vec3, seg_end: Vec3) -> Vec3 {
    let edge = seg_end - seg_start;
    let len_sq = edge.length_squared();
    if len_sq < DEGENERATE_LENGTH_SQ {
        return seg_start;
    }

    let t = ((point - seg_start).dot(edge) / len_sq).clamp(0.0, 1.0);
    seg_start + edge * t
}

/// Spherical interpolation taking the shorter arc between `qa` and `qb`.
pub fn slerp(qa: Quat, qb: Quat, t: f32) -> Quat {
    let mut qb = qb;
    let mut dot = qa.dot(qb);

    // q and -q encode the same rotation; flip to stay on the short path.
    if dot < 0.0 {
        qb = -qb;
        dot = -dot;
    }

    if dot > SLERP_LINEAR_THRESHOLD {
        return (qa + (qb - qa) * t).normalize();
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta_0 = theta_0.sin();

    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;
    (qa * s0 + qb * s1).normalize()
}

/// Rotation taking the primitive axis onto `direction`.
///
/// Used to orient the line primitive drawn between two vertices. A zero
/// direction yields identity; an antiparallel direction yields a half turn.
pub fn rotation_aligned_to(direction: Vec3) -> Quat {
    let Some(dir) = direction.try_normalize() else {
        return Quat::IDENTITY;
    };

    let cos_angle = PRIMITIVE_AXIS.dot(dir).clamp(-1.0, 1.0);
    let axis = PRIMITIVE_AXIS.cross(dir);

    match axis.try_normalize() {
        Some(axis) => Quat::from_axis_angle(axis, cos_angle.acos()),
        None if cos_angle > 0.0 => Quat::IDENTITY,
        // Antiparallel: any axis perpendicular to the primitive axis works.
        None => Quat::from_axis_angle(PRIMITIVE_AXIS.any_orthonormal_vector(), std::f32::consts::PI),
    }
}
