/// Distance under which the aim point locks onto an existing vertex (metres).
pub const VERTEX_SNAP_RADIUS: f32 = 0.05;
/// Distance under which the aim point locks onto an existing segment (metres).
pub const EDGE_SNAP_RADIUS: f32 = 0.03;

/// Exponential smoothing factor for the live preview distance.
pub const PREVIEW_SMOOTHING: f32 = 0.3;

/// Per-frame lerp factor pulling the reticle position toward its target.
pub const RETICLE_POSITION_LERP: f32 = 0.15;
/// Per-frame slerp factor pulling the reticle rotation toward its target.
pub const RETICLE_ROTATION_SLERP: f32 = 0.10;
/// Distance in front of the camera where the reticle rests while searching.
pub const RETICLE_FALLBACK_DISTANCE: f32 = 1.0;

/// Hits closer than this to the camera are treated as sensor noise.
pub const MIN_HIT_DISTANCE: f32 = 0.10;
/// Hits farther than this are beyond usable tracking range.
pub const MAX_HIT_DISTANCE: f32 = 10.0;

/// Consecutive unresolved frames before an anchor is reported as stale.
pub const STALE_ANCHOR_FRAMES: u32 = 5;

/// Above this |dot| slerp degrades to a normalised lerp.
pub const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;
