use constants::measure_settings::{
    EDGE_SNAP_RADIUS, MAX_HIT_DISTANCE, MIN_HIT_DISTANCE, PREVIEW_SMOOTHING,
    RETICLE_FALLBACK_DISTANCE, RETICLE_POSITION_LERP, RETICLE_ROTATION_SLERP,
    STALE_ANCHOR_FRAMES, VERTEX_SNAP_RADIUS,
};
use serde::{Deserialize, Serialize};

use super::units::UnitSystem;
use crate::error::ConfigError;

/// Tunables for one measuring session. Every field is optional in JSON and
/// falls back to the shared constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub vertex_snap_radius: f32,
    pub edge_snap_radius: f32,
    pub preview_smoothing: f32,
    pub reticle_position_lerp: f32,
    pub reticle_rotation_slerp: f32,
    pub reticle_fallback_distance: f32,
    pub min_hit_distance: f32,
    pub max_hit_distance: f32,
    pub stale_anchor_frames: u32,
    pub units: UnitSystem,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            vertex_snap_radius: VERTEX_SNAP_RADIUS,
            edge_snap_radius: EDGE_SNAP_RADIUS,
            preview_smoothing: PREVIEW_SMOOTHING,
            reticle_position_lerp: RETICLE_POSITION_LERP,
            reticle_rotation_slerp: RETICLE_ROTATION_SLERP,
            reticle_fallback_distance: RETICLE_FALLBACK_DISTANCE,
            min_hit_distance: MIN_HIT_DISTANCE,
            max_hit_distance: MAX_HIT_DISTANCE,
            stale_anchor_frames: STALE_ANCHOR_FRAMES,
            units: UnitSystem::Metric,
        }
    }
}

impl MeasureConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("vertex_snap_radius", self.vertex_snap_radius),
            ("edge_snap_radius", self.edge_snap_radius),
            ("reticle_fallback_distance", self.reticle_fallback_distance),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }

        for (field, value) in [
            ("preview_smoothing", self.preview_smoothing),
            ("reticle_position_lerp", self.reticle_position_lerp),
            ("reticle_rotation_slerp", self.reticle_rotation_slerp),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }

        if self.stale_anchor_frames == 0 {
            return Err(ConfigError::OutOfRange {
                field: "stale_anchor_frames",
                value: 0.0,
            });
        }

        if !(self.min_hit_distance >= 0.0 && self.min_hit_distance < self.max_hit_distance) {
            return Err(ConfigError::InvalidRange {
                min: self.min_hit_distance,
                max: self.max_hit_distance,
            });
        }

        Ok(())
    }
}
