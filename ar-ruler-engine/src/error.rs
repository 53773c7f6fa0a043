//! Error types for measurement operations.
//!
//! None of these are fatal. The session logs them and carries on with the
//! next frame.

use thiserror::Error;

use crate::engine::tracking::TrackingError;

pub type MeasureResult<T> = Result<T, MeasureError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeasureError {
    /// No valid surface under the aim point.
    #[error("no surface under the aim point")]
    NoHit,

    /// Snapped onto the vertex the chain already ends at.
    #[error("point coincides with the previous vertex")]
    DuplicatePoint,

    #[error("anchor unavailable: {0}")]
    Anchor(#[from] TrackingError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f32 },

    #[error("min_hit_distance ({min}) must be below max_hit_distance ({max})")]
    InvalidRange { min: f32, max: f32 },
}
