//! Interface to the device tracking runtime.
//!
//! The engine never performs pose estimation itself. Each frame it pulls the
//! camera pose and ranked hit candidates through [`TrackingProvider`], and it
//! asks [`AnchorProvider`] for the refined pose of every anchor it placed.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pose::Pose;

/// Opaque reference to an anchor owned by the tracking runtime.
///
/// The engine only stores the handle and hands it back for lookups and
/// release. It never owns the refinement lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingState {
    #[default]
    Tracking,
    Paused,
    Stopped,
}

/// Coarse classification of what a hit-test ray struck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    /// Inside the polygon of a detected plane.
    PlaneInterior,
    /// On a detected plane's infinite extension, outside its polygon.
    PlaneExterior,
    DepthPoint,
    FeaturePoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitCandidate {
    pub kind: HitKind,
    pub pose: Pose,
}

impl HitCandidate {
    pub fn new(kind: HitKind, pose: Pose) -> Self {
        Self { kind, pose }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackingError {
    #[error("tracking is not active")]
    NotTracking,

    #[error("anchor rejected: {0}")]
    AnchorRejected(String),
}

pub trait AnchorProvider {
    fn create_anchor(&mut self, pose: Pose) -> Result<AnchorHandle, TrackingError>;

    fn release_anchor(&mut self, handle: AnchorHandle);

    /// Latest refined pose, or `None` when the runtime cannot resolve the
    /// anchor this frame.
    fn anchor_pose(&self, handle: AnchorHandle) -> Option<Pose>;
}

pub trait TrackingProvider: AnchorProvider {
    fn camera_pose(&self) -> Pose;

    fn tracking_state(&self) -> TrackingState;

    /// Hit candidates under a screen position, best first.
    fn hit_test(&self, screen: Vec2) -> Vec<HitCandidate>;
}
