//! In-memory tracking backend.
//!
//! Stands in for the device runtime on desktop and in tests: the camera pose
//! and hit candidates are scripted, anchors can be drifted, lost and restored
//! to exercise drift correction.

use std::collections::HashMap;

use bevy::math::{Quat, Vec2, Vec3};

use super::pose::Pose;
use super::tracking::{
    AnchorHandle, AnchorProvider, HitCandidate, HitKind, TrackingError, TrackingProvider,
    TrackingState,
};

#[derive(Debug, Clone, Copy)]
struct SimAnchor {
    pose: Pose,
    lost: bool,
}

#[derive(Debug)]
pub struct SimulatedTracking {
    camera: Pose,
    state: TrackingState,
    hits: Vec<HitCandidate>,
    anchors: HashMap<AnchorHandle, SimAnchor>,
    next_anchor: u64,
    released: Vec<AnchorHandle>,
    reject_anchors: bool,
}

impl Default for SimulatedTracking {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTracking {
    /// Camera held 1.5 m above the origin, 1 m back, pitched toward the floor.
    pub fn new() -> Self {
        Self {
            camera: Pose::new(Vec3::new(0.0, 1.5, 1.0), Quat::from_rotation_x(-0.6)),
            state: TrackingState::Tracking,
            hits: Vec::new(),
            anchors: HashMap::new(),
            next_anchor: 1,
            released: Vec::new(),
            reject_anchors: false,
        }
    }

    pub fn set_camera_pose(&mut self, pose: Pose) {
        self.camera = pose;
    }

    pub fn set_tracking_state(&mut self, state: TrackingState) {
        self.state = state;
    }

    pub fn set_hits(&mut self, hits: Vec<HitCandidate>) {
        self.hits = hits;
    }

    /// Single plane-interior hit at `position`.
    pub fn aim_at(&mut self, position: Vec3) {
        self.hits = vec![HitCandidate::new(
            HitKind::PlaneInterior,
            Pose::from_translation(position),
        )];
    }

    pub fn clear_hits(&mut self) {
        self.hits.clear();
    }

    pub fn reject_new_anchors(&mut self, reject: bool) {
        self.reject_anchors = reject;
    }

    pub fn drift_anchor(&mut self, handle: AnchorHandle, offset: Vec3) {
        if let Some(anchor) = self.anchors.get_mut(&handle) {
            anchor.pose.translation += offset;
        }
    }

    /// Shift every live anchor, as a map-wide correction would.
    pub fn drift_all(&mut self, offset: Vec3) {
        for anchor in self.anchors.values_mut() {
            anchor.pose.translation += offset;
        }
    }

    pub fn lose_anchor(&mut self, handle: AnchorHandle) {
        if let Some(anchor) = self.anchors.get_mut(&handle) {
            anchor.lost = true;
        }
    }

    pub fn restore_anchor(&mut self, handle: AnchorHandle) {
        if let Some(anchor) = self.anchors.get_mut(&handle) {
            anchor.lost = false;
        }
    }

    pub fn live_anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn released(&self) -> &[AnchorHandle] {
        &self.released
    }
}

impl AnchorProvider for SimulatedTracking {
    fn create_anchor(&mut self, pose: Pose) -> Result<AnchorHandle, TrackingError> {
        if self.state != TrackingState::Tracking {
            return Err(TrackingError::NotTracking);
        }
        if self.reject_anchors {
            return Err(TrackingError::AnchorRejected(
                "simulated anchor budget exhausted".to_string(),
            ));
        }

        let handle = AnchorHandle(self.next_anchor);
        self.next_anchor += 1;
        self.anchors.insert(handle, SimAnchor { pose, lost: false });
        Ok(handle)
    }

    fn release_anchor(&mut self, handle: AnchorHandle) {
        if self.anchors.remove(&handle).is_some() {
            self.released.push(handle);
        }
    }

    fn anchor_pose(&self, handle: AnchorHandle) -> Option<Pose> {
        self.anchors
            .get(&handle)
            .filter(|anchor| !anchor.lost)
            .map(|anchor| anchor.pose)
    }
}

impl TrackingProvider for SimulatedTracking {
    fn camera_pose(&self) -> Pose {
        self.camera
    }

    fn tracking_state(&self) -> TrackingState {
        self.state
    }

    fn hit_test(&self, _screen: Vec2) -> Vec<HitCandidate> {
        if self.state != TrackingState::Tracking {
            return Vec::new();
        }
        self.hits.clone()
    }
}
