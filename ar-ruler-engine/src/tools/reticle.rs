//! Aim indicator that eases toward the classified hit.
//!
//! The reticle keeps its own pose, separate from the per-frame classification,
//! and moves a fraction of the way to the target each frame so that noisy hit
//! results do not show as stutter.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use super::hit_classifier::ClassifiedHit;
use crate::engine::geometry::{lerp, slerp};
use crate::engine::pose::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReticleState {
    #[default]
    Searching,
    Tracking,
    Snapped,
}

impl ReticleState {
    pub fn from_hit(hit: &ClassifiedHit) -> Self {
        match hit {
            ClassifiedHit::None => Self::Searching,
            ClassifiedHit::Surface(_) => Self::Tracking,
            ClassifiedHit::SnappedVertex { .. } | ClassifiedHit::SnappedEdge { .. } => {
                Self::Snapped
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reticle {
    state: ReticleState,
    current: Option<Pose>,
    target: Pose,
    position_lerp: f32,
    rotation_slerp: f32,
    fallback_distance: f32,
}

impl Reticle {
    pub fn new(position_lerp: f32, rotation_slerp: f32, fallback_distance: f32) -> Self {
        Self {
            state: ReticleState::Searching,
            current: None,
            target: Pose::IDENTITY,
            position_lerp,
            rotation_slerp,
            fallback_distance,
        }
    }

    pub fn state(&self) -> ReticleState {
        self.state
    }

    /// Displayed pose. Before the first update this is the target.
    pub fn pose(&self) -> Pose {
        self.current.unwrap_or(self.target)
    }

    pub fn target(&self) -> Pose {
        self.target
    }

    /// Advance one frame. Returns `true` only on the frame the reticle enters
    /// `Snapped`, which is when discrete snap feedback should fire.
    pub fn update(&mut self, hit: &ClassifiedHit, camera: &Pose) -> bool {
        let previous = self.state;
        self.state = ReticleState::from_hit(hit);

        self.target = hit
            .resolved_pose()
            .unwrap_or_else(|| self.fallback_pose(camera));

        self.current = Some(match self.current {
            None => self.target,
            Some(current) => Pose::new(
                lerp(current.translation, self.target.translation, self.position_lerp),
                slerp(current.rotation, self.target.rotation, self.rotation_slerp),
            ),
        });

        self.state == ReticleState::Snapped && previous != ReticleState::Snapped
    }

    /// Park the reticle in front of the camera so it never vanishes.
    fn fallback_pose(&self, camera: &Pose) -> Pose {
        let forward: Vec3 = camera.forward();
        Pose::new(
            camera.translation + forward * self.fallback_distance,
            camera.rotation,
        )
    }

    pub fn reset(&mut self) {
        self.state = ReticleState::Searching;
        self.current = None;
    }
}
