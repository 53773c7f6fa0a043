//! Picks the one raw hit the classifier sees each frame.

use super::pose::Pose;
use super::tracking::{HitCandidate, HitKind};

/// Chooses a raw hit from the ranked candidates of a frame.
pub trait HitSelector {
    fn select(&self, camera: &Pose, candidates: &[HitCandidate]) -> Option<Pose>;
}

/// Default policy: range-gate every candidate, then prefer the most reliable
/// kind, keeping the runtime's ranking among equals.
#[derive(Debug, Clone)]
pub struct RankedHitSelector {
    pub min_distance: f32,
    pub max_distance: f32,
    pub priority: Vec<HitKind>,
}

impl RankedHitSelector {
    pub fn new(min_distance: f32, max_distance: f32) -> Self {
        Self {
            min_distance,
            max_distance,
            priority: vec![
                HitKind::PlaneInterior,
                HitKind::DepthPoint,
                HitKind::FeaturePoint,
                HitKind::PlaneExterior,
            ],
        }
    }

    fn rank(&self, kind: HitKind) -> Option<usize> {
        self.priority.iter().position(|k| *k == kind)
    }
}

impl HitSelector for RankedHitSelector {
    fn select(&self, camera: &Pose, candidates: &[HitCandidate]) -> Option<Pose> {
        candidates
            .iter()
            .enumerate()
            .filter(|(_, hit)| {
                let range = hit.pose.translation.distance(camera.translation);
                range >= self.min_distance && range <= self.max_distance
            })
            .filter_map(|(order, hit)| self.rank(hit.kind).map(|rank| (rank, order, hit)))
            .min_by_key(|(rank, order, _)| (*rank, *order))
            .map(|(_, _, hit)| hit.pose)
    }
}
