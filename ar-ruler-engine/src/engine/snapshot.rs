//! Read-only per-frame view for the rendering and UI collaborators.

use bevy::math::{Quat, Vec3};
use constants::render_settings::{
    DRAW_LINE_WIDTH, DRAW_VERTEX_SIZE, MIN_RENDERABLE_SEGMENT_LENGTH, RETICLE_SIZE,
};

use super::pose::Pose;
use super::status::StatusUpdate;
use super::tracking::TrackingState;
use crate::tools::hit_classifier::SnapTarget;
use crate::tools::measure::{ChainId, LivePreview, MeasurementGraph, VertexId};
use crate::tools::reticle::{Reticle, ReticleState};

#[derive(Debug, Clone, PartialEq)]
pub struct VertexView {
    pub id: VertexId,
    pub position: Vec3,
    pub radius: f32,
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentView {
    pub chain: ChainId,
    pub index: usize,
    pub start: Vec3,
    pub end: Vec3,
    pub midpoint: Vec3,
    pub length: f32,
    /// Orients the line primitive from `start` to `end`.
    pub rotation: Quat,
    pub thickness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReticleView {
    pub pose: Pose,
    pub state: ReticleState,
    pub size: f32,
}

impl ReticleView {
    pub(crate) fn of(reticle: &Reticle) -> Self {
        Self {
            pose: reticle.pose(),
            state: reticle.state(),
            size: RETICLE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub tracking_state: TrackingState,
    pub vertices: Vec<VertexView>,
    pub segments: Vec<SegmentView>,
    pub live_preview: Option<LivePreview>,
    pub reticle: ReticleView,
    pub highlight: Option<SnapTarget>,
    pub can_add_point: bool,
    pub open_total_meters: f32,
    pub stale_anchors: Vec<VertexId>,
    pub tracking_warning: bool,
    /// Set only on the frame the reticle enters `Snapped`.
    pub snap_feedback: Option<SnapTarget>,
    pub status_updates: Vec<StatusUpdate>,
}

pub(crate) fn vertex_views(graph: &MeasurementGraph, stale: &[VertexId]) -> Vec<VertexView> {
    graph
        .vertices()
        .iter()
        .map(|v| VertexView {
            id: v.id,
            position: v.position,
            radius: DRAW_VERTEX_SIZE,
            stale: stale.contains(&v.id),
        })
        .collect()
}

/// Committed segments of every chain, minus degenerate ones.
pub(crate) fn segment_views(graph: &MeasurementGraph) -> Vec<SegmentView> {
    let mut out = Vec::new();
    for chain in graph.chains() {
        for (index, segment) in chain.segments.iter().enumerate() {
            if segment.length < MIN_RENDERABLE_SEGMENT_LENGTH {
                continue;
            }
            let (Some(start), Some(end)) = (
                graph.position_of(segment.start),
                graph.position_of(segment.end),
            ) else {
                continue;
            };
            out.push(SegmentView {
                chain: chain.id,
                index,
                start,
                end,
                midpoint: segment.midpoint,
                length: segment.length,
                rotation: segment.rotation,
                thickness: DRAW_LINE_WIDTH,
            });
        }
    }
    out
}
