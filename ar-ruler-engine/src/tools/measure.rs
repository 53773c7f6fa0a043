//! Measurement graph: placed vertices, committed segments, chains and the
//! rubber-band preview.
//!
//! Vertex positions are never trusted beyond one frame. `refresh_per_frame`
//! re-reads every anchor from the tracking runtime and rebuilds segment
//! lengths, midpoints and orientations from the fresh positions.

use bevy::log::{debug, info, warn};
use bevy::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::hit_classifier::{ClassifiedHit, SnapSegment, SnapVertex};
use crate::engine::geometry::{distance, midpoint, rotation_aligned_to};
use crate::engine::tracking::{AnchorHandle, AnchorProvider};
use crate::error::{MeasureError, MeasureResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub anchor: AnchorHandle,
    /// Last resolved world position.
    pub position: Vec3,
    /// Consecutive frames the anchor could not be resolved.
    pub stale_frames: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: VertexId,
    pub end: VertexId,
    pub length: f32,
    /// Label anchor point.
    pub midpoint: Vec3,
    pub rotation: Quat,
}

impl Segment {
    fn between(start: (VertexId, Vec3), end: (VertexId, Vec3)) -> Self {
        let mut segment = Self {
            start: start.0,
            end: end.0,
            length: 0.0,
            midpoint: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        };
        segment.update(start.1, end.1);
        segment
    }

    fn update(&mut self, a: Vec3, b: Vec3) {
        self.length = distance(a, b);
        self.midpoint = midpoint(a, b);
        self.rotation = rotation_aligned_to(b - a);
    }
}

/// One continuous measurement walk. `points` may repeat a vertex when the user
/// snapped back onto it, and always holds exactly one more entry than
/// `segments` unless empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: ChainId,
    pub points: Vec<VertexId>,
    pub segments: Vec<Segment>,
}

impl Chain {
    fn new(id: ChainId) -> Self {
        Self {
            id,
            points: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<VertexId> {
        self.points.last().copied()
    }

    pub fn total_length(&self) -> f32 {
        self.segments.iter().fold(0.0, |acc, s| acc + s.length)
    }
}

/// Uncommitted segment from the last vertex to the aim point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LivePreview {
    pub start: Vec3,
    pub end: Vec3,
    pub midpoint: Vec3,
    /// Exponentially smoothed distance for display.
    pub distance: f32,
    pub raw_distance: f32,
}

/// Flat export handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSummary {
    pub id: ChainId,
    pub finished: bool,
    pub points: Vec<[f32; 3]>,
    pub segment_lengths: Vec<f32>,
    pub total: f32,
}

#[derive(Debug)]
pub struct MeasurementGraph {
    /// Every live vertex, ordered by id.
    vertices: Vec<Vertex>,
    open: Chain,
    completed: Vec<Chain>,
    live_preview: Option<LivePreview>,
    smoothed_distance: Option<f32>,
    smoothing: f32,
    next_vertex_id: u32,
    next_chain_id: u32,
}

impl MeasurementGraph {
    pub fn new(smoothing: f32) -> Self {
        Self {
            vertices: Vec::new(),
            open: Chain::new(ChainId(0)),
            completed: Vec::new(),
            live_preview: None,
            smoothed_distance: None,
            smoothing,
            next_vertex_id: 0,
            next_chain_id: 1,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices
            .binary_search_by_key(&id, |v| v.id)
            .ok()
            .map(|index| &self.vertices[index])
    }

    pub fn position_of(&self, id: VertexId) -> Option<Vec3> {
        self.vertex(id).map(|v| v.position)
    }

    pub fn open_chain(&self) -> &Chain {
        &self.open
    }

    pub fn completed_chains(&self) -> &[Chain] {
        &self.completed
    }

    /// Completed chains first, then the open one.
    pub fn chains(&self) -> impl Iterator<Item = &Chain> {
        self.completed.iter().chain(std::iter::once(&self.open))
    }

    pub fn live_preview(&self) -> Option<&LivePreview> {
        self.live_preview.as_ref()
    }

    pub fn is_measuring(&self) -> bool {
        !self.open.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn open_total_length(&self) -> f32 {
        self.open.total_length()
    }

    pub fn total_length(&self) -> f32 {
        self.chains().fold(0.0, |acc, chain| acc + chain.total_length())
    }

    /// Distinct vertices of the open chain. Finished chains never contribute.
    pub fn snap_vertices(&self) -> Vec<SnapVertex> {
        let mut out: Vec<SnapVertex> = Vec::with_capacity(self.open.points.len());
        for id in &self.open.points {
            if out.iter().any(|v| v.id == *id) {
                continue;
            }
            if let Some(position) = self.position_of(*id) {
                out.push(SnapVertex { id: *id, position });
            }
        }
        out
    }

    pub fn snap_segments(&self) -> Vec<SnapSegment> {
        self.open
            .segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| {
                Some(SnapSegment {
                    chain: self.open.id,
                    index,
                    start: self.position_of(segment.start)?,
                    end: self.position_of(segment.end)?,
                })
            })
            .collect()
    }

    /// Commit the classified hit as the next vertex of the open chain.
    ///
    /// A vertex snap reuses the existing vertex and its anchor. Any other hit
    /// asks the tracking runtime for a fresh anchor.
    pub fn add_point<A: AnchorProvider + ?Sized>(
        &mut self,
        hit: &ClassifiedHit,
        anchors: &mut A,
    ) -> MeasureResult<VertexId> {
        let id = match *hit {
            ClassifiedHit::None => return Err(MeasureError::NoHit),
            ClassifiedHit::SnappedVertex { id, .. } if self.open.points.contains(&id) => {
                if self.open.last() == Some(id) {
                    return Err(MeasureError::DuplicatePoint);
                }
                id
            }
            _ => {
                let pose = hit.resolved_pose().ok_or(MeasureError::NoHit)?;
                let anchor = anchors.create_anchor(pose)?;
                let id = VertexId(self.next_vertex_id);
                self.next_vertex_id += 1;
                self.vertices.push(Vertex {
                    id,
                    anchor,
                    position: pose.translation,
                    stale_frames: 0,
                });
                id
            }
        };

        if let Some(prev) = self.open.last() {
            if let (Some(a), Some(b)) = (self.position_of(prev), self.position_of(id)) {
                self.open.segments.push(Segment::between((prev, a), (id, b)));
            }
        }
        self.open.points.push(id);
        self.reset_preview();

        info!(
            "[MEASURE] vertex {} committed to chain {} ({} segments)",
            id.0,
            self.open.id.0,
            self.open.segments.len()
        );
        Ok(id)
    }

    /// Remove the last point of the open chain. Returns the removed vertex,
    /// or `None` when the open chain is empty.
    pub fn undo<A: AnchorProvider + ?Sized>(&mut self, anchors: &mut A) -> Option<VertexId> {
        let id = self.open.points.pop()?;
        self.open.segments.pop();

        // A snapped-back vertex is still referenced earlier in the chain.
        if !self.open.points.contains(&id) {
            self.release_vertex(id, anchors);
        }
        self.reset_preview();

        info!("[MEASURE] undo removed vertex {}", id.0);
        Some(id)
    }

    /// Archive the open chain and start a fresh one. Returns the archived
    /// chain id, or `None` when there was no segment to archive.
    pub fn finish_current_measurement<A: AnchorProvider + ?Sized>(
        &mut self,
        anchors: &mut A,
    ) -> Option<ChainId> {
        if self.open.segments.is_empty() {
            // A lone vertex cannot form a measurement; drop it.
            let lone: Vec<VertexId> = self.open.points.drain(..).collect();
            for id in lone {
                self.release_vertex(id, anchors);
            }
            self.reset_preview();
            return None;
        }

        let fresh = Chain::new(ChainId(self.next_chain_id));
        self.next_chain_id += 1;
        let finished = std::mem::replace(&mut self.open, fresh);
        let id = finished.id;

        info!(
            "[MEASURE] chain {} finished: {} segments, {:.3} m",
            id.0,
            finished.segments.len(),
            finished.total_length()
        );
        self.completed.push(finished);
        self.reset_preview();
        Some(id)
    }

    /// Release every anchor and drop all measurement state.
    pub fn clear<A: AnchorProvider + ?Sized>(&mut self, anchors: &mut A) {
        for vertex in self.vertices.drain(..) {
            anchors.release_anchor(vertex.anchor);
        }
        self.open = Chain::new(ChainId(self.next_chain_id));
        self.next_chain_id += 1;
        self.completed.clear();
        self.reset_preview();
        info!("[MEASURE] all measurements cleared");
    }

    /// Pull refined anchor poses and rebuild every segment from them.
    ///
    /// Unresolvable anchors keep their last known position. Returns the
    /// vertices that have been unresolved for at least `stale_after` frames.
    pub fn refresh_per_frame<A: AnchorProvider + ?Sized>(
        &mut self,
        anchors: &A,
        stale_after: u32,
    ) -> Vec<VertexId> {
        let mut stale = Vec::new();
        for vertex in &mut self.vertices {
            match anchors.anchor_pose(vertex.anchor) {
                Some(pose) => {
                    vertex.position = pose.translation;
                    vertex.stale_frames = 0;
                }
                None => {
                    vertex.stale_frames = vertex.stale_frames.saturating_add(1);
                    if vertex.stale_frames == stale_after {
                        warn!(
                            "[MEASURE] anchor for vertex {} unresolved for {} frames",
                            vertex.id.0, stale_after
                        );
                    }
                    if vertex.stale_frames >= stale_after {
                        stale.push(vertex.id);
                    }
                }
            }
        }

        let vertices = &self.vertices;
        for chain in self
            .completed
            .iter_mut()
            .chain(std::iter::once(&mut self.open))
        {
            for segment in &mut chain.segments {
                if let (Some(a), Some(b)) = (
                    lookup(vertices, segment.start),
                    lookup(vertices, segment.end),
                ) {
                    segment.update(a, b);
                }
            }
        }

        if let Some(preview) = self.live_preview.as_mut() {
            if let Some(start) = self.open.last().and_then(|id| lookup(vertices, id)) {
                preview.start = start;
            }
        }

        stale
    }

    /// Update the rubber band from the last committed vertex to the aim point.
    pub fn update_live_preview(&mut self, hit: &ClassifiedHit) {
        let start = self.open.last().and_then(|id| self.position_of(id));
        let (Some(start), Some(end)) = (start, hit.position()) else {
            self.reset_preview();
            return;
        };

        let raw = distance(start, end);
        let smoothed = match self.smoothed_distance {
            Some(s) => s + (raw - s) * self.smoothing,
            None => raw,
        };
        self.smoothed_distance = Some(smoothed);
        self.live_preview = Some(LivePreview {
            start,
            end,
            midpoint: midpoint(start, end),
            distance: smoothed,
            raw_distance: raw,
        });
    }

    pub fn summary(&self) -> Vec<ChainSummary> {
        self.chains()
            .filter(|chain| !chain.is_empty())
            .map(|chain| ChainSummary {
                id: chain.id,
                finished: chain.id != self.open.id,
                points: chain
                    .points
                    .iter()
                    .filter_map(|id| self.position_of(*id))
                    .map(|p| p.to_array())
                    .collect(),
                segment_lengths: chain.segments.iter().map(|s| s.length).collect(),
                total: chain.total_length(),
            })
            .collect()
    }

    fn release_vertex<A: AnchorProvider + ?Sized>(&mut self, id: VertexId, anchors: &mut A) {
        if let Ok(index) = self.vertices.binary_search_by_key(&id, |v| v.id) {
            let vertex = self.vertices.remove(index);
            anchors.release_anchor(vertex.anchor);
            debug!("[MEASURE] released anchor {:?}", vertex.anchor);
        }
    }

    fn reset_preview(&mut self) {
        self.live_preview = None;
        self.smoothed_distance = None;
    }
}

fn lookup(vertices: &[Vertex], id: VertexId) -> Option<Vec3> {
    vertices
        .binary_search_by_key(&id, |v| v.id)
        .ok()
        .map(|index| vertices[index].position)
}
