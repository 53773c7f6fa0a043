//! Turns the frame's raw hit into a snap decision.
//!
//! Candidates come only from the open chain. Vertex snapping is tested before
//! edge snapping, and the first match wins.

use bevy::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::measure::{ChainId, VertexId};
use crate::engine::geometry::{distance, project_point_on_segment};
use crate::engine::pose::Pose;

/// Open-chain vertex offered as a snap target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapVertex {
    pub id: VertexId,
    pub position: Vec3,
}

/// Open-chain segment offered as a snap target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSegment {
    pub chain: ChainId,
    pub index: usize,
    pub start: Vec3,
    pub end: Vec3,
}

/// What the renderer should highlight for the current snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapTarget {
    Vertex(VertexId),
    Edge { chain: ChainId, index: usize },
}

/// Per-frame classification of the aim point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ClassifiedHit {
    #[default]
    None,
    /// Free surface tracking.
    Surface(Pose),
    /// Locked onto an existing vertex. `position` is the vertex position at
    /// classification time, `rotation` comes from the raw hit.
    SnappedVertex {
        id: VertexId,
        position: Vec3,
        rotation: Quat,
        distance: f32,
    },
    /// Locked onto an existing segment. `position` is the projection of the raw
    /// hit onto the segment.
    SnappedEdge {
        chain: ChainId,
        index: usize,
        position: Vec3,
        rotation: Quat,
        distance: f32,
    },
}

impl ClassifiedHit {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_snapped(&self) -> bool {
        matches!(self, Self::SnappedVertex { .. } | Self::SnappedEdge { .. })
    }

    pub fn position(&self) -> Option<Vec3> {
        self.resolved_pose().map(|pose| pose.translation)
    }

    /// Pose a new vertex or the reticle should take for this hit.
    pub fn resolved_pose(&self) -> Option<Pose> {
        match *self {
            Self::None => None,
            Self::Surface(pose) => Some(pose),
            Self::SnappedVertex {
                position, rotation, ..
            }
            | Self::SnappedEdge {
                position, rotation, ..
            } => Some(Pose::new(position, rotation)),
        }
    }

    pub fn snap_target(&self) -> Option<SnapTarget> {
        match *self {
            Self::SnappedVertex { id, .. } => Some(SnapTarget::Vertex(id)),
            Self::SnappedEdge { chain, index, .. } => Some(SnapTarget::Edge { chain, index }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitClassifier {
    pub vertex_snap_radius: f32,
    pub edge_snap_radius: f32,
}

impl HitClassifier {
    pub fn new(vertex_snap_radius: f32, edge_snap_radius: f32) -> Self {
        Self {
            vertex_snap_radius,
            edge_snap_radius,
        }
    }

    pub fn classify(
        &self,
        raw_hit: Option<Pose>,
        vertices: &[SnapVertex],
        segments: &[SnapSegment],
    ) -> ClassifiedHit {
        let Some(raw) = raw_hit else {
            return ClassifiedHit::None;
        };
        if vertices.is_empty() {
            return ClassifiedHit::Surface(raw);
        }

        let aim = raw.translation;

        let nearest_vertex = vertices
            .iter()
            .map(|v| (v, distance(aim, v.position)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((vertex, dist)) = nearest_vertex {
            if dist < self.vertex_snap_radius {
                return ClassifiedHit::SnappedVertex {
                    id: vertex.id,
                    position: vertex.position,
                    rotation: raw.rotation,
                    distance: dist,
                };
            }
        }

        let nearest_edge = segments
            .iter()
            .map(|s| {
                let projected = project_point_on_segment(aim, s.start, s.end);
                (s, projected, distance(aim, projected))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2));
        if let Some((segment, projected, dist)) = nearest_edge {
            if dist < self.edge_snap_radius {
                return ClassifiedHit::SnappedEdge {
                    chain: segment.chain,
                    index: segment.index,
                    position: projected,
                    rotation: raw.rotation,
                    distance: dist,
                };
            }
        }

        ClassifiedHit::Surface(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn classifier() -> HitClassifier {
        HitClassifier::new(0.05, 0.03)
    }

    fn vertex(id: u32, x: f32, y: f32, z: f32) -> SnapVertex {
        SnapVertex {
            id: VertexId(id),
            position: Vec3::new(x, y, z),
        }
    }

    fn segment(index: usize, a: Vec3, b: Vec3) -> SnapSegment {
        SnapSegment {
            chain: ChainId(0),
            index,
            start: a,
            end: b,
        }
    }

    fn at(x: f32, y: f32, z: f32) -> Option<Pose> {
        Some(Pose::from_translation(Vec3::new(x, y, z)))
    }

    #[test]
    fn absent_hit_is_none() {
        let hit = classifier().classify(None, &[vertex(0, 0.0, 0.0, 0.0)], &[]);
        assert_eq!(hit, ClassifiedHit::None);
        assert!(hit.resolved_pose().is_none());
    }

    #[test]
    fn no_vertices_means_surface() {
        let hit = classifier().classify(at(0.0, 0.0, 0.0), &[], &[]);
        assert!(matches!(hit, ClassifiedHit::Surface(_)));
    }

    #[test]
    fn snaps_to_nearby_vertex() {
        let hit = classifier().classify(at(0.02, 0.0, 0.0), &[vertex(0, 0.0, 0.0, 0.0)], &[]);
        match hit {
            ClassifiedHit::SnappedVertex {
                id,
                position,
                distance,
                ..
            } => {
                assert_eq!(id, VertexId(0));
                assert_eq!(position, Vec3::ZERO);
                assert_relative_eq!(distance, 0.02, epsilon = 1e-6);
            }
            other => panic!("expected vertex snap, got {other:?}"),
        }
        assert_eq!(hit.snap_target(), Some(SnapTarget::Vertex(VertexId(0))));
    }

    #[test]
    fn picks_closest_vertex() {
        let vertices = [vertex(0, 0.0, 0.0, 0.0), vertex(1, 0.05, 0.0, 0.0)];
        let hit = classifier().classify(at(0.03, 0.0, 0.0), &vertices, &[]);
        assert_eq!(hit.snap_target(), Some(SnapTarget::Vertex(VertexId(1))));
    }

    #[test]
    fn vertex_snap_beats_edge_snap() {
        let a = Vec3::ZERO;
        let b = Vec3::new(1.0, 0.0, 0.0);
        let vertices = [vertex(0, 0.0, 0.0, 0.0), vertex(1, 1.0, 0.0, 0.0)];
        // 1 cm from the edge and 4 cm from vertex 0.
        let hit = classifier().classify(
            at(0.0387, 0.01, 0.0),
            &vertices,
            &[segment(0, a, b)],
        );
        assert!(matches!(hit, ClassifiedHit::SnappedVertex { .. }));
    }

    #[test]
    fn snaps_to_edge_projection() {
        let vertices = [vertex(0, 0.0, 0.0, 0.0), vertex(1, 1.0, 0.0, 0.0)];
        let segments = [segment(0, vertices[0].position, vertices[1].position)];
        let hit = classifier().classify(at(0.5, 0.02, 0.0), &vertices, &segments);
        match hit {
            ClassifiedHit::SnappedEdge {
                index,
                position,
                distance,
                ..
            } => {
                assert_eq!(index, 0);
                assert_relative_eq!(position.x, 0.5, epsilon = 1e-6);
                assert_relative_eq!(position.y, 0.0, epsilon = 1e-6);
                assert_relative_eq!(distance, 0.02, epsilon = 1e-6);
            }
            other => panic!("expected edge snap, got {other:?}"),
        }
    }

    #[test]
    fn far_from_everything_is_surface() {
        let vertices = [vertex(0, 0.0, 0.0, 0.0), vertex(1, 1.0, 0.0, 0.0)];
        let segments = [segment(0, vertices[0].position, vertices[1].position)];
        let hit = classifier().classify(at(0.5, 0.2, 0.0), &vertices, &segments);
        assert!(matches!(hit, ClassifiedHit::Surface(_)));
        assert!(hit.snap_target().is_none());
    }

    #[test]
    fn degenerate_segment_does_not_produce_nan() {
        let p = Vec3::new(2.0, 0.0, 0.0);
        let vertices = [vertex(0, 0.0, 0.0, 0.0)];
        let segments = [segment(0, p, p)];
        let hit = classifier().classify(at(2.01, 0.0, 0.0), &vertices, &segments);
        match hit {
            ClassifiedHit::SnappedEdge { position, .. } => assert_eq!(position, p),
            other => panic!("expected edge snap, got {other:?}"),
        }
    }
}
