//! Per-frame driver tying tracking input, the hit classifier, the measurement
//! graph and the reticle together.
//!
//! ## Frame procedure
//!
//! ```text
//! tick()
//!   ├─> pull camera pose + ranked hits from the tracking runtime
//!   ├─> select one raw hit (range gate + kind priority)
//!   ├─> drain queued commands (they use last frame's classified hit)
//!   ├─> classify against the open chain
//!   ├─> refresh anchors, update live preview
//!   ├─> ease the reticle
//!   └─> FrameSnapshot
//! ```
//!
//! Commands never re-run a hit test. A placed point is always the hit the
//! reticle was showing when the command was issued.

use bevy::log::{debug, info, warn};
use bevy::math::Vec2;

use super::commands::{CommandSender, MeasureCommand};
use super::config::MeasureConfig;
use super::hit_selection::{HitSelector, RankedHitSelector};
use super::pose::Pose;
use super::snapshot::{FrameSnapshot, ReticleView, segment_views, vertex_views};
use super::status::{StatusKind, StatusUpdate};
use super::tracking::{AnchorProvider, HitCandidate, TrackingProvider, TrackingState};
use super::units::UnitSystem;
use crate::error::{ConfigError, MeasureError, MeasureResult};
use crate::tools::hit_classifier::{ClassifiedHit, HitClassifier};
use crate::tools::measure::{ChainId, ChainSummary, MeasurementGraph, VertexId};
use crate::tools::reticle::Reticle;

type StatusListener = Box<dyn FnMut(&StatusUpdate) + Send + Sync>;

/// Everything the tracking runtime reports for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInput {
    pub camera_pose: Pose,
    pub tracking_state: TrackingState,
    pub candidates: Vec<HitCandidate>,
}

pub struct Session {
    config: MeasureConfig,
    classifier: HitClassifier,
    selector: Box<dyn HitSelector + Send + Sync>,
    graph: MeasurementGraph,
    reticle: Reticle,
    commands: CommandSender,
    listeners: Vec<StatusListener>,
    pending_status: Vec<StatusUpdate>,
    last_hit: ClassifiedHit,
    tracking_state: TrackingState,
    tracking_warning: bool,
    aim_point: Vec2,
    frame: u64,
}

impl Session {
    /// Build a session, falling back to the default config when `config`
    /// fails validation. Use [`Session::try_new`] to surface the error.
    pub fn new(config: MeasureConfig) -> Self {
        match Self::try_new(config) {
            Ok(session) => session,
            Err(err) => {
                warn!("[SESSION] rejected config ({err}), using defaults");
                Self::build(MeasureConfig::default())
            }
        }
    }

    pub fn try_new(config: MeasureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MeasureConfig) -> Self {
        Self {
            classifier: HitClassifier::new(config.vertex_snap_radius, config.edge_snap_radius),
            selector: Box::new(RankedHitSelector::new(
                config.min_hit_distance,
                config.max_hit_distance,
            )),
            graph: MeasurementGraph::new(config.preview_smoothing),
            reticle: Reticle::new(
                config.reticle_position_lerp,
                config.reticle_rotation_slerp,
                config.reticle_fallback_distance,
            ),
            commands: CommandSender::default(),
            listeners: Vec::new(),
            pending_status: Vec::new(),
            last_hit: ClassifiedHit::None,
            tracking_state: TrackingState::Stopped,
            tracking_warning: false,
            aim_point: Vec2::ZERO,
            frame: 0,
            config,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::build(MeasureConfig::from_json(json)?))
    }

    /// Replace the default hit selection policy.
    pub fn with_selector(mut self, selector: impl HitSelector + Send + Sync + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    pub fn graph(&self) -> &MeasurementGraph {
        &self.graph
    }

    pub fn reticle(&self) -> &Reticle {
        &self.reticle
    }

    pub fn last_hit(&self) -> &ClassifiedHit {
        &self.last_hit
    }

    pub fn units(&self) -> UnitSystem {
        self.config.units
    }

    /// Screen position hit-tested each frame.
    pub fn set_aim_point(&mut self, aim_point: Vec2) {
        self.aim_point = aim_point;
    }

    /// Aim at the centre of a viewport of the given pixel size.
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.aim_point = Vec2::new(width, height) * 0.5;
    }

    pub fn command_sender(&self) -> CommandSender {
        self.commands.clone()
    }

    pub fn on_status(&mut self, listener: impl FnMut(&StatusUpdate) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// True when tracking is healthy and the last classified hit would place
    /// a new point. Resting on the chain's last vertex does not count.
    pub fn can_add_point(&self) -> bool {
        if self.tracking_state != TrackingState::Tracking {
            return false;
        }
        match self.last_hit {
            ClassifiedHit::None => false,
            ClassifiedHit::SnappedVertex { id, .. } => self.graph.open_chain().last() != Some(id),
            _ => true,
        }
    }

    pub fn summary(&self) -> Vec<ChainSummary> {
        self.graph.summary()
    }

    /// Commit the most recent classified hit.
    pub fn add_point<A: AnchorProvider + ?Sized>(
        &mut self,
        anchors: &mut A,
    ) -> MeasureResult<VertexId> {
        if self.tracking_state != TrackingState::Tracking {
            return Err(MeasureError::NoHit);
        }
        let hit = self.last_hit;
        let id = self.graph.add_point(&hit, anchors)?;

        // Until the next frame the aim rests on the vertex just placed, so a
        // repeated commit resolves to it and is rejected as a duplicate.
        if let (Some(position), Some(pose)) = (self.graph.position_of(id), hit.resolved_pose()) {
            self.last_hit = ClassifiedHit::SnappedVertex {
                id,
                position,
                rotation: pose.rotation,
                distance: 0.0,
            };
        }

        self.emit(StatusKind::PointAdded, self.graph.open_total_length());
        Ok(id)
    }

    pub fn undo<A: AnchorProvider + ?Sized>(&mut self, anchors: &mut A) -> Option<VertexId> {
        let removed = self.graph.undo(anchors)?;
        // The hit was classified against geometry that no longer exists.
        self.last_hit = ClassifiedHit::None;
        self.emit(StatusKind::Undone, self.graph.open_total_length());
        Some(removed)
    }

    pub fn finish<A: AnchorProvider + ?Sized>(&mut self, anchors: &mut A) -> Option<ChainId> {
        if !self.graph.is_measuring() {
            return None;
        }
        let finished = self.graph.finish_current_measurement(anchors);
        self.last_hit = ClassifiedHit::None;
        let id = finished?;
        let total = self
            .graph
            .completed_chains()
            .last()
            .map(|chain| chain.total_length())
            .unwrap_or(0.0);
        self.emit(StatusKind::Finished, total);
        Some(id)
    }

    pub fn clear<A: AnchorProvider + ?Sized>(&mut self, anchors: &mut A) {
        self.graph.clear(anchors);
        self.last_hit = ClassifiedHit::None;
        self.reticle.reset();
        self.tracking_warning = false;
        self.emit(StatusKind::Cleared, 0.0);
    }

    pub fn set_units(&mut self, units: UnitSystem) {
        if self.config.units == units {
            return;
        }
        self.config.units = units;
        info!("[SESSION] units set to {}", units.as_str());
        self.emit(StatusKind::UnitsChanged, self.graph.open_total_length());
    }

    pub fn apply<A: AnchorProvider + ?Sized>(&mut self, command: MeasureCommand, anchors: &mut A) {
        match command {
            MeasureCommand::AddPoint => {
                if let Err(err) = self.add_point(anchors) {
                    match err {
                        MeasureError::Anchor(_) => warn!("[SESSION] add point failed: {err}"),
                        _ => debug!("[SESSION] add point ignored: {err}"),
                    }
                }
            }
            MeasureCommand::Undo => {
                self.undo(anchors);
            }
            MeasureCommand::Finish => {
                self.finish(anchors);
            }
            MeasureCommand::Clear => self.clear(anchors),
            MeasureCommand::SetUnits(units) => self.set_units(units),
        }
    }

    /// Pull one frame from the tracking runtime and process it.
    pub fn tick<T: TrackingProvider + ?Sized>(&mut self, tracking: &mut T) -> FrameSnapshot {
        let frame = FrameInput {
            camera_pose: tracking.camera_pose(),
            tracking_state: tracking.tracking_state(),
            candidates: tracking.hit_test(self.aim_point),
        };
        self.process_frame(frame, tracking)
    }

    /// Process one frame of already-gathered tracking input.
    pub fn process_frame<A: AnchorProvider + ?Sized>(
        &mut self,
        frame: FrameInput,
        anchors: &mut A,
    ) -> FrameSnapshot {
        self.frame += 1;
        self.tracking_state = frame.tracking_state;

        let raw_hit = match frame.tracking_state {
            TrackingState::Tracking => self.selector.select(&frame.camera_pose, &frame.candidates),
            _ => None,
        };

        for command in self.commands.drain() {
            self.apply(command, anchors);
        }

        let hit = self.classifier.classify(
            raw_hit,
            &self.graph.snap_vertices(),
            &self.graph.snap_segments(),
        );

        let stale = self
            .graph
            .refresh_per_frame(anchors, self.config.stale_anchor_frames);
        self.graph.update_live_preview(&hit);

        let snap_entered = self.reticle.update(&hit, &frame.camera_pose);
        self.last_hit = hit;

        let warning = !stale.is_empty();
        if warning != self.tracking_warning {
            if warning {
                warn!("[SESSION] {} anchors lost, tracking quality degraded", stale.len());
            } else {
                info!("[SESSION] all anchors resolved again");
            }
            self.tracking_warning = warning;
        }

        FrameSnapshot {
            frame: self.frame,
            tracking_state: self.tracking_state,
            vertices: vertex_views(&self.graph, &stale),
            segments: segment_views(&self.graph),
            live_preview: self.graph.live_preview().copied(),
            reticle: ReticleView::of(&self.reticle),
            highlight: hit.snap_target(),
            can_add_point: self.can_add_point(),
            open_total_meters: self.graph.open_total_length(),
            stale_anchors: stale,
            tracking_warning: warning,
            snap_feedback: hit.snap_target().filter(|_| snap_entered),
            status_updates: std::mem::take(&mut self.pending_status),
        }
    }

    fn emit(&mut self, kind: StatusKind, total_meters: f32) {
        let update = StatusUpdate::new(
            kind,
            total_meters,
            self.graph.open_chain().segments.len(),
            self.graph.completed_chains().len(),
            self.config.units,
        );
        info!("[SESSION] {}", update.message);
        for listener in &mut self.listeners {
            listener(&update);
        }
        self.pending_status.push(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::simulated::SimulatedTracking;
    use crate::tools::reticle::ReticleState;
    use approx::assert_relative_eq;
    use bevy::math::Vec3;
    use std::sync::{Arc, Mutex};

    fn session() -> (Session, SimulatedTracking) {
        (Session::new(MeasureConfig::default()), SimulatedTracking::new())
    }

    fn place(session: &mut Session, tracking: &mut SimulatedTracking, at: Vec3) {
        tracking.aim_at(at);
        session.tick(tracking);
        session.add_point(tracking).unwrap();
    }

    #[test]
    fn add_point_uses_last_classified_hit() {
        let (mut session, mut tracking) = session();
        tracking.aim_at(Vec3::ZERO);
        session.tick(&mut tracking);

        // Aim moves after the frame; the commit must not follow it.
        tracking.aim_at(Vec3::new(3.0, 0.0, 0.0));
        let id = session.add_point(&mut tracking).unwrap();
        assert_eq!(session.graph().position_of(id), Some(Vec3::ZERO));
    }

    #[test]
    fn can_add_point_follows_hits_and_tracking() {
        let (mut session, mut tracking) = session();
        assert!(!session.tick(&mut tracking).can_add_point);

        tracking.aim_at(Vec3::ZERO);
        assert!(session.tick(&mut tracking).can_add_point);

        tracking.set_tracking_state(TrackingState::Paused);
        let snapshot = session.tick(&mut tracking);
        assert!(!snapshot.can_add_point);
        assert_eq!(snapshot.reticle.state, ReticleState::Searching);
        assert_eq!(session.add_point(&mut tracking), Err(MeasureError::NoHit));
    }

    #[test]
    fn status_listener_sees_every_operation() {
        let (mut session, mut tracking) = session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        session.on_status(move |update| sink.lock().unwrap().push(update.clone()));

        place(&mut session, &mut tracking, Vec3::ZERO);
        place(&mut session, &mut tracking, Vec3::new(1.0, 0.0, 0.0));
        session.undo(&mut tracking);
        place(&mut session, &mut tracking, Vec3::new(1.0, 0.0, 0.0));
        session.finish(&mut tracking);
        session.clear(&mut tracking);

        let seen = seen.lock().unwrap();
        let kinds: Vec<StatusKind> = seen.iter().map(|u| u.kind).collect();
        assert_eq!(
            kinds,
            vec![
                StatusKind::PointAdded,
                StatusKind::PointAdded,
                StatusKind::Undone,
                StatusKind::PointAdded,
                StatusKind::Finished,
                StatusKind::Cleared,
            ]
        );
        assert_eq!(seen[1].message, "Total: 1.00 m");
        assert_eq!(seen[4].message, "Measurement saved: 1.00 m");
    }

    #[test]
    fn queued_commands_apply_on_next_frame() {
        let (mut session, mut tracking) = session();
        let sender = session.command_sender();

        tracking.aim_at(Vec3::ZERO);
        session.tick(&mut tracking);
        sender.send(MeasureCommand::AddPoint);
        assert!(session.graph().is_empty());

        tracking.aim_at(Vec3::new(0.5, 0.0, 0.0));
        let snapshot = session.tick(&mut tracking);
        assert_eq!(snapshot.vertices.len(), 1);
        assert_eq!(snapshot.vertices[0].position, Vec3::ZERO);
        assert_eq!(snapshot.status_updates.len(), 1);
        let preview = snapshot.live_preview.unwrap();
        assert_eq!(preview.end, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn snap_feedback_only_on_entry() {
        let (mut session, mut tracking) = session();
        place(&mut session, &mut tracking, Vec3::ZERO);
        place(&mut session, &mut tracking, Vec3::new(1.0, 0.0, 0.0));

        tracking.aim_at(Vec3::new(0.5, 0.0, 0.5));
        assert!(session.tick(&mut tracking).snap_feedback.is_none());

        tracking.aim_at(Vec3::new(0.01, 0.0, 0.0));
        let entered = session.tick(&mut tracking);
        assert!(entered.snap_feedback.is_some());
        assert_eq!(entered.highlight, entered.snap_feedback);
        assert_eq!(entered.reticle.state, ReticleState::Snapped);

        let held = session.tick(&mut tracking);
        assert!(held.snap_feedback.is_none());
        assert!(held.highlight.is_some());
    }

    #[test]
    fn stale_anchor_raises_warning_without_deleting() {
        let (mut session, mut tracking) = session();
        place(&mut session, &mut tracking, Vec3::ZERO);
        let anchor = session.graph().vertices()[0].anchor;
        tracking.lose_anchor(anchor);

        let threshold = session.config().stale_anchor_frames;
        let mut snapshot = session.tick(&mut tracking);
        for _ in 1..threshold {
            assert!(!snapshot.tracking_warning);
            snapshot = session.tick(&mut tracking);
        }
        assert!(snapshot.tracking_warning);
        assert_eq!(snapshot.vertices.len(), 1);
        assert!(snapshot.vertices[0].stale);

        tracking.restore_anchor(anchor);
        assert!(!session.tick(&mut tracking).tracking_warning);
    }

    #[test]
    fn repeated_add_before_next_frame_is_a_duplicate() {
        let (mut session, mut tracking) = session();
        place(&mut session, &mut tracking, Vec3::ZERO);

        tracking.aim_at(Vec3::new(1.0, 0.0, 0.0));
        session.tick(&mut tracking);
        session.add_point(&mut tracking).unwrap();
        assert_eq!(
            session.add_point(&mut tracking),
            Err(MeasureError::DuplicatePoint)
        );

        assert_eq!(session.graph().vertices().len(), 2);
        assert_eq!(tracking.live_anchor_count(), 2);
        let segments = &session.graph().open_chain().segments;
        assert_eq!(segments.len(), 1);
        assert_relative_eq!(segments[0].length, 1.0);
    }

    #[test]
    fn queued_double_tap_places_one_point() {
        let (mut session, mut tracking) = session();
        let sender = session.command_sender();
        tracking.aim_at(Vec3::ZERO);
        session.tick(&mut tracking);

        sender.send(MeasureCommand::AddPoint);
        sender.send(MeasureCommand::AddPoint);
        let snapshot = session.tick(&mut tracking);

        assert_eq!(snapshot.vertices.len(), 1);
        assert!(snapshot.segments.is_empty());
        assert_eq!(snapshot.status_updates.len(), 1);
    }

    #[test]
    fn add_after_finish_in_same_batch_waits_for_a_new_hit() {
        let (mut session, mut tracking) = session();
        place(&mut session, &mut tracking, Vec3::ZERO);
        place(&mut session, &mut tracking, Vec3::new(1.0, 0.0, 0.0));

        let sender = session.command_sender();
        sender.send(MeasureCommand::Finish);
        sender.send(MeasureCommand::AddPoint);
        session.tick(&mut tracking);

        assert_eq!(session.graph().completed_chains().len(), 1);
        assert!(session.graph().open_chain().is_empty());
        assert_eq!(session.graph().vertices().len(), 2);
    }

    #[test]
    fn add_after_undo_in_same_batch_ignores_removed_edge() {
        let (mut session, mut tracking) = session();
        place(&mut session, &mut tracking, Vec3::ZERO);
        place(&mut session, &mut tracking, Vec3::new(1.0, 0.0, 0.0));

        tracking.aim_at(Vec3::new(0.5, 0.0, 0.01));
        session.tick(&mut tracking);
        assert!(matches!(session.last_hit(), ClassifiedHit::SnappedEdge { .. }));

        let sender = session.command_sender();
        sender.send(MeasureCommand::Undo);
        sender.send(MeasureCommand::AddPoint);
        session.tick(&mut tracking);

        assert_eq!(session.graph().vertices().len(), 1);
        assert!(session.graph().open_chain().segments.is_empty());
    }

    #[test]
    fn resting_on_last_vertex_disables_add() {
        let (mut session, mut tracking) = session();
        place(&mut session, &mut tracking, Vec3::ZERO);
        assert!(!session.can_add_point());

        let snapshot = session.tick(&mut tracking);
        assert_eq!(snapshot.reticle.state, ReticleState::Snapped);
        assert!(!snapshot.can_add_point);
        assert_eq!(
            session.add_point(&mut tracking),
            Err(MeasureError::DuplicatePoint)
        );

        tracking.aim_at(Vec3::new(0.5, 0.0, 0.0));
        assert!(session.tick(&mut tracking).can_add_point);
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let config = MeasureConfig {
            edge_snap_radius: -1.0,
            ..MeasureConfig::default()
        };
        assert!(matches!(
            Session::try_new(config.clone()),
            Err(ConfigError::OutOfRange { field: "edge_snap_radius", .. })
        ));
        assert_eq!(*Session::new(config).config(), MeasureConfig::default());
    }

    #[test]
    fn first_point_reports_zero_total() {
        let (mut session, mut tracking) = session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        session.on_status(move |update| sink.lock().unwrap().push(update.message.clone()));

        place(&mut session, &mut tracking, Vec3::ZERO);
        assert_eq!(*seen.lock().unwrap(), vec!["Total: 0.0 cm"]);
    }

    #[test]
    fn set_units_changes_status_formatting() {
        let (mut session, mut tracking) = session();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        session.on_status(move |update| sink.lock().unwrap().push(update.message.clone()));

        session.set_units(UnitSystem::Imperial);
        session.set_units(UnitSystem::Imperial);
        place(&mut session, &mut tracking, Vec3::ZERO);
        place(&mut session, &mut tracking, Vec3::new(1.0, 0.0, 0.0));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["Units: imperial", "Total: 0.0 in", "Total: 3.28 ft"]
        );
        // Statuses issued between frames ride along with the next snapshot.
        let snapshot = session.tick(&mut tracking);
        assert_eq!(snapshot.status_updates.len(), 1);
        assert_eq!(snapshot.status_updates[0].kind, StatusKind::PointAdded);
    }
}
