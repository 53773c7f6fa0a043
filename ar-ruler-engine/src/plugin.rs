//! Bevy integration: runs the measuring session once per `Update` and bridges
//! it to the RPC queues.

use bevy::prelude::*;

use crate::engine::commands::MeasureCommand;
use crate::engine::config::MeasureConfig;
use crate::engine::session::Session;
use crate::engine::snapshot::FrameSnapshot;
use crate::engine::tracking::TrackingProvider;
use crate::error::ConfigError;
use crate::rpc::web_rpc::{
    RpcInbox, RpcOutbox, WebRpcInterface, handle_raw_message, publish_frame,
};
use crate::tools::hit_classifier::SnapTarget;

/// The device tracking runtime feeding the session.
#[derive(Resource)]
pub struct TrackingBackend(pub Box<dyn TrackingProvider + Send + Sync>);

#[derive(Resource)]
pub struct MeasureSession(pub Session);

/// Snapshot of the most recent frame, for render and UI systems.
#[derive(Resource, Default)]
pub struct LatestSnapshot(pub Option<FrameSnapshot>);

/// In-app command source (buttons, gestures).
#[derive(Event, Debug, Clone, Copy)]
pub struct MeasureCommandEvent(pub MeasureCommand);

/// Fired once when the reticle snaps; drive haptics from this.
#[derive(Event, Debug, Clone, Copy)]
pub struct SnapFeedbackEvent {
    pub target: SnapTarget,
}

#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

#[derive(Default)]
pub struct ArRulerPlugin {
    pub config: MeasureConfig,
}

impl ArRulerPlugin {
    pub fn new(config: MeasureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Plugin for ArRulerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(MeasureSession(Session::new(self.config.clone())))
            .init_resource::<LatestSnapshot>()
            .init_resource::<WebRpcInterface>()
            .init_resource::<RpcInbox>()
            .init_resource::<RpcOutbox>()
            .add_event::<IncomingRpcMessage>()
            .add_event::<MeasureCommandEvent>()
            .add_event::<SnapFeedbackEvent>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    forward_command_events,
                    measure_frame_system,
                    publish_frame_system,
                    send_outgoing_messages,
                )
                    .chain(),
            );
    }
}

fn process_incoming_messages(
    inbox: Res<RpcInbox>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    for content in inbox.0.take() {
        message_events.write(IncomingRpcMessage { content });
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    session: Res<MeasureSession>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in events.read() {
        if let Some(response) = handle_raw_message(&event.content, &session.0) {
            rpc_interface.queue_response(response);
        }
    }
}

fn forward_command_events(
    mut events: EventReader<MeasureCommandEvent>,
    session: Res<MeasureSession>,
) {
    let sender = session.0.command_sender();
    for event in events.read() {
        sender.send(event.0);
    }
}

fn measure_frame_system(
    mut session: ResMut<MeasureSession>,
    backend: Option<ResMut<TrackingBackend>>,
    mut latest: ResMut<LatestSnapshot>,
) {
    let Some(mut backend) = backend else {
        return;
    };
    let snapshot = session.0.tick(backend.0.as_mut());
    latest.0 = Some(snapshot);
}

fn publish_frame_system(
    latest: Res<LatestSnapshot>,
    session: Res<MeasureSession>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut feedback: EventWriter<SnapFeedbackEvent>,
    mut last_warning: Local<bool>,
) {
    if !latest.is_changed() {
        return;
    }
    let Some(snapshot) = latest.0.as_ref() else {
        return;
    };

    publish_frame(
        &mut rpc_interface,
        snapshot,
        session.0.units(),
        &mut last_warning,
    );
    if let Some(target) = snapshot.snap_feedback {
        feedback.write(SnapFeedbackEvent { target });
    }
}

fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>, outbox: Res<RpcOutbox>) {
    rpc_interface.flush_into(&outbox);
}
