use std::sync::{Arc, Mutex};

use bevy::log::{error, info, warn};
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::engine::commands::MeasureCommand;
use crate::engine::session::Session;
use crate::engine::snapshot::FrameSnapshot;
use crate::engine::units::{UnitSystem, format_distance};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(serde_json::json!({ "method": method })),
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn no_surface() -> Self {
        Self {
            code: -32000,
            message: "No surface under the aim point".to_string(),
            data: None,
        }
    }
}

/// Thread-safe queue of raw JSON strings shared with the host.
#[derive(Debug, Clone, Default)]
pub struct MessageQueue(Arc<Mutex<Vec<String>>>);

impl MessageQueue {
    pub fn push(&self, message: String) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(message);
        }
    }

    pub fn take(&self) -> Vec<String> {
        if let Ok(mut queue) = self.0.lock() {
            std::mem::take(&mut *queue)
        } else {
            Vec::new()
        }
    }
}

/// Requests pushed by the host UI.
#[derive(Resource, Debug, Clone, Default)]
pub struct RpcInbox(pub MessageQueue);

impl RpcInbox {
    /// Queue a raw message, dropping anything that is not JSON-RPC.
    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        if message.contains("jsonrpc") {
            self.0.push(message);
        }
    }
}

/// Serialized responses and notifications awaiting the host.
#[derive(Resource, Debug, Clone, Default)]
pub struct RpcOutbox(pub MessageQueue);

impl RpcOutbox {
    pub fn take(&self) -> Vec<String> {
        self.0.take()
    }
}

/// Resource collecting outgoing messages during a frame.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    pub fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }

    /// Serialize and drain everything queued, notifications first.
    pub fn flush_into(&mut self, outbox: &RpcOutbox) {
        for notification in self.outgoing_notifications.drain(..) {
            push_serialized(outbox, &notification);
        }
        for response in self.outgoing_responses.drain(..) {
            push_serialized(outbox, &response);
        }
    }

    pub fn pending_notifications(&self) -> &[RpcNotification] {
        &self.outgoing_notifications
    }
}

fn push_serialized<T: Serialize>(outbox: &RpcOutbox, message: &T) {
    match serde_json::to_string(message) {
        Ok(json) => outbox.0.push(json),
        Err(e) => error!("Failed to serialize message: {}", e),
    }
}

/// Parse one raw message and dispatch it. Returns the response to queue, if
/// the message was a request with an id.
pub fn handle_raw_message(raw: &str, session: &Session) -> Option<RpcResponse> {
    match serde_json::from_str::<RpcRequest>(raw) {
        Ok(request) => handle_rpc_request(&request, session),
        Err(parse_error) => {
            warn!("Unparseable RPC message: {}", parse_error);
            None
        }
    }
}

/// Handle individual RPC request and generate response based on method.
///
/// Notifications (no id) are executed but never answered.
pub fn handle_rpc_request(request: &RpcRequest, session: &Session) -> Option<RpcResponse> {
    let commands = session.command_sender();

    let result = match request.method.as_str() {
        "add_point" => {
            if session.can_add_point() {
                commands.send(MeasureCommand::AddPoint);
                Ok(serde_json::json!({ "queued": true }))
            } else {
                Err(RpcError::no_surface())
            }
        }
        "undo" => {
            commands.send(MeasureCommand::Undo);
            Ok(serde_json::json!({ "queued": true }))
        }
        "finish_measurement" => {
            commands.send(MeasureCommand::Finish);
            Ok(serde_json::json!({ "queued": true }))
        }
        "clear" => {
            commands.send(MeasureCommand::Clear);
            Ok(serde_json::json!({ "queued": true }))
        }
        "set_units" => handle_set_units(&request.params, session),
        "get_summary" => Ok(serde_json::json!({
            "units": session.units().as_str(),
            "total_meters": session.graph().total_length(),
            "chains": session.summary(),
        })),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            Err(RpcError::method_not_found(&request.method))
        }
    };

    let id = request.id.clone()?;
    Some(match result {
        Ok(value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    })
}

fn handle_set_units(
    params: &serde_json::Value,
    session: &Session,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct SetUnitsParams {
        units: String,
    }

    let parsed = serde_json::from_value::<SetUnitsParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'units' parameter"))?;
    let units = UnitSystem::from_string(&parsed.units)
        .ok_or_else(|| RpcError::invalid_params(&format!("Unknown units: {}", parsed.units)))?;

    session.command_sender().send(MeasureCommand::SetUnits(units));
    info!("Units change queued: {}", units.as_str());

    Ok(serde_json::json!({ "queued": true, "units": units.as_str() }))
}

/// Queue the notifications a frame produced. `last_warning` carries the
/// previously reported tracking warning so only edges are sent.
pub fn publish_frame(
    rpc: &mut WebRpcInterface,
    snapshot: &FrameSnapshot,
    units: UnitSystem,
    last_warning: &mut bool,
) {
    for status in &snapshot.status_updates {
        rpc.send_notification(
            "measure_status",
            serde_json::json!({
                "kind": status.kind,
                "message": status.message,
                "total_meters": status.total_meters,
                "open_segments": status.open_segments,
                "completed_chains": status.completed_chains,
            }),
        );
    }

    if let Some(preview) = &snapshot.live_preview {
        rpc.send_notification(
            "measure_updated",
            serde_json::json!({
                "start": preview.start.to_array(),
                "end": preview.end.to_array(),
                "midpoint": preview.midpoint.to_array(),
                "distance": preview.distance,
                "label": format_distance(preview.distance, units),
            }),
        );
    }

    if let Some(target) = snapshot.snap_feedback {
        rpc.send_notification("snap_feedback", serde_json::json!({ "target": target }));
    }

    if snapshot.tracking_warning != *last_warning {
        rpc.send_notification(
            "tracking_warning",
            serde_json::json!({
                "active": snapshot.tracking_warning,
                "stale_vertices": snapshot.stale_anchors,
            }),
        );
        *last_warning = snapshot.tracking_warning;
    }
}
