//! JSON-RPC 2.0 bridge between the measuring engine and the host UI.
//!
//! The host (an Android activity, a desktop shell, a test) exchanges plain
//! JSON strings with the engine through two thread-safe queues:
//!
//! ```text
//! Host UI                                   Engine frame loop
//!    │                                             │
//!    ├─ RpcInbox.push(request) ──────────────────> │
//!    │                                             ├─ handle request
//!    │                                             ├─ queue MeasureCommand
//!    │                                             ├─ tick
//!    │ <──────────── RpcOutbox.take(): responses ──┤
//!    │ <──────── RpcOutbox.take(): notifications ──┤
//! ```
//!
//! ## Request methods
//!
//! - `add_point`: commit the point under the reticle
//! - `undo`: remove the last point of the open measurement
//! - `finish_measurement`: archive the open measurement, start a new one
//! - `clear`: drop every measurement
//! - `set_units`: `{"units": "metric" | "imperial"}`
//! - `get_summary`: flat list of chains with points and segment lengths
//!
//! Commands are queued and applied at the start of the next frame, so the
//! response only confirms that the command was accepted.
//!
//! ## Notifications
//!
//! - `measure_status`: after every state-changing operation
//! - `measure_updated`: live preview distance while measuring
//! - `snap_feedback`: the reticle just snapped onto a vertex or edge
//! - `tracking_warning`: anchors lost or recovered
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32000`: No surface under the aim point

/// JSON-RPC 2.0 message types, queues and request dispatch.
pub mod web_rpc;
