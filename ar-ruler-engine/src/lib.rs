//! Measuring engine for an AR ruler.
//!
//! Consumes camera poses, ranked surface hits and anchor poses from a device
//! tracking runtime, and maintains polylines of measured segments with
//! vertex/edge snapping, drift correction and a smoothed aim reticle.
//!
//! The engine is driven one frame at a time through
//! [`Session::tick`](engine::session::Session::tick), or through
//! [`ArRulerPlugin`](plugin::ArRulerPlugin) inside a Bevy app. Hosts talk to
//! it over JSON-RPC (see [`rpc`]).

pub mod engine;
pub mod error;
pub mod plugin;
pub mod rpc;
pub mod tools;

pub use engine::config::MeasureConfig;
pub use engine::session::{FrameInput, Session};
pub use engine::snapshot::FrameSnapshot;
pub use error::{ConfigError, MeasureError, MeasureResult};
pub use plugin::ArRulerPlugin;
