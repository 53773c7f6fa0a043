/// Queue serialising user commands onto the frame loop.
pub mod commands;
/// Session tunables loaded from JSON.
pub mod config;
/// Vector and quaternion helpers: projection, interpolation, alignment.
pub mod geometry;
/// Raw hit selection policy.
pub mod hit_selection;
pub mod pose;
/// Per-frame orchestration of classifier, graph and reticle.
pub mod session;
/// Scripted tracking backend for desktop runs and tests.
pub mod simulated;
pub mod snapshot;
pub mod status;
/// Interface to the device tracking runtime.
pub mod tracking;
pub mod units;
