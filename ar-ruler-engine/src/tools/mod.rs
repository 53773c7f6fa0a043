//! The measure tool.
//!
//! ## Workflow
//!
//! 1. Each frame the raw hit is classified against the open measurement
//! 2. The reticle eases toward the classified hit
//! 3. Adding a point commits the hit the reticle shows
//! 4. Finishing archives the measurement and starts a fresh one
//!
//! ## Snapping
//!
//! ```text
//! raw hit
//!   ├─> within vertex radius of an open-chain vertex? -> SnappedVertex
//!   ├─> within edge radius of an open-chain segment?  -> SnappedEdge
//!   └─> otherwise                                     -> Surface
//! ```
//!
//! Finished measurements never offer snap targets, so a new measurement
//! cannot silently attach to an old one.

/// Vertex/edge/surface classification of the aim point.
pub mod hit_classifier;

/// Vertices, segments, chains and the live preview.
pub mod measure;

/// Smoothed aim indicator with snap feedback.
pub mod reticle;
