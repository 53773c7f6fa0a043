pub const DRAW_LINE_WIDTH: f32 = 0.004;
pub const DRAW_VERTEX_SIZE: f32 = 0.008;
pub const RETICLE_SIZE: f32 = 0.03;

/// Segments shorter than this are degenerate and never reach the renderer.
pub const MIN_RENDERABLE_SEGMENT_LENGTH: f32 = 0.002;
