pub mod coordinate_system;
pub mod measure_settings;
pub mod render_settings;
