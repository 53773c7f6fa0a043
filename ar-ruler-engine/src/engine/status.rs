use serde::{Deserialize, Serialize};

use super::units::{UnitSystem, format_distance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    PointAdded,
    Undone,
    Finished,
    Cleared,
    UnitsChanged,
}

/// Summary pushed to the UI after every state-changing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub kind: StatusKind,
    /// Open chain total, or the archived chain's total for `Finished`.
    pub total_meters: f32,
    pub open_segments: usize,
    pub completed_chains: usize,
    pub message: String,
}

impl StatusUpdate {
    pub fn new(
        kind: StatusKind,
        total_meters: f32,
        open_segments: usize,
        completed_chains: usize,
        units: UnitSystem,
    ) -> Self {
        let total = format_distance(total_meters, units);
        let message = match kind {
            StatusKind::PointAdded | StatusKind::Undone => format!("Total: {total}"),
            StatusKind::Finished => format!("Measurement saved: {total}"),
            StatusKind::Cleared => "Measurements cleared".to_string(),
            StatusKind::UnitsChanged => format!("Units: {}", units.as_str()),
        };
        Self {
            kind,
            total_meters,
            open_segments,
            completed_chains,
            message,
        }
    }
}
