//! Display formatting of distances. Stored state is always metres; conversion
//! happens only here, at the UI boundary.

use serde::{Deserialize, Serialize};

const METERS_PER_FOOT: f32 = 0.3048;
const INCHES_PER_FOOT: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "metric" | "m" => Some(Self::Metric),
            "imperial" | "ft" => Some(Self::Imperial),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

/// Small values use the minor unit at one decimal. The unit switches once the
/// rounded minor value reaches one major unit, so "100.0 cm" never shows.
pub fn format_distance(meters: f32, units: UnitSystem) -> String {
    match units {
        UnitSystem::Metric => {
            let cm = round_tenth(meters * 100.0);
            if cm < 100.0 {
                format!("{cm:.1} cm")
            } else {
                format!("{meters:.2} m")
            }
        }
        UnitSystem::Imperial => {
            let feet = meters / METERS_PER_FOOT;
            let inches = round_tenth(feet * INCHES_PER_FOOT);
            if inches < INCHES_PER_FOOT {
                format!("{inches:.1} in")
            } else {
                format!("{feet:.2} ft")
            }
        }
    }
}

fn round_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}
