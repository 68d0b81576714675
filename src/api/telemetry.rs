//! Display-ready telemetry
//!
//! Projects raw `SimulationState` into the strings the dashboard shows and
//! renders them as a text panel or JSON.

use crate::api::types::{SimulationState, TraversalState};
use crate::core::LOW_BATTERY_THRESHOLD_PERCENT;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status shown next to the deploy/recall button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusLabel {
    Ready,
    Active,
}

impl From<TraversalState> for StatusLabel {
    fn from(state: TraversalState) -> Self {
        match state {
            TraversalState::Running => StatusLabel::Active,
            TraversalState::Idle | TraversalState::Stopped | TraversalState::Completed => StatusLabel::Ready,
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLabel::Ready => write!(f, "Ready"),
            StatusLabel::Active => write!(f, "Active"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayTelemetry {
    /// Battery charge with one decimal, e.g. `"99.9"`
    pub battery_label: String,
    /// Distance from the origin in km with two decimals, e.g. `"1.21"`
    pub distance_label: String,
    pub status_label: StatusLabel,
    /// Battery is below the warning threshold
    pub battery_low: bool,
}

/// Project a state with the default low-battery threshold
pub fn project(state: &SimulationState) -> DisplayTelemetry {
    TelemetryProjector::default().project(state)
}

/// Maps simulation state to display telemetry
#[derive(Debug, Clone, Copy)]
pub struct TelemetryProjector {
    pub low_battery_threshold_percent: f64,
}

impl Default for TelemetryProjector {
    fn default() -> Self {
        Self {
            low_battery_threshold_percent: LOW_BATTERY_THRESHOLD_PERCENT,
        }
    }
}

impl TelemetryProjector {
    pub fn new(low_battery_threshold_percent: f64) -> Self {
        Self {
            low_battery_threshold_percent,
        }
    }

    pub fn project(&self, state: &SimulationState) -> DisplayTelemetry {
        let battery = state.battery_percent.clamp(0.0, 100.0);
        DisplayTelemetry {
            battery_label: format!("{:.1}", battery),
            distance_label: format!("{:.2}", state.distance_from_origin_km.max(0.0)),
            status_label: state.traversal.into(),
            battery_low: battery < self.low_battery_threshold_percent,
        }
    }
}

/// Renders telemetry for terminals and logs
#[derive(Debug, Clone, Default)]
pub struct TelemetryFormatter {
    /// Single-line output
    pub compact: bool,
}

impl TelemetryFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self { compact: true }
    }

    pub fn format_text(&self, telemetry: &DisplayTelemetry) -> String {
        let low = if telemetry.battery_low { " (LOW)" } else { "" };
        if self.compact {
            format!(
                "Battery: {}%{} | Range: {} km | Status: {}",
                telemetry.battery_label, low, telemetry.distance_label, telemetry.status_label
            )
        } else {
            let mut output = String::from("Drone Status\n");
            output.push_str(&format!("  Battery: {}%{}\n", telemetry.battery_label, low));
            output.push_str(&format!("  Range:   {} km\n", telemetry.distance_label));
            output.push_str(&format!("  Status:  {}\n", telemetry.status_label));
            output
        }
    }

    pub fn format_json(&self, telemetry: &DisplayTelemetry) -> Result<String, serde_json::Error> {
        if self.compact {
            serde_json::to_string(telemetry)
        } else {
            serde_json::to_string_pretty(telemetry)
        }
    }
}
