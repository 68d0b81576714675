//! Common simulation types and data structures

use crate::core::{Coordinate, BATTERY_DECREMENT_PER_TICK, FULL_BATTERY_PERCENT};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraversalState {
    /// No route loaded, or a route loaded but not yet started
    Idle,
    /// Advancing on every tick
    Running,
    /// Cursor reached the final waypoint
    Completed,
    /// Halted by the operator before completion
    Stopped,
}

impl TraversalState {
    pub fn is_running(&self) -> bool {
        matches!(self, TraversalState::Running)
    }
}

impl fmt::Display for TraversalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraversalState::Idle => write!(f, "idle"),
            TraversalState::Running => write!(f, "running"),
            TraversalState::Completed => write!(f, "completed"),
            TraversalState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Complete simulation state.
///
/// Replaced as a whole on every transition, so observers never see a
/// position that disagrees with its distance or battery reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Current lifecycle state
    pub traversal: TraversalState,
    /// Index of the waypoint the drone is at
    pub cursor_index: usize,
    /// Drone position, `None` until the first start
    pub current_position: Option<Coordinate>,
    /// Remaining battery charge (%)
    pub battery_percent: f64,
    /// Great-circle distance between the drone and the origin (km)
    pub distance_from_origin_km: f64,
    /// Whether the drone is flying
    pub is_active: bool,
    /// Ticks applied since the route was loaded
    pub ticks_elapsed: u64,
}

impl SimulationState {
    /// Fresh state for a newly loaded route
    pub fn initial(battery_percent: f64) -> Self {
        Self {
            traversal: TraversalState::Idle,
            cursor_index: 0,
            current_position: None,
            battery_percent,
            distance_from_origin_km: 0.0,
            is_active: false,
            ticks_elapsed: 0,
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::initial(FULL_BATTERY_PERCENT)
    }
}

/// Parameters of the traversal simulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Battery charge of a freshly loaded drone (%)
    pub initial_battery_percent: f64,
    /// Battery drained per tick, independent of the leg length (%)
    pub battery_decrement_per_tick: f64,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            initial_battery_percent: FULL_BATTERY_PERCENT,
            battery_decrement_per_tick: BATTERY_DECREMENT_PER_TICK,
        }
    }
}

impl TraversalConfig {
    /// Battery charge after `ticks` ticks, clamped at zero
    pub fn battery_after(&self, ticks: u64) -> f64 {
        (self.initial_battery_percent - ticks as f64 * self.battery_decrement_per_tick).max(0.0)
    }
}
