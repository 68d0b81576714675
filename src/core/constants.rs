//! Physical constants and simulation parameters

use super::types::Coordinate;

/// Mean Earth radius used by the haversine formula (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Polyline coordinates are stored as integers scaled by this factor
pub const POLYLINE_SCALE: f64 = 1e5;

/// Period of the simulation tick (ms)
pub const TICK_PERIOD_MS: u64 = 50;

/// Battery drained per tick, in percentage points
pub const BATTERY_DECREMENT_PER_TICK: f64 = 0.05;

/// Battery charge of a freshly loaded drone (%)
pub const FULL_BATTERY_PERCENT: f64 = 100.0;

/// Below this charge the dashboard flags the battery (%)
pub const LOW_BATTERY_THRESHOLD_PERCENT: f64 = 20.0;

/// Ambulance staging point the drone launches from
pub const AMBULANCE_START: Coordinate = Coordinate::new(28.552413, 77.131123);
