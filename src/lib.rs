//! Ambulance Drone Route Simulation
//!
//! Decodes encoded route polylines, flies a simulated drone along them one
//! waypoint per tick, and projects the resulting state into display-ready
//! telemetry (battery, distance from the launch point, status).

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use crate::core::{Coordinate, Hospital, WaypointSequence, AMBULANCE_START};
pub use crate::algorithms::geo::{distance_km, initial_bearing_deg, path_length_km};
pub use crate::processing::polyline::{decode, encode};
pub use crate::validation::{
    DispatchError, DispatchResult, RouteReport, RouteValidator, SimulationError, SimulationResult,
};
pub use crate::utils::config::{ConfigError, ConfigurationManager, SimulationConfig};
pub use crate::api::{
    DispatchController, DisplayTelemetry, RouteProvider, RouteQuery, SimulationEvent,
    SimulationState, StaticRouteProvider, StraightLineProvider, TelemetryFormatter,
    TickScheduler, TraversalSimulator, TraversalState,
};
