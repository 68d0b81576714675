//! Simulation API
//!
//! The traversal simulator and the pieces a presentation layer needs around
//! it: a tick scheduler, telemetry projection, route providers and a
//! dispatch controller that mirrors the operator's actions.

pub mod dispatch;
pub mod route;
pub mod scheduler;
pub mod simulator;
pub mod telemetry;
pub mod types;

// Re-export commonly used API types
pub use dispatch::DispatchController;
pub use route::{
    parse_directions_response, RouteProvider, RouteQuery, StaticRouteProvider, StraightLineProvider,
};
pub use scheduler::TickScheduler;
pub use simulator::{SimulationEvent, StateCallback, SubscriptionHandle, TraversalSimulator};
pub use telemetry::{project, DisplayTelemetry, StatusLabel, TelemetryFormatter, TelemetryProjector};
pub use types::{SimulationState, TraversalConfig, TraversalState};
