//! Error taxonomy for route decoding, traversal and dispatch

use crate::api::types::TraversalState;
use crate::core::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for decoder and simulator operations
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Result type for dispatch (presentation-layer) operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised by the polyline decoder and the traversal state machine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// The encoded geometry could not be parsed
    #[error("malformed geometry at byte {position}: {fault}")]
    MalformedGeometry { position: usize, fault: GeometryFault },
    /// `start` was attempted with no waypoints loaded
    #[error("route has no waypoints")]
    EmptyRoute,
    /// An operation was invoked in a state that does not allow it
    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: Operation,
        state: TraversalState,
    },
}

/// Ways an encoded geometry string can be malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum GeometryFault {
    #[error("byte 0x{0:02x} is outside the polyline alphabet")]
    InvalidCharacter(u8),
    #[error("stream ends inside a value")]
    Truncated,
    #[error("latitude has no matching longitude")]
    MissingLongitude,
    #[error("value exceeds the representable range")]
    Overflow,
}

/// Traversal operations, used to report rejected transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Start,
    Tick,
    Stop,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Start => write!(f, "start"),
            Operation::Tick => write!(f, "tick"),
            Operation::Stop => write!(f, "stop"),
        }
    }
}

/// Errors surfaced to the presentation layer while dispatching a drone
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    /// The directions service answered without any route
    #[error("no route found")]
    NoRouteFound,
    /// The directions service could not be reached or refused the request
    #[error("failed to calculate route: {reason}")]
    ProviderFailure { reason: String },
    #[error("unknown hospital id {id}")]
    UnknownHospital { id: u32 },
    /// A decoded waypoint lies outside valid latitude/longitude ranges
    #[error("waypoint {index} is not a valid coordinate: {coordinate}")]
    InvalidWaypoint { index: usize, coordinate: Coordinate },
    /// The directions response body was not the expected JSON shape
    #[error("unreadable directions response: {0}")]
    ResponseFormat(#[from] serde_json::Error),
}

impl DispatchError {
    /// Message suitable for an alert shown to the operator
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::NoRouteFound => "No route found.".to_string(),
            DispatchError::ProviderFailure { reason } => {
                format!("Failed to calculate route: {}", reason)
            }
            other => other.to_string(),
        }
    }
}
