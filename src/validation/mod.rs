//! Route validation and error types

pub mod data;
pub mod error;

pub use data::{RouteReport, RouteValidationConfig, RouteValidator, RouteWarning};
pub use error::{
    DispatchError, DispatchResult, GeometryFault, Operation, SimulationError, SimulationResult,
};
