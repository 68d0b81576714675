//! Core types and constants for the route traversal engine

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
