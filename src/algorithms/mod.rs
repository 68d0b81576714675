//! Geographic algorithms

pub mod geo;

pub use geo::{distance_km, initial_bearing_deg, path_length_km};
