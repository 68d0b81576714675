//! Route geometry processing

pub mod polyline;

pub use polyline::{decode, encode};
