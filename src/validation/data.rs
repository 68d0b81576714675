use crate::algorithms::geo::{distance_km, path_length_km};
use crate::core::Coordinate;
use crate::validation::error::{DispatchError, DispatchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Configuration for decoded route validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteValidationConfig {
    /// Longest plausible distance between consecutive waypoints (km)
    pub max_leg_km: f64,
    /// Largest tolerated gap between the origin and the first waypoint (km)
    pub max_origin_offset_km: f64,
}

impl Default for RouteValidationConfig {
    fn default() -> Self {
        Self {
            max_leg_km: 5.0,
            max_origin_offset_km: 0.5,
        }
    }
}

/// Non-fatal observations about a decoded route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouteWarning {
    /// Two consecutive waypoints are further apart than `max_leg_km`
    LongLeg { index: usize, distance_km: f64 },
    /// The route does not begin where the drone launches
    DetachedStart { offset_km: f64 },
    /// Waypoint repeats its predecessor; the drone will hover for one tick
    RepeatedWaypoint { index: usize },
}

impl fmt::Display for RouteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteWarning::LongLeg { index, distance_km } => {
                write!(f, "Leg ending at waypoint {} spans {:.2} km", index, distance_km)
            }
            RouteWarning::DetachedStart { offset_km } => {
                write!(f, "Route starts {:.2} km from the origin", offset_km)
            }
            RouteWarning::RepeatedWaypoint { index } => {
                write!(f, "Waypoint {} repeats its predecessor", index)
            }
        }
    }
}

/// Summary of a route that passed validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteReport {
    pub waypoint_count: usize,
    pub path_length_km: f64,
    pub warnings: Vec<RouteWarning>,
}

/// Checks decoded waypoints before they are handed to the simulator
pub struct RouteValidator {
    config: RouteValidationConfig,
}

impl RouteValidator {
    pub fn new() -> Self {
        Self::with_config(RouteValidationConfig::default())
    }

    pub fn with_config(config: RouteValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RouteValidationConfig {
        &self.config
    }

    /// Validate a route flown from `origin`.
    ///
    /// Non-finite or out-of-range coordinates reject the route. Everything
    /// else is reported as a warning.
    pub fn validate(&self, waypoints: &[Coordinate], origin: Coordinate) -> DispatchResult<RouteReport> {
        if let Some((index, coordinate)) = waypoints.iter().enumerate().find(|(_, c)| !c.is_valid()) {
            return Err(DispatchError::InvalidWaypoint {
                index,
                coordinate: *coordinate,
            });
        }

        let mut warnings = Vec::new();

        if let Some(first) = waypoints.first() {
            let offset_km = distance_km(origin, *first);
            if offset_km > self.config.max_origin_offset_km {
                warnings.push(RouteWarning::DetachedStart { offset_km });
            }
        }

        for (i, leg) in waypoints.windows(2).enumerate() {
            let index = i + 1;
            if leg[0] == leg[1] {
                warnings.push(RouteWarning::RepeatedWaypoint { index });
                continue;
            }
            let leg_km = distance_km(leg[0], leg[1]);
            if leg_km > self.config.max_leg_km {
                warnings.push(RouteWarning::LongLeg {
                    index,
                    distance_km: leg_km,
                });
            }
        }

        for warning in &warnings {
            warn!(%warning, "route validation");
        }

        Ok(RouteReport {
            waypoint_count: waypoints.len(),
            path_length_km: path_length_km(waypoints),
            warnings,
        })
    }
}

impl Default for RouteValidator {
    fn default() -> Self {
        Self::new()
    }
}
