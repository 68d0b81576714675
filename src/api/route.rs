//! Route provider seam
//!
//! The directions service is an external collaborator: given an origin and a
//! destination it yields an encoded geometry string or fails. Transport and
//! authentication live behind `RouteProvider`; this module only supplies the
//! query shape, response parsing and two offline providers.

use crate::core::{Coordinate, Hospital};
use crate::processing::polyline;
use crate::validation::error::{DispatchError, DispatchResult};
use serde::Deserialize;
use tracing::{debug, warn};

/// Origin/destination pair sent to a directions service
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteQuery {
    pub origin: Coordinate,
    pub destination: Coordinate,
}

impl RouteQuery {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self { origin, destination }
    }

    pub fn to_hospital(origin: Coordinate, hospital: &Hospital) -> Self {
        Self::new(origin, hospital.position)
    }

    /// `lon,lat;lon,lat` path segment; directions services take longitude first
    pub fn coordinate_path(&self) -> String {
        format!(
            "{},{};{},{}",
            self.origin.lon, self.origin.lat, self.destination.lon, self.destination.lat
        )
    }
}

/// Source of encoded route geometry
pub trait RouteProvider {
    /// Fetch the encoded polyline for `query`
    fn fetch_geometry(&mut self, query: &RouteQuery) -> DispatchResult<String>;
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    geometry: String,
    /// Road distance in meters, when the service reports it
    #[serde(default)]
    distance: Option<f64>,
}

/// Extract the first route's geometry from a directions JSON body
pub fn parse_directions_response(body: &str) -> DispatchResult<String> {
    let response: DirectionsResponse = serde_json::from_str(body)?;

    match response.routes.into_iter().next() {
        Some(route) => {
            debug!(road_distance_m = ?route.distance, "directions response parsed");
            Ok(route.geometry)
        }
        None => {
            warn!("directions response contained no routes");
            Err(DispatchError::NoRouteFound)
        }
    }
}

/// Provider that always returns the same outcome (recorded responses, tests)
#[derive(Debug, Clone)]
pub struct StaticRouteProvider {
    outcome: Result<String, String>,
}

impl StaticRouteProvider {
    pub fn new(geometry: impl Into<String>) -> Self {
        Self {
            outcome: Ok(geometry.into()),
        }
    }

    /// Provider whose every request fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(reason.into()),
        }
    }

    /// Provider replaying a saved directions JSON body
    pub fn from_directions_response(body: &str) -> DispatchResult<Self> {
        Ok(Self::new(parse_directions_response(body)?))
    }
}

impl RouteProvider for StaticRouteProvider {
    fn fetch_geometry(&mut self, _query: &RouteQuery) -> DispatchResult<String> {
        self.outcome
            .clone()
            .map_err(|reason| DispatchError::ProviderFailure { reason })
    }
}

/// Offline provider flying a straight line in evenly spaced steps
#[derive(Debug, Clone)]
pub struct StraightLineProvider {
    steps: usize,
}

impl StraightLineProvider {
    /// `steps` legs between origin and destination, at least one
    pub fn new(steps: usize) -> Self {
        Self { steps: steps.max(1) }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn waypoints(&self, query: &RouteQuery) -> Vec<Coordinate> {
        let (from, to) = (query.origin, query.destination);
        (0..=self.steps)
            .map(|i| {
                let t = i as f64 / self.steps as f64;
                Coordinate::new(from.lat + (to.lat - from.lat) * t, from.lon + (to.lon - from.lon) * t)
            })
            .collect()
    }
}

impl RouteProvider for StraightLineProvider {
    fn fetch_geometry(&mut self, query: &RouteQuery) -> DispatchResult<String> {
        Ok(polyline::encode(&self.waypoints(query)))
    }
}

impl<P: RouteProvider + ?Sized> RouteProvider for Box<P> {
    fn fetch_geometry(&mut self, query: &RouteQuery) -> DispatchResult<String> {
        (**self).fetch_geometry(query)
    }
}
