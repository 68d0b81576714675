//! Dispatch controller
//!
//! Ties together the pieces the dashboard drives: a hospital catalog, the
//! route provider, the simulator and its tick scheduler. Each public method
//! corresponds to one operator action.

use crate::api::route::{RouteProvider, RouteQuery};
use crate::api::scheduler::TickScheduler;
use crate::api::simulator::TraversalSimulator;
use crate::api::telemetry::{DisplayTelemetry, TelemetryProjector};
use crate::api::types::SimulationState;
use crate::core::{Coordinate, Hospital};
use crate::processing::polyline;
use crate::utils::config::SimulationConfig;
use crate::validation::data::{RouteReport, RouteValidator};
use crate::validation::error::{DispatchError, DispatchResult};
use std::time::Duration;
use tracing::{info, warn};

pub struct DispatchController {
    provider: Box<dyn RouteProvider>,
    origin: Coordinate,
    hospitals: Vec<Hospital>,
    simulator: TraversalSimulator,
    scheduler: TickScheduler,
    validator: RouteValidator,
    projector: TelemetryProjector,
    selected: Option<Hospital>,
    route_report: Option<RouteReport>,
}

impl DispatchController {
    pub fn new(provider: Box<dyn RouteProvider>, config: &SimulationConfig) -> Self {
        Self {
            provider,
            origin: config.origin,
            hospitals: config.hospitals.clone(),
            simulator: TraversalSimulator::with_config(config.origin, config.traversal_config()),
            scheduler: TickScheduler::from_millis(config.tick_period_ms),
            validator: RouteValidator::with_config(config.route_validation.clone()),
            projector: TelemetryProjector::new(config.low_battery_threshold_percent),
            selected: None,
            route_report: None,
        }
    }

    /// Route the drone to hospital `id`.
    ///
    /// The route is fetched, decoded and validated before anything changes.
    /// On success ticking is cancelled and the simulator is reloaded, which
    /// abandons any flight in progress. On failure the current flight is
    /// left untouched.
    pub fn select_hospital(&mut self, id: u32) -> DispatchResult<&RouteReport> {
        let hospital = match self.hospitals.iter().find(|h| h.id == id) {
            Some(hospital) => hospital.clone(),
            None => {
                warn!(id, "unknown hospital selected");
                return Err(DispatchError::UnknownHospital { id });
            }
        };

        info!(hospital = %hospital.name, destination = %hospital.position, "requesting route");
        let query = RouteQuery::to_hospital(self.origin, &hospital);
        let geometry = self.provider.fetch_geometry(&query).map_err(|e| {
            warn!(hospital = %hospital.name, error = %e, "route request failed");
            e
        })?;

        let waypoints = polyline::decode(&geometry)?;
        let report = self.validator.validate(&waypoints, self.origin)?;

        self.scheduler.cancel();
        self.simulator.load(waypoints);

        info!(
            hospital = %hospital.name,
            waypoints = report.waypoint_count,
            path_km = report.path_length_km,
            "route ready"
        );
        self.selected = Some(hospital);
        Ok(self.route_report.insert(report))
    }

    /// Launch the drone along the loaded route and start ticking
    pub fn deploy(&mut self) -> DispatchResult<SimulationState> {
        let state = self.simulator.start()?;
        if state.traversal.is_running() {
            self.scheduler.arm();
        }
        info!(
            hospital = self.selected.as_ref().map(|h| h.name.as_str()).unwrap_or("-"),
            "drone deployed"
        );
        Ok(state)
    }

    /// Halt ticking and recall the drone
    pub fn recall(&mut self) -> DispatchResult<SimulationState> {
        self.scheduler.cancel();
        let state = self.simulator.stop()?;
        info!(cursor = state.cursor_index, "drone recalled");
        Ok(state)
    }

    /// Deploy or recall, whichever the single dashboard button would do
    pub fn toggle_deployment(&mut self) -> DispatchResult<SimulationState> {
        if self.simulator.traversal_state().is_running() {
            self.recall()
        } else {
            self.deploy()
        }
    }

    /// Feed elapsed wall time to the scheduler; returns the ticks applied
    pub fn advance(&mut self, elapsed: Duration) -> DispatchResult<u32> {
        Ok(self.scheduler.drive(&mut self.simulator, elapsed)?)
    }

    pub fn telemetry(&self) -> DisplayTelemetry {
        self.projector.project(self.simulator.state())
    }

    /// Whether ticks are still being emitted
    pub fn is_flying(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }

    pub fn selected_hospital(&self) -> Option<&Hospital> {
        self.selected.as_ref()
    }

    pub fn route_report(&self) -> Option<&RouteReport> {
        self.route_report.as_ref()
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    pub fn tick_period(&self) -> Duration {
        self.scheduler.period()
    }

    pub fn simulator(&self) -> &TraversalSimulator {
        &self.simulator
    }

    /// Mutable simulator access, e.g. to subscribe to transitions
    pub fn simulator_mut(&mut self) -> &mut TraversalSimulator {
        &mut self.simulator
    }
}
