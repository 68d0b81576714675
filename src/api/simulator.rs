//! Route traversal simulator
//!
//! Owns the waypoint sequence and the simulation state, and is advanced one
//! waypoint per `tick()` by an external fixed-period scheduler. Every
//! transition builds the next `SimulationState` in full, commits it, then
//! notifies subscribers with a copy.

use crate::algorithms::geo::{distance_km, initial_bearing_deg};
use crate::api::types::{SimulationState, TraversalConfig, TraversalState};
use crate::core::{Coordinate, WaypointSequence};
use crate::validation::error::{Operation, SimulationError, SimulationResult};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Callback invoked after every state transition
pub type StateCallback = Box<dyn Fn(&SimulationEvent) + Send>;

/// Transition notifications, each carrying the state after the transition
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    /// A new route replaced the previous one
    RouteLoaded {
        waypoint_count: usize,
        state: SimulationState,
    },
    /// The drone took off from the first waypoint
    Started { state: SimulationState },
    /// The drone moved to the next waypoint
    Advanced { state: SimulationState },
    /// The drone reached the final waypoint
    Completed { state: SimulationState },
    /// The operator recalled the drone
    Stopped { state: SimulationState },
}

impl SimulationEvent {
    pub fn state(&self) -> &SimulationState {
        match self {
            SimulationEvent::RouteLoaded { state, .. }
            | SimulationEvent::Started { state }
            | SimulationEvent::Advanced { state }
            | SimulationEvent::Completed { state }
            | SimulationEvent::Stopped { state } => state,
        }
    }
}

/// Subscription registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u32);

impl SubscriptionHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Simulates a drone flying a decoded route
pub struct TraversalSimulator {
    /// Launch point, fixed for the simulator's lifetime
    origin: Coordinate,
    config: TraversalConfig,
    waypoints: WaypointSequence,
    state: SimulationState,
    subscription_counter: u32,
    /// Subscribers in registration order
    subscribers: BTreeMap<SubscriptionHandle, StateCallback>,
}

impl TraversalSimulator {
    /// Create a simulator with the default battery model
    pub fn new(origin: Coordinate) -> Self {
        Self::with_config(origin, TraversalConfig::default())
    }

    pub fn with_config(origin: Coordinate, config: TraversalConfig) -> Self {
        Self {
            origin,
            config,
            waypoints: Vec::new(),
            state: SimulationState::initial(config.initial_battery_percent),
            subscription_counter: 0,
            subscribers: BTreeMap::new(),
        }
    }

    /// Replace the route and reset all telemetry.
    ///
    /// Valid from any state. A running traversal is abandoned; the caller's
    /// scheduler must already be cancelled so no tick lands on the new route.
    pub fn load(&mut self, waypoints: WaypointSequence) {
        if self.state.traversal.is_running() {
            info!(cursor = self.state.cursor_index, "abandoning traversal for new route");
        }

        self.waypoints = waypoints;
        self.state = SimulationState::initial(self.config.initial_battery_percent);

        info!(waypoints = self.waypoints.len(), "route loaded");
        self.publish(SimulationEvent::RouteLoaded {
            waypoint_count: self.waypoints.len(),
            state: self.state,
        });
    }

    /// Launch the drone from the first waypoint.
    ///
    /// Allowed from `Idle`, `Stopped` and `Completed`; the flight always
    /// restarts at waypoint 0 and the battery is not recharged.
    pub fn start(&mut self) -> SimulationResult<SimulationState> {
        if self.state.traversal.is_running() {
            return Err(self.reject(Operation::Start));
        }
        let Some(&first) = self.waypoints.first() else {
            warn!("start requested with an empty route");
            return Err(SimulationError::EmptyRoute);
        };

        self.state = SimulationState {
            traversal: TraversalState::Running,
            cursor_index: 0,
            current_position: Some(first),
            distance_from_origin_km: distance_km(self.origin, first),
            is_active: true,
            ..self.state
        };

        info!(
            waypoints = self.waypoints.len(),
            battery = self.state.battery_percent,
            "traversal started"
        );
        self.publish(SimulationEvent::Started { state: self.state });

        if self.is_at_last_waypoint() {
            self.complete();
        }
        Ok(self.state)
    }

    /// Advance the drone by one waypoint.
    ///
    /// Only valid while `Running`; the scheduler must stop ticking once the
    /// traversal completes or is stopped.
    pub fn tick(&mut self) -> SimulationResult<SimulationState> {
        if !self.state.traversal.is_running() {
            return Err(self.reject(Operation::Tick));
        }

        let next_index = self.state.cursor_index + 1;
        if next_index >= self.waypoints.len() {
            self.complete();
            return Ok(self.state);
        }

        let position = self.waypoints[next_index];
        let ticks_elapsed = self.state.ticks_elapsed + 1;
        self.state = SimulationState {
            cursor_index: next_index,
            current_position: Some(position),
            distance_from_origin_km: distance_km(self.origin, position),
            battery_percent: self.config.battery_after(ticks_elapsed),
            ticks_elapsed,
            ..self.state
        };

        debug!(
            cursor = next_index,
            distance_km = self.state.distance_from_origin_km,
            battery = self.state.battery_percent,
            "traversal advanced"
        );
        self.publish(SimulationEvent::Advanced { state: self.state });

        if self.is_at_last_waypoint() {
            self.complete();
        }
        Ok(self.state)
    }

    /// Recall the drone. Cursor and telemetry are kept for display.
    pub fn stop(&mut self) -> SimulationResult<SimulationState> {
        if !self.state.traversal.is_running() {
            return Err(self.reject(Operation::Stop));
        }

        self.state = SimulationState {
            traversal: TraversalState::Stopped,
            is_active: false,
            ..self.state
        };

        info!(cursor = self.state.cursor_index, "traversal stopped");
        self.publish(SimulationEvent::Stopped { state: self.state });
        Ok(self.state)
    }

    /// Register a callback for state transitions
    pub fn subscribe(&mut self, callback: StateCallback) -> SubscriptionHandle {
        self.subscription_counter += 1;
        let handle = SubscriptionHandle(self.subscription_counter);
        self.subscribers.insert(handle, callback);
        handle
    }

    /// Remove a callback. Returns false if the handle was unknown.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.subscribers.remove(&handle).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SimulationState {
        self.state
    }

    pub fn traversal_state(&self) -> TraversalState {
        self.state.traversal
    }

    pub fn waypoints(&self) -> &[Coordinate] {
        &self.waypoints
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Waypoints still ahead of the drone
    pub fn remaining_waypoints(&self) -> usize {
        if self.state.current_position.is_none() {
            self.waypoints.len()
        } else {
            self.waypoints.len().saturating_sub(self.state.cursor_index + 1)
        }
    }

    /// Fraction of the route flown, in [0, 1]
    pub fn progress(&self) -> f64 {
        match self.waypoints.len() {
            0 => 0.0,
            1 => {
                if self.state.traversal == TraversalState::Completed {
                    1.0
                } else {
                    0.0
                }
            }
            len => self.state.cursor_index as f64 / (len - 1) as f64,
        }
    }

    /// Heading of the drone in degrees [0, 360).
    ///
    /// Bearing of the leg just flown, or of the first leg while the drone
    /// sits at waypoint 0. `None` before the first start or when the route
    /// has no legs.
    pub fn heading_deg(&self) -> Option<f64> {
        self.state.current_position?;
        let to = self.state.cursor_index.max(1);
        let from = self.waypoints.get(to - 1)?;
        let to = self.waypoints.get(to)?;
        Some(initial_bearing_deg(*from, *to))
    }

    fn is_at_last_waypoint(&self) -> bool {
        self.state.cursor_index + 1 >= self.waypoints.len()
    }

    fn complete(&mut self) {
        self.state = SimulationState {
            traversal: TraversalState::Completed,
            is_active: false,
            ..self.state
        };

        info!(
            cursor = self.state.cursor_index,
            distance_km = self.state.distance_from_origin_km,
            battery = self.state.battery_percent,
            "traversal completed"
        );
        self.publish(SimulationEvent::Completed { state: self.state });
    }

    fn reject(&self, operation: Operation) -> SimulationError {
        warn!(%operation, state = %self.state.traversal, "invalid traversal transition");
        SimulationError::InvalidTransition {
            operation,
            state: self.state.traversal,
        }
    }

    fn publish(&self, event: SimulationEvent) {
        for callback in self.subscribers.values() {
            callback(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AMBULANCE_START;
    use std::sync::{Arc, Mutex};

    const TOLERANCE: f64 = 1e-9;

    fn straight_route(len: usize) -> WaypointSequence {
        (0..len)
            .map(|i| Coordinate::new(AMBULANCE_START.lat + i as f64 * 0.0005, AMBULANCE_START.lon))
            .collect()
    }

    fn recorder(simulator: &mut TraversalSimulator) -> Arc<Mutex<Vec<SimulationEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        simulator.subscribe(Box::new(move |event| sink.lock().unwrap().push(event.clone())));
        events
    }

    #[test]
    fn test_new_simulator_is_idle() {
        let simulator = TraversalSimulator::new(AMBULANCE_START);
        assert_eq!(simulator.traversal_state(), TraversalState::Idle);
        assert_eq!(simulator.snapshot(), SimulationState::default());
        assert!(simulator.waypoints().is_empty());
        assert_eq!(simulator.origin(), AMBULANCE_START);
    }

    #[test]
    fn test_start_positions_drone_at_first_waypoint() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(5));

        let state = simulator.start().unwrap();
        assert_eq!(state.traversal, TraversalState::Running);
        assert_eq!(state.cursor_index, 0);
        assert_eq!(state.current_position, Some(AMBULANCE_START));
        assert!(state.is_active);
        assert_eq!(state.battery_percent, 100.0);
        assert_eq!(state.distance_from_origin_km, 0.0);
    }

    #[test]
    fn test_battery_drains_per_tick() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(3000));
        simulator.start().unwrap();

        for n in 1..=2500u64 {
            let state = simulator.tick().unwrap();
            let expected = (100.0 - n as f64 * 0.05).max(0.0);
            assert!((state.battery_percent - expected).abs() < TOLERANCE, "tick {}", n);
            assert!(state.battery_percent >= 0.0);
        }
        assert_eq!(simulator.state().battery_percent, 0.0);
    }

    #[test]
    fn test_completion_after_len_minus_one_ticks() {
        let k = 6;
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(k));
        simulator.start().unwrap();

        for _ in 0..k - 2 {
            assert_eq!(simulator.tick().unwrap().traversal, TraversalState::Running);
        }
        let state = simulator.tick().unwrap();
        assert_eq!(state.traversal, TraversalState::Completed);
        assert_eq!(state.cursor_index, k - 1);
        assert!(!state.is_active);
        assert_eq!(simulator.remaining_waypoints(), 0);
        assert!((simulator.progress() - 1.0).abs() < TOLERANCE);

        assert_eq!(
            simulator.tick(),
            Err(SimulationError::InvalidTransition {
                operation: Operation::Tick,
                state: TraversalState::Completed,
            })
        );
    }

    #[test]
    fn test_reference_scenario() {
        let hospital = Coordinate::new(28.560000, 77.140000);
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(vec![AMBULANCE_START, hospital]);
        simulator.start().unwrap();

        let state = simulator.tick().unwrap();
        assert_eq!(state.cursor_index, 1);
        assert!(!state.is_active);
        assert_eq!(state.traversal, TraversalState::Completed);
        assert!((state.distance_from_origin_km - distance_km(AMBULANCE_START, hospital)).abs() < TOLERANCE);
        assert!((state.battery_percent - 99.95).abs() < TOLERANCE);
        assert_eq!(state.current_position, Some(hospital));
    }

    #[test]
    fn test_reload_while_running_resets_everything() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(10));
        simulator.start().unwrap();
        for _ in 0..4 {
            simulator.tick().unwrap();
        }
        assert!(simulator.state().distance_from_origin_km > 0.0);

        simulator.load(straight_route(3));
        let state = simulator.snapshot();
        assert_eq!(state.traversal, TraversalState::Idle);
        assert_eq!(state.cursor_index, 0);
        assert_eq!(state.battery_percent, 100.0);
        assert_eq!(state.distance_from_origin_km, 0.0);
        assert_eq!(state.current_position, None);
        assert!(!state.is_active);
        assert_eq!(state.ticks_elapsed, 0);

        // Ticking is cancelled until the new route is started
        assert!(matches!(
            simulator.tick(),
            Err(SimulationError::InvalidTransition { operation: Operation::Tick, .. })
        ));
    }

    #[test]
    fn test_empty_route_cannot_start() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(Vec::new());

        assert_eq!(simulator.start(), Err(SimulationError::EmptyRoute));
        assert_eq!(simulator.traversal_state(), TraversalState::Idle);
        assert_eq!(simulator.snapshot(), SimulationState::default());
    }

    #[test]
    fn test_start_while_running_is_rejected() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(4));
        simulator.start().unwrap();
        simulator.tick().unwrap();

        let before = simulator.snapshot();
        assert_eq!(
            simulator.start(),
            Err(SimulationError::InvalidTransition {
                operation: Operation::Start,
                state: TraversalState::Running,
            })
        );
        assert_eq!(simulator.snapshot(), before);
    }

    #[test]
    fn test_tick_while_idle_is_rejected() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(4));
        assert!(matches!(
            simulator.tick(),
            Err(SimulationError::InvalidTransition { state: TraversalState::Idle, .. })
        ));
    }

    #[test]
    fn test_stop_preserves_telemetry() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(10));
        simulator.start().unwrap();
        simulator.tick().unwrap();
        let flying = simulator.tick().unwrap();

        let stopped = simulator.stop().unwrap();
        assert_eq!(stopped.traversal, TraversalState::Stopped);
        assert!(!stopped.is_active);
        assert_eq!(stopped.cursor_index, flying.cursor_index);
        assert_eq!(stopped.battery_percent, flying.battery_percent);
        assert_eq!(stopped.distance_from_origin_km, flying.distance_from_origin_km);

        assert!(matches!(
            simulator.stop(),
            Err(SimulationError::InvalidTransition { operation: Operation::Stop, .. })
        ));
    }

    #[test]
    fn test_restart_after_stop_begins_at_first_waypoint() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(10));
        simulator.start().unwrap();
        for _ in 0..3 {
            simulator.tick().unwrap();
        }
        simulator.stop().unwrap();

        let restarted = simulator.start().unwrap();
        assert_eq!(restarted.cursor_index, 0);
        assert_eq!(restarted.current_position, Some(AMBULANCE_START));
        assert_eq!(restarted.distance_from_origin_km, 0.0);
        // Battery is not recharged by a recall
        assert!((restarted.battery_percent - 99.85).abs() < TOLERANCE);

        let state = simulator.tick().unwrap();
        assert!((state.battery_percent - 99.80).abs() < TOLERANCE);
    }

    #[test]
    fn test_restart_after_completion() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(2));
        simulator.start().unwrap();
        simulator.tick().unwrap();
        assert_eq!(simulator.traversal_state(), TraversalState::Completed);

        let state = simulator.start().unwrap();
        assert_eq!(state.traversal, TraversalState::Running);
        assert_eq!(state.cursor_index, 0);
    }

    #[test]
    fn test_single_waypoint_route_completes_on_start() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(1));

        let state = simulator.start().unwrap();
        assert_eq!(state.traversal, TraversalState::Completed);
        assert_eq!(state.cursor_index, 0);
        assert!(!state.is_active);
        assert_eq!(state.battery_percent, 100.0);
        assert_eq!(simulator.progress(), 1.0);
    }

    #[test]
    fn test_subscribers_receive_every_transition() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        let events = recorder(&mut simulator);

        simulator.load(straight_route(3));
        simulator.start().unwrap();
        simulator.tick().unwrap();
        simulator.tick().unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], SimulationEvent::RouteLoaded { waypoint_count: 3, .. }));
        assert!(matches!(events[1], SimulationEvent::Started { .. }));
        assert!(matches!(events[2], SimulationEvent::Advanced { .. }));
        assert!(matches!(events[3], SimulationEvent::Advanced { .. }));
        assert!(matches!(events[4], SimulationEvent::Completed { .. }));

        // Snapshots are internally consistent
        let advanced = events[3].state();
        assert_eq!(advanced.cursor_index, 2);
        assert_eq!(advanced.ticks_elapsed, 2);
        assert!(advanced.is_active);
        assert_eq!(events[4].state().traversal, TraversalState::Completed);
    }

    #[test]
    fn test_rejected_transition_publishes_nothing() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        let events = recorder(&mut simulator);

        let _ = simulator.tick();
        let _ = simulator.stop();
        let _ = simulator.start();

        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        let count = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&count);
        let handle = simulator.subscribe(Box::new(move |_| *sink.lock().unwrap() += 1));

        simulator.load(straight_route(2));
        assert!(simulator.unsubscribe(handle));
        assert!(!simulator.unsubscribe(handle));
        assert_eq!(simulator.subscriber_count(), 0);

        simulator.start().unwrap();
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_heading_follows_current_leg() {
        let corner = Coordinate::new(AMBULANCE_START.lat + 0.001, AMBULANCE_START.lon);
        let east = Coordinate::new(corner.lat, corner.lon + 0.001);
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(vec![AMBULANCE_START, corner, east]);
        assert_eq!(simulator.heading_deg(), None);

        simulator.start().unwrap();
        assert!(simulator.heading_deg().unwrap().abs() < 1e-6);

        simulator.tick().unwrap();
        assert!(simulator.heading_deg().unwrap().abs() < 1e-6);

        simulator.tick().unwrap();
        let heading = simulator.heading_deg().unwrap();
        assert!((heading - 90.0).abs() < 0.01, "got {}", heading);
    }

    #[test]
    fn test_heading_needs_a_leg() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(vec![AMBULANCE_START]);
        simulator.start().unwrap();
        assert_eq!(simulator.heading_deg(), None);
    }

    #[test]
    fn test_progress_and_remaining() {
        let mut simulator = TraversalSimulator::new(AMBULANCE_START);
        simulator.load(straight_route(5));
        assert_eq!(simulator.remaining_waypoints(), 5);
        assert_eq!(simulator.progress(), 0.0);

        simulator.start().unwrap();
        assert_eq!(simulator.remaining_waypoints(), 4);
        simulator.tick().unwrap();
        simulator.tick().unwrap();
        assert_eq!(simulator.remaining_waypoints(), 2);
        assert!((simulator.progress() - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_custom_battery_model() {
        let config = TraversalConfig {
            initial_battery_percent: 1.0,
            battery_decrement_per_tick: 0.4,
        };
        let mut simulator = TraversalSimulator::with_config(AMBULANCE_START, config);
        simulator.load(straight_route(6));
        assert_eq!(simulator.state().battery_percent, 1.0);

        simulator.start().unwrap();
        simulator.tick().unwrap();
        simulator.tick().unwrap();
        let state = simulator.tick().unwrap();
        assert_eq!(state.battery_percent, 0.0);
    }
}
