//! Fixed-period tick scheduler
//!
//! The presentation layer owns one `TickScheduler` per simulator. It turns
//! elapsed wall time into whole ticks and only emits them while armed, so
//! cancelling it before `load` or `stop` guarantees no stale tick reaches a
//! reset simulator.

use crate::api::simulator::TraversalSimulator;
use crate::core::TICK_PERIOD_MS;
use crate::validation::error::SimulationResult;
use std::time::Duration;
use tracing::debug;

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct TickScheduler {
    period: Duration,
    /// Elapsed time not yet converted into ticks
    accumulated: Duration,
    armed: bool,
}

impl TickScheduler {
    /// Periods shorter than one millisecond are raised to one millisecond.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            accumulated: Duration::ZERO,
            armed: false,
        }
    }

    pub fn from_millis(period_ms: u64) -> Self {
        Self::new(Duration::from_millis(period_ms))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Begin emitting ticks, counting time from now
    pub fn arm(&mut self) {
        self.armed = true;
        self.accumulated = Duration::ZERO;
    }

    /// Stop emitting ticks and discard any partially elapsed period
    pub fn cancel(&mut self) {
        if self.armed {
            debug!("tick scheduler cancelled");
        }
        self.armed = false;
        self.accumulated = Duration::ZERO;
    }

    /// Number of whole periods that elapsed; the remainder carries over
    pub fn due_ticks(&mut self, elapsed: Duration) -> u32 {
        if !self.armed {
            return 0;
        }

        self.accumulated += elapsed;
        let due = self.accumulated.as_nanos() / self.period.as_nanos();
        let due = u32::try_from(due).unwrap_or(u32::MAX);
        self.accumulated -= self.period * due;
        due
    }

    /// Apply all ticks due after `elapsed` to `simulator`.
    ///
    /// Disarms itself as soon as the simulator leaves `Running`, so ticks
    /// never reach a completed, stopped or reloaded traversal. Returns the
    /// number of ticks applied.
    pub fn drive(&mut self, simulator: &mut TraversalSimulator, elapsed: Duration) -> SimulationResult<u32> {
        if !self.armed {
            return Ok(0);
        }
        if !simulator.traversal_state().is_running() {
            self.cancel();
            return Ok(0);
        }

        let due = self.due_ticks(elapsed);
        let mut applied = 0;
        for _ in 0..due {
            simulator.tick()?;
            applied += 1;
            if !simulator.traversal_state().is_running() {
                self.cancel();
                break;
            }
        }
        Ok(applied)
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::from_millis(TICK_PERIOD_MS)
    }
}
