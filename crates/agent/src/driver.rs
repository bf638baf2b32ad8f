//! The tick loop.
//!
//! [`Monitor`] owns every unit and the shared dispatcher. Each round ticks
//! the units in configuration order, one after another, then sleeps for one
//! tick quantum. Cancellation is observed only between rounds and during the
//! sleep, so a round that has started always finishes.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use upwatch_events::Dispatcher;

use crate::unit::MonitoredUnit;

/// Real-time length of one tick.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Process-wide monitor context.
pub struct Monitor {
    units: Vec<MonitoredUnit>,
    dispatcher: Arc<Dispatcher>,
    tick: Duration,
}

impl Monitor {
    pub fn new(units: Vec<MonitoredUnit>, dispatcher: Arc<Dispatcher>, tick: Duration) -> Self {
        Self {
            units,
            dispatcher,
            tick,
        }
    }

    pub fn units(&self) -> &[MonitoredUnit] {
        &self.units
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick
    }

    /// Tick every unit once, in order.
    pub async fn tick_all(&mut self) {
        for unit in &mut self.units {
            unit.tick().await;
        }
    }

    /// Run rounds until `cancel` fires. Returns the number of completed rounds.
    pub async fn run(&mut self, cancel: CancellationToken) -> u64 {
        tracing::info!(
            units = self.units.len(),
            sinks = self.dispatcher.len(),
            tick_ms = self.tick.as_millis() as u64,
            "Monitor loop starting"
        );

        let mut rounds = 0u64;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            self.tick_all().await;
            rounds += 1;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.tick) => {}
            }
        }

        tracing::info!(rounds, "Monitor loop stopped");
        rounds
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("units", &self.units)
            .field("dispatcher", &self.dispatcher)
            .field("tick", &self.tick)
            .finish()
    }
}
