//! Per-target availability state machine.
//!
//! A [`MonitoredUnit`] is advanced one tick at a time by the driver. When
//! its countdown runs out it probes the target and decides whether the
//! reading confirms a change worth announcing.
//!
//! Debouncing works with a tolerance window. The first reading that
//! disagrees with the recorded status arms the window with
//! `fail_tolerance` (toward down) or `check_tolerance` (toward up); every
//! check while the window is open counts it down, and the check that finds
//! it at zero emits `fail` or `recovered`. A tolerance of `n` therefore
//! needs `n` further consecutive readings after the first disagreeing one.
//! The very first check skips the window and always emits `started` or
//! `started_with_failure`.
//!
//! Polling runs at `check_interval` only while the target is confirmed up
//! and the latest reading agrees; anything else polls at `fail_interval`.

use std::sync::Arc;

use upwatch_core::{EventKind, MonitorEvent, Status, UnitTiming};
use upwatch_events::Dispatcher;

use crate::probe::Probe;

/// Countdown of a freshly built unit: the first tick always checks.
const INITIAL_COUNTDOWN: i64 = 1;

/// One monitored target.
pub struct MonitoredUnit {
    name: String,
    timing: UnitTiming,
    status: Status,
    last_emitted_status: Status,
    countdown: i64,
    /// `None` while no transition is pending.
    tolerance: Option<u32>,
    probe: Box<dyn Probe>,
    dispatcher: Arc<Dispatcher>,
}

impl MonitoredUnit {
    pub fn new(
        name: impl Into<String>,
        timing: UnitTiming,
        probe: Box<dyn Probe>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            name: name.into(),
            timing,
            status: Status::Unknown,
            last_emitted_status: Status::Unknown,
            countdown: INITIAL_COUNTDOWN,
            tolerance: None,
            probe,
            dispatcher,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timing(&self) -> UnitTiming {
        self.timing
    }

    /// Latest raw reading, confirmed or not.
    pub fn status(&self) -> Status {
        self.status
    }

    /// State announced by the most recent event.
    pub fn last_emitted_status(&self) -> Status {
        self.last_emitted_status
    }

    /// Ticks left before the next check.
    pub fn countdown(&self) -> i64 {
        self.countdown
    }

    /// Remaining confirmations of the pending transition, if any.
    pub fn tolerance(&self) -> Option<u32> {
        self.tolerance
    }

    /// Advance the unit's clock by one tick, checking the target when due.
    pub async fn tick(&mut self) {
        self.countdown -= 1;
        if self.countdown <= 0 {
            self.check().await;
        }
    }

    /// Probe the target and apply the transition rules.
    pub async fn check(&mut self) {
        let reading = Status::from(self.probe.probe().await);

        tracing::trace!(
            unit = %self.name,
            reading = %reading,
            status = %self.status,
            tolerance = ?self.tolerance,
            "Checked target"
        );

        if reading != self.status {
            match (self.status, reading) {
                (Status::Unknown, Status::Up) => {
                    self.status = Status::Up;
                    self.emit(EventKind::Started, Status::Up).await;
                }
                (Status::Unknown, _) => {
                    self.status = Status::Down;
                    self.emit(EventKind::StartedWithFailure, Status::Down).await;
                }
                (_, Status::Up) => self.tolerance = Some(self.timing.check_tolerance),
                _ => self.tolerance = Some(self.timing.fail_tolerance),
            }
        }

        // An open window is always either freshly armed or agrees with the
        // recorded status at this point.
        if let Some(remaining) = self.tolerance {
            if remaining == 0 {
                let kind = if reading.is_up() {
                    EventKind::Recovered
                } else {
                    EventKind::Fail
                };
                self.emit(kind, reading).await;
                self.tolerance = None;
            } else {
                self.tolerance = Some(remaining - 1);
            }
        }

        self.status = reading;

        let next = if self.last_emitted_status.is_up() && reading.is_up() {
            self.timing.check_interval
        } else {
            self.timing.fail_interval
        };
        self.countdown = i64::from(next);
    }

    async fn emit(&mut self, kind: EventKind, confirmed: Status) {
        let event = MonitorEvent::new(self.name.as_str(), kind);

        if kind.reports_up() {
            tracing::info!(unit = %self.name, kind = %kind, "{event}");
        } else {
            tracing::warn!(unit = %self.name, kind = %kind, "{event}");
        }

        self.dispatcher.notify(&event).await;
        self.last_emitted_status = confirmed;
    }
}

impl std::fmt::Debug for MonitoredUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoredUnit")
            .field("name", &self.name)
            .field("status", &self.status)
            .field("last_emitted_status", &self.last_emitted_status)
            .field("countdown", &self.countdown)
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}
