//! In-process fan-out of monitor events to notification sinks.
//!
//! [`Dispatcher`] is the hub every unit emits through. It is built once at
//! startup and shared via `Arc<Dispatcher>`; its sink list never changes
//! after that, so units can read it without locking.

use std::sync::Arc;

use upwatch_core::MonitorEvent;

use crate::sink::NotificationSink;

// ---------------------------------------------------------------------------
// DispatchSummary
// ---------------------------------------------------------------------------

/// Outcome of one [`Dispatcher::notify`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Sinks that accepted the event.
    pub delivered: usize,
    /// Sinks that reported an error.
    pub failed: usize,
}

impl DispatchSummary {
    /// Total number of sinks the event was handed to.
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Ordered fan-out over registered sinks.
///
/// # Usage
///
/// ```rust
/// use std::sync::Arc;
/// use upwatch_core::{EventKind, MonitorEvent};
/// use upwatch_events::{ConsoleSink, Dispatcher};
///
/// let mut dispatcher = Dispatcher::new();
/// dispatcher.add(Arc::new(ConsoleSink::new()));
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let summary = dispatcher.notify(&MonitorEvent::new("api", EventKind::Started)).await;
/// assert_eq!(summary.delivered, 1);
/// # });
/// ```
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl Dispatcher {
    /// Create a dispatcher with no sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink. Sinks are notified in registration order.
    pub fn add(&mut self, sink: Arc<dyn NotificationSink>) {
        tracing::debug!(sink = sink.name(), position = self.sinks.len(), "Sink registered");
        self.sinks.push(sink);
    }

    /// Number of registered sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Deliver an event to every sink in registration order.
    ///
    /// A failing sink is logged and skipped; the remaining sinks still
    /// receive the event. This never returns an error.
    pub async fn notify(&self, event: &MonitorEvent) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for sink in &self.sinks {
            match sink.notify(event).await {
                Ok(()) => summary.delivered += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        sink = sink.name(),
                        unit = %event.target(),
                        kind = %event.kind(),
                        error = %e,
                        "Sink failed to deliver event"
                    );
                }
            }
        }

        tracing::debug!(
            unit = %event.target(),
            kind = %event.kind(),
            delivered = summary.delivered,
            failed = summary.failed,
            "Event dispatched"
        );

        summary
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
