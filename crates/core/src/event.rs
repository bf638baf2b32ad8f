//! Availability events emitted by monitored units.
//!
//! A [`MonitorEvent`] names a target and what happened to it. Its rendered
//! message (via `Display`) depends only on the kind and the target name, so
//! every sink prints the same text for the same occurrence.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// What happened to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// First check of the target found it up.
    Started,
    /// First check of the target found it down.
    StartedWithFailure,
    /// A drop to down survived its tolerance window.
    Fail,
    /// A return to up survived its tolerance window.
    Recovered,
}

impl EventKind {
    /// Stable snake_case identifier, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Started => "started",
            EventKind::StartedWithFailure => "started_with_failure",
            EventKind::Fail => "fail",
            EventKind::Recovered => "recovered",
        }
    }

    /// Whether the target is reachable after this event.
    pub fn reports_up(self) -> bool {
        matches!(self, EventKind::Started | EventKind::Recovered)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MonitorEvent
// ---------------------------------------------------------------------------

/// An immutable occurrence for a named target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorEvent {
    target: String,
    kind: EventKind,
    occurred_at: DateTime<Utc>,
}

impl MonitorEvent {
    /// Create an event stamped with the current time.
    pub fn new(target: impl Into<String>, kind: EventKind) -> Self {
        Self {
            target: target.into(),
            kind,
            occurred_at: Utc::now(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Human-readable message for this event.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.target;
        match self.kind {
            EventKind::Started => write!(f, "monitor for {name} has started successfully"),
            EventKind::StartedWithFailure => {
                write!(f, "monitor for {name} has started but server is down")
            }
            EventKind::Fail => write!(f, "server {name} is down!"),
            EventKind::Recovered => write!(f, "server {name} has recovered"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
