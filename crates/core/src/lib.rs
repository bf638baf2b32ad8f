//! Shared domain types for the upwatch availability monitor.
//!
//! - [`Status`]: tri-state availability of a target.
//! - [`MonitorEvent`] / [`EventKind`]: what a unit announces to sinks.
//! - [`config`] / [`loader`]: the configuration document and how it is found.

pub mod config;
pub mod error;
pub mod event;
pub mod loader;
pub mod status;

pub use config::{
    ChatConfig, KvHashConfig, MonitorConfig, SinkConfig, StoreBackend, UnitConfig, UnitTiming,
};
pub use error::CoreError;
pub use event::{EventKind, MonitorEvent};
pub use status::Status;
