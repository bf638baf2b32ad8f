//! `upwatch-agent` library crate.
//!
//! Probes, the per-target state machine, the tick loop and the startup
//! factory. The binary entrypoint lives in `main.rs`.

pub mod driver;
pub mod factory;
pub mod probe;
pub mod unit;

pub use driver::{Monitor, DEFAULT_TICK};
pub use factory::SetupError;
pub use probe::{HttpProbe, Probe};
pub use unit::MonitoredUnit;
