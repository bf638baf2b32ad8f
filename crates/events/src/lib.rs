//! upwatch notification fan-out.
//!
//! - [`NotificationSink`]: the capability every notification destination
//!   implements.
//! - [`Dispatcher`]: ordered fan-out of one event to every registered sink,
//!   isolating per-sink failures.
//! - [`delivery`]: console, chat webhook and availability hash sinks
//!   (in-memory, Redis or Postgres backed).

pub mod delivery;
pub mod dispatcher;
pub mod sink;

pub use delivery::availability::{
    AvailabilitySink, AvailabilityStore, MemoryStore, PgAvailabilityStore, RedisAvailabilityStore,
    MEMORY_STORE_URL, STORE_TIMEOUT,
};
pub use delivery::chat::ChatSink;
pub use delivery::console::ConsoleSink;
pub use dispatcher::{DispatchSummary, Dispatcher};
pub use sink::{NotificationSink, SinkError};
