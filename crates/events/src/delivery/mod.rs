//! Concrete notification sinks.
//!
//! Each sink implements [`NotificationSink`](crate::sink::NotificationSink)
//! and is registered with the [`Dispatcher`](crate::dispatcher::Dispatcher)
//! by the agent's factory.

pub mod availability;
pub mod chat;
pub mod console;
