//! Console sink: one line per event on stdout.

use std::io::Write;

use async_trait::async_trait;
use upwatch_core::MonitorEvent;

use crate::sink::{NotificationSink, SinkError};

/// Prints the rendered event message to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn notify(&self, event: &MonitorEvent) -> Result<(), SinkError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{event}")?;
        out.flush()?;
        Ok(())
    }
}
