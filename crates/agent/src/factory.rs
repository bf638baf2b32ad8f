//! Turns configuration into sinks, probes, units and the monitor context.
//!
//! Everything here runs once at startup; any error aborts startup rather
//! than surfacing later at tick time.

use std::sync::Arc;
use std::time::Duration;

use upwatch_core::config::PROTO_HTTP;
use upwatch_core::{KvHashConfig, MonitorConfig, SinkConfig, StoreBackend, UnitConfig};
use upwatch_events::{
    AvailabilitySink, ChatSink, ConsoleSink, Dispatcher, MemoryStore, NotificationSink,
    PgAvailabilityStore, RedisAvailabilityStore,
};

use crate::driver::Monitor;
use crate::probe::{HttpProbe, Probe};
use crate::unit::MonitoredUnit;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for startup wiring failures.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The unit names a protocol with no probe implementation.
    #[error("Unit '{unit}' uses unsupported protocol '{proto}'")]
    InvalidProtocol { unit: String, proto: String },

    /// A required field was absent.
    #[error("Unit '{unit}' is missing required field '{field}'")]
    MissingField { unit: String, field: &'static str },

    /// An HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The availability store URL was rejected.
    #[error("Invalid availability store URL: {0}")]
    StoreUrl(String),
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Build one sink from its configuration.
pub fn build_sink(config: &SinkConfig) -> Result<Arc<dyn NotificationSink>, SetupError> {
    let sink: Arc<dyn NotificationSink> = match config {
        SinkConfig::Console => Arc::new(ConsoleSink::new()),
        SinkConfig::Slack(chat) => Arc::new(ChatSink::new(chat)?),
        SinkConfig::KvHash(kv) => build_availability_sink(kv)?,
    };

    tracing::info!(sink = config.type_name(), "Sink configured");
    Ok(sink)
}

/// Pick the availability store from the URL scheme. Nothing connects yet.
fn build_availability_sink(kv: &KvHashConfig) -> Result<Arc<dyn NotificationSink>, SetupError> {
    let sink: Arc<dyn NotificationSink> = match kv.backend() {
        Some(StoreBackend::Memory) => Arc::new(AvailabilitySink::new(MemoryStore::new(), kv)),
        Some(StoreBackend::Redis) => {
            let store = RedisAvailabilityStore::open(&kv.server_url)
                .map_err(|e| SetupError::StoreUrl(e.to_string()))?;
            Arc::new(AvailabilitySink::new(store, kv))
        }
        Some(StoreBackend::Postgres) => {
            let store = PgAvailabilityStore::connect_lazy(&kv.server_url)
                .map_err(|e| SetupError::StoreUrl(e.to_string()))?;
            Arc::new(AvailabilitySink::new(store, kv))
        }
        None => {
            return Err(SetupError::StoreUrl(format!(
                "unsupported scheme in '{}'",
                kv.server_url
            )))
        }
    };
    Ok(sink)
}

/// Build a dispatcher with every configured sink, in order.
pub fn build_dispatcher(configs: &[SinkConfig]) -> Result<Dispatcher, SetupError> {
    let mut dispatcher = Dispatcher::new();
    for config in configs {
        dispatcher.add(build_sink(config)?);
    }
    Ok(dispatcher)
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Build the probe for a unit's protocol.
pub fn build_probe(config: &UnitConfig) -> Result<Box<dyn Probe>, SetupError> {
    if config.proto != PROTO_HTTP {
        return Err(SetupError::InvalidProtocol {
            unit: config.name.clone(),
            proto: config.proto.clone(),
        });
    }

    let url = config.url.as_deref().ok_or_else(|| SetupError::MissingField {
        unit: config.name.clone(),
        field: "url",
    })?;

    let probe = HttpProbe::new(url, Duration::from_secs(config.timeout_secs))?;
    Ok(Box::new(probe))
}

/// Build a unit wired to `dispatcher`.
pub fn build_unit(
    config: &UnitConfig,
    dispatcher: &Arc<Dispatcher>,
) -> Result<MonitoredUnit, SetupError> {
    let probe = build_probe(config)?;
    tracing::info!(
        unit = %config.name,
        proto = %config.proto,
        check_interval = config.timing.check_interval,
        fail_interval = config.timing.fail_interval,
        "Unit configured"
    );
    Ok(MonitoredUnit::new(
        config.name.clone(),
        config.timing,
        probe,
        Arc::clone(dispatcher),
    ))
}

impl Monitor {
    /// Build the full monitor context from a loaded configuration.
    pub fn from_config(config: &MonitorConfig, tick: Duration) -> Result<Self, SetupError> {
        let dispatcher = Arc::new(build_dispatcher(&config.sinks)?);

        let units = config
            .units
            .iter()
            .map(|unit| build_unit(unit, &dispatcher))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Monitor::new(units, dispatcher, tick))
    }
}
