//! Integration tests for the tick loop and startup wiring.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use upwatch_agent::{Monitor, MonitoredUnit, Probe, SetupError};
use upwatch_core::{
    loader, EventKind, KvHashConfig, MonitorEvent, SinkConfig, Status, UnitConfig, UnitTiming,
};
use upwatch_events::{Dispatcher, NotificationSink, SinkError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct ScriptedProbe(Mutex<VecDeque<bool>>);

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self) -> bool {
        self.0.lock().unwrap().pop_front().unwrap_or(true)
    }
}

/// Records `(target, kind)` for every event.
#[derive(Default)]
struct Journal {
    entries: Mutex<Vec<(String, EventKind)>>,
}

#[async_trait]
impl NotificationSink for Journal {
    fn name(&self) -> &str {
        "journal"
    }

    async fn notify(&self, event: &MonitorEvent) -> Result<(), SinkError> {
        self.entries
            .lock()
            .unwrap()
            .push((event.target().to_string(), event.kind()));
        Ok(())
    }
}

fn monitor(readings: &[(&str, &[bool])], journal: &Arc<Journal>) -> Monitor {
    let mut dispatcher = Dispatcher::new();
    dispatcher.add(Arc::clone(journal) as Arc<dyn NotificationSink>);
    let dispatcher = Arc::new(dispatcher);

    let units = readings
        .iter()
        .map(|(name, script)| {
            let probe = ScriptedProbe(Mutex::new(script.iter().copied().collect()));
            MonitoredUnit::new(
                *name,
                UnitTiming::default(),
                Box::new(probe),
                Arc::clone(&dispatcher),
            )
        })
        .collect();

    Monitor::new(units, dispatcher, Duration::from_millis(5))
}

// ---------------------------------------------------------------------------
// Tick loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tick_all_visits_units_in_order() {
    let journal = Arc::new(Journal::default());
    let mut monitor = monitor(
        &[("alpha", &[true]), ("beta", &[false]), ("gamma", &[true])],
        &journal,
    );

    monitor.tick_all().await;

    let entries = journal.entries.lock().unwrap().clone();
    assert_eq!(
        entries,
        vec![
            ("alpha".to_string(), EventKind::Started),
            ("beta".to_string(), EventKind::StartedWithFailure),
            ("gamma".to_string(), EventKind::Started),
        ]
    );

    let statuses: Vec<Status> = monitor.units().iter().map(|u| u.status()).collect();
    assert_eq!(statuses, vec![Status::Up, Status::Down, Status::Up]);
}

#[tokio::test]
async fn run_with_cancelled_token_does_nothing() {
    let journal = Arc::new(Journal::default());
    let mut monitor = monitor(&[("alpha", &[true])], &journal);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let rounds = monitor.run(cancel).await;

    assert_eq!(rounds, 0);
    assert!(journal.entries.lock().unwrap().is_empty());
    assert_eq!(monitor.units()[0].status(), Status::Unknown);
}

#[tokio::test]
async fn run_stops_after_cancellation() {
    let journal = Arc::new(Journal::default());
    let mut monitor = monitor(&[("alpha", &[true]), ("beta", &[true])], &journal);

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        stopper.cancel();
    });

    let rounds = tokio::time::timeout(Duration::from_secs(5), monitor.run(cancel))
        .await
        .expect("loop should stop once cancelled");

    assert!(rounds >= 1);
    let entries = journal.entries.lock().unwrap().clone();
    assert_eq!(entries.len(), 2, "only the start events are announced");
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

#[tokio::test]
async fn from_config_builds_units_and_sinks() {
    let config = loader::parse(
        r#"
sinks:
  - type: console
  - type: kv_hash
    server_url: "memory://"
    hash_name: availability
units:
  - name: web
    proto: http
    url: "http://127.0.0.1:1/"
    check_interval: 30
  - name: api
    proto: http
    url: "https://127.0.0.1:1/health"
"#,
    )
    .unwrap();

    let monitor = Monitor::from_config(&config, Duration::from_millis(10)).unwrap();

    assert_eq!(monitor.dispatcher().len(), 2);
    assert_eq!(monitor.tick_duration(), Duration::from_millis(10));

    let names: Vec<&str> = monitor.units().iter().map(|u| u.name()).collect();
    assert_eq!(names, vec!["web", "api"]);
    assert_eq!(monitor.units()[0].timing().check_interval, 30);
    assert_eq!(monitor.units()[1].timing(), UnitTiming::default());
}

#[tokio::test]
async fn from_config_without_sinks_is_allowed() {
    let config = loader::parse(
        "units:\n  - name: web\n    proto: http\n    url: \"http://127.0.0.1:1/\"\n",
    )
    .unwrap();

    let monitor = Monitor::from_config(&config, Duration::from_secs(1)).unwrap();

    assert!(monitor.dispatcher().is_empty());
    assert_eq!(monitor.units().len(), 1);
}

#[test]
fn unknown_protocol_is_rejected() {
    let mut unit = UnitConfig::http("db", "http://127.0.0.1:5432/");
    unit.proto = "postgres".to_string();

    let err = upwatch_agent::factory::build_probe(&unit).err();

    assert_matches!(
        err,
        Some(SetupError::InvalidProtocol { unit, proto }) if unit == "db" && proto == "postgres"
    );
}

#[test]
fn missing_url_is_rejected() {
    let mut unit = UnitConfig::http("web", "http://127.0.0.1/");
    unit.url = None;

    let err = upwatch_agent::factory::build_probe(&unit).err();

    assert_matches!(err, Some(SetupError::MissingField { field: "url", .. }));
}

#[test]
fn legacy_redis_hash_sink_is_wired_to_redis() {
    let config = loader::parse(
        "listeners:\n  - type: redis_hash\n    server_url: \"redis://localhost:6379\"\n",
    )
    .unwrap();

    let dispatcher = upwatch_agent::factory::build_dispatcher(&config.sinks).unwrap();

    assert_eq!(dispatcher.len(), 1);
}

#[test]
fn unsupported_store_scheme_fails_at_setup() {
    let sink = SinkConfig::KvHash(KvHashConfig {
        server_url: "mongodb://db:27017".into(),
        ..KvHashConfig::default()
    });

    let err = upwatch_agent::factory::build_sink(&sink).err();

    assert_matches!(err, Some(SetupError::StoreUrl(msg)) if msg.contains("mongodb://"));
}

#[test]
fn unsupported_store_scheme_fails_config_validation() {
    let result = loader::parse("sinks:\n  - type: kv_hash\n    server_url: \"mysql://db/upwatch\"\n");

    assert_matches!(result, Err(upwatch_core::CoreError::Validation(_)));
}
