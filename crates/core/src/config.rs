//! Monitor configuration types.
//!
//! The configuration file has two lists: `sinks` (also accepted as
//! `listeners`) and `units`. Every field that has a documented default may
//! be omitted. See [`crate::loader`] for file discovery and parsing.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::CoreError;

/// Protocol name for HTTP reachability units.
pub const PROTO_HTTP: &str = "http";

/// Default ticks between checks while the target is confirmed up.
pub const DEFAULT_CHECK_INTERVAL: u32 = 5;
/// Default confirming readings required before announcing a recovery.
pub const DEFAULT_CHECK_TOLERANCE: u32 = 1;
/// Default ticks between checks while the target is not confirmed up.
pub const DEFAULT_FAIL_INTERVAL: u32 = 1;
/// Default confirming readings required before announcing a failure.
pub const DEFAULT_FAIL_TOLERANCE: u32 = 1;
/// Default probe timeout in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

const DEFAULT_HASH_NAME: &str = "availability";
const DEFAULT_STORE_URL: &str = "redis://localhost:6379";
const DEFAULT_CHAT_CHANNEL: &str = "#monitor";
const DEFAULT_CHAT_USERNAME: &str = "monitor";
const DEFAULT_CHAT_EMOJI: &str = ":robot_face:";
const DEFAULT_CHAT_API_URL: &str = "https://slack.com/api/chat.postMessage";

// ---------------------------------------------------------------------------
// MonitorConfig
// ---------------------------------------------------------------------------

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorConfig {
    /// Notification sinks, in registration order.
    #[serde(default, alias = "listeners")]
    pub sinks: Vec<SinkConfig>,

    /// Monitored targets, in tick order.
    #[serde(default)]
    pub units: Vec<UnitConfig>,
}

impl MonitorConfig {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        for unit in &self.units {
            unit.validate()?;
            if !seen.insert(unit.name.as_str()) {
                return Err(CoreError::Validation(format!(
                    "duplicate unit name '{}'",
                    unit.name
                )));
            }
        }

        for sink in &self.sinks {
            sink.validate()?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Scheduling and debounce parameters of one unit, measured in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UnitTiming {
    #[serde(default = "default_check_interval")]
    pub check_interval: u32,
    #[serde(default = "default_check_tolerance")]
    pub check_tolerance: u32,
    #[serde(default = "default_fail_interval")]
    pub fail_interval: u32,
    #[serde(default = "default_fail_tolerance")]
    pub fail_tolerance: u32,
}

impl Default for UnitTiming {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_CHECK_INTERVAL,
            check_tolerance: DEFAULT_CHECK_TOLERANCE,
            fail_interval: DEFAULT_FAIL_INTERVAL,
            fail_tolerance: DEFAULT_FAIL_TOLERANCE,
        }
    }
}

fn default_check_interval() -> u32 {
    DEFAULT_CHECK_INTERVAL
}

fn default_check_tolerance() -> u32 {
    DEFAULT_CHECK_TOLERANCE
}

fn default_fail_interval() -> u32 {
    DEFAULT_FAIL_INTERVAL
}

fn default_fail_tolerance() -> u32 {
    DEFAULT_FAIL_TOLERANCE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

/// One monitored target.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConfig {
    pub name: String,

    /// Probe protocol. Only [`PROTO_HTTP`] is supported.
    pub proto: String,

    /// Target URL, required by HTTP units.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(flatten)]
    pub timing: UnitTiming,

    /// Upper bound on a single probe, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl UnitConfig {
    /// An HTTP unit with default timing.
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            proto: PROTO_HTTP.to_string(),
            url: Some(url.into()),
            timing: UnitTiming::default(),
            timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("unit name must not be empty".into()));
        }

        let name = &self.name;
        if self.timing.check_interval == 0 {
            return Err(CoreError::Validation(format!(
                "unit '{name}': check_interval must be at least 1"
            )));
        }
        if self.timing.fail_interval == 0 {
            return Err(CoreError::Validation(format!(
                "unit '{name}': fail_interval must be at least 1"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(CoreError::Validation(format!(
                "unit '{name}': timeout_secs must be at least 1"
            )));
        }

        if self.proto == PROTO_HTTP {
            match self.url.as_deref() {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(url) => {
                    return Err(CoreError::Validation(format!(
                        "unit '{name}': url '{url}' must start with http:// or https://"
                    )));
                }
                None => {
                    return Err(CoreError::Validation(format!(
                        "unit '{name}': url is required for http units"
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// A notification sink, tagged by its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Print each event to stdout.
    Console,
    /// Maintain an availability hash in a key-value store.
    #[serde(alias = "redis_hash")]
    KvHash(KvHashConfig),
    /// Post each event to a chat channel.
    Slack(ChatConfig),
}

impl SinkConfig {
    /// Short type name used in logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            SinkConfig::Console => "console",
            SinkConfig::KvHash(_) => "kv_hash",
            SinkConfig::Slack(_) => "slack",
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        match self {
            SinkConfig::Console => Ok(()),
            SinkConfig::KvHash(cfg) => {
                if cfg.hash_name.trim().is_empty() {
                    return Err(CoreError::Validation(
                        "kv_hash sink: hash_name must not be empty".into(),
                    ));
                }
                if cfg.backend().is_none() {
                    return Err(CoreError::Validation(format!(
                        "kv_hash sink: server_url '{}' must start with redis://, postgres://, \
                         postgresql:// or memory://",
                        cfg.server_url
                    )));
                }
                Ok(())
            }
            SinkConfig::Slack(cfg) => match cfg.token.as_deref() {
                Some(token) if !token.trim().is_empty() => Ok(()),
                _ => Err(CoreError::Validation(
                    "slack sink: key 'token' is required".into(),
                )),
            },
        }
    }
}

/// Availability hash writer settings.
#[derive(Debug, Clone, Deserialize)]
pub struct KvHashConfig {
    /// Store connection URL. The scheme picks the backend: `redis://`,
    /// `postgres://` (or `postgresql://`), or `memory://` for an in-process hash.
    #[serde(default = "default_store_url")]
    pub server_url: String,

    /// Name of the hash holding one field per reachable target.
    #[serde(default = "default_hash_name")]
    pub hash_name: String,

    /// Per-target JSON stored as the field value. Targets without an entry
    /// store `{"server": <name>}`.
    #[serde(default)]
    pub unit_data: HashMap<String, serde_json::Value>,
}

/// Store implementation selected by the `server_url` scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Redis,
    Postgres,
}

impl KvHashConfig {
    /// The backend named by `server_url`, or `None` for an unsupported scheme.
    pub fn backend(&self) -> Option<StoreBackend> {
        let (scheme, _) = self.server_url.split_once("://")?;
        match scheme {
            "memory" => Some(StoreBackend::Memory),
            "redis" => Some(StoreBackend::Redis),
            "postgres" | "postgresql" => Some(StoreBackend::Postgres),
            _ => None,
        }
    }
}

impl Default for KvHashConfig {
    fn default() -> Self {
        Self {
            server_url: default_store_url(),
            hash_name: default_hash_name(),
            unit_data: HashMap::new(),
        }
    }
}

fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

fn default_hash_name() -> String {
    DEFAULT_HASH_NAME.to_string()
}

/// Chat webhook settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Bearer token for the chat API. Required.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_chat_channel")]
    pub channel: String,

    #[serde(default = "default_chat_username")]
    pub username: String,

    #[serde(default = "default_chat_emoji")]
    pub emoji: String,

    #[serde(default = "default_chat_api_url")]
    pub api_url: String,
}

fn default_chat_channel() -> String {
    DEFAULT_CHAT_CHANNEL.to_string()
}

fn default_chat_username() -> String {
    DEFAULT_CHAT_USERNAME.to_string()
}

fn default_chat_emoji() -> String {
    DEFAULT_CHAT_EMOJI.to_string()
}

fn default_chat_api_url() -> String {
    DEFAULT_CHAT_API_URL.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
