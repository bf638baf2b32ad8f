//! Availability hash writer.
//!
//! [`AvailabilitySink`] keeps one hash (e.g. `availability`) whose fields are
//! the names of the targets that are currently reachable. `started` and
//! `recovered` set the target's field; `fail` and `started_with_failure`
//! delete it. Consumers read the hash to discover healthy servers.
//!
//! The hash lives behind [`AvailabilityStore`]: [`MemoryStore`] keeps it in
//! process, [`RedisAvailabilityStore`] keeps it in a Redis hash and
//! [`PgAvailabilityStore`] keeps it in a Postgres table.
//!
//! Every store call is bounded by [`STORE_TIMEOUT`], since the driver
//! waits for each delivery before ticking the next unit.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::{OnceCell, RwLock};
use upwatch_core::{KvHashConfig, MonitorEvent};

use crate::sink::{NotificationSink, SinkError};

/// `server_url` scheme selecting the in-process store.
pub const MEMORY_STORE_URL: &str = "memory://";

/// Upper bound on connecting to a store or running one command.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum pooled connections for the Postgres store.
const PG_MAX_CONNECTIONS: u32 = 2;

// ---------------------------------------------------------------------------
// AvailabilityStore
// ---------------------------------------------------------------------------

/// Hash-of-strings storage with set and delete.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Set `field` of hash `hash` to `value`, replacing any previous value.
    async fn set_field(&self, hash: &str, field: &str, value: &str) -> Result<(), SinkError>;

    /// Remove `field` from hash `hash`. Removing an absent field succeeds.
    async fn delete_field(&self, hash: &str, field: &str) -> Result<(), SinkError>;
}

/// In-process store, also used by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    hashes: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one field.
    pub async fn get_field(&self, hash: &str, field: &str) -> Option<String> {
        self.hashes
            .read()
            .await
            .get(hash)
            .and_then(|h| h.get(field))
            .cloned()
    }

    /// Snapshot of all fields in a hash.
    pub async fn fields(&self, hash: &str) -> HashMap<String, String> {
        self.hashes.read().await.get(hash).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl AvailabilityStore for MemoryStore {
    async fn set_field(&self, hash: &str, field: &str, value: &str) -> Result<(), SinkError> {
        self.hashes
            .write()
            .await
            .entry(hash.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_field(&self, hash: &str, field: &str) -> Result<(), SinkError> {
        if let Some(h) = self.hashes.write().await.get_mut(hash) {
            h.remove(field);
        }
        Ok(())
    }
}

/// Postgres-backed store.
///
/// The pool connects lazily and the table is created on first use, so an
/// unavailable database surfaces as a sink error at notify time instead of
/// blocking startup.
pub struct PgAvailabilityStore {
    pool: PgPool,
    schema_ready: OnceCell<()>,
}

impl PgAvailabilityStore {
    /// Create a store for `database_url` without connecting.
    pub fn connect_lazy(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_MAX_CONNECTIONS)
            .acquire_timeout(STORE_TIMEOUT)
            .connect_lazy(database_url)?;
        Ok(Self {
            pool,
            schema_ready: OnceCell::new(),
        })
    }

    async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    "CREATE TABLE IF NOT EXISTS availability_hashes (
                        hash_name  TEXT NOT NULL,
                        field      TEXT NOT NULL,
                        value      JSONB NOT NULL,
                        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                        PRIMARY KEY (hash_name, field)
                    )",
                )
                .execute(&self.pool)
                .await?;
                tracing::info!("Availability table ready");
                Ok::<(), sqlx::Error>(())
            })
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl AvailabilityStore for PgAvailabilityStore {
    async fn set_field(&self, hash: &str, field: &str, value: &str) -> Result<(), SinkError> {
        self.ensure_schema().await?;
        sqlx::query(
            "INSERT INTO availability_hashes (hash_name, field, value)
             VALUES ($1, $2, $3::jsonb)
             ON CONFLICT (hash_name, field)
             DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .bind(hash)
        .bind(field)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_field(&self, hash: &str, field: &str) -> Result<(), SinkError> {
        self.ensure_schema().await?;
        sqlx::query("DELETE FROM availability_hashes WHERE hash_name = $1 AND field = $2")
            .bind(hash)
            .bind(field)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Redis-backed store, written with `HSET` and `HDEL`.
///
/// Connects on first use; the connection manager reconnects after a drop.
pub struct RedisAvailabilityStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisAvailabilityStore {
    /// Parse `url` without connecting.
    pub fn open(url: &str) -> Result<Self, redis::RedisError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            conn: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, SinkError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let conn = bounded(ConnectionManager::new(self.client.clone())).await?;
                tracing::info!("Connected to availability hash server");
                Ok::<_, SinkError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl AvailabilityStore for RedisAvailabilityStore {
    async fn set_field(&self, hash: &str, field: &str, value: &str) -> Result<(), SinkError> {
        let mut conn = self.connection().await?;
        bounded(conn.hset::<_, _, _, ()>(hash, field, value)).await
    }

    async fn delete_field(&self, hash: &str, field: &str) -> Result<(), SinkError> {
        let mut conn = self.connection().await?;
        bounded(conn.hdel::<_, _, ()>(hash, field)).await
    }
}

/// Run a Redis call under [`STORE_TIMEOUT`].
async fn bounded<T, F>(call: F) -> Result<T, SinkError>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    let result = tokio::time::timeout(STORE_TIMEOUT, call)
        .await
        .map_err(|_| SinkError::StoreTimeout(STORE_TIMEOUT))?;
    Ok(result?)
}

// ---------------------------------------------------------------------------
// AvailabilitySink
// ---------------------------------------------------------------------------

/// Mirrors confirmed availability into an [`AvailabilityStore`] hash.
pub struct AvailabilitySink<S> {
    store: S,
    hash_name: String,
    unit_data: HashMap<String, serde_json::Value>,
}

impl<S: AvailabilityStore> AvailabilitySink<S> {
    pub fn new(store: S, config: &KvHashConfig) -> Self {
        Self {
            store,
            hash_name: config.hash_name.clone(),
            unit_data: config.unit_data.clone(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// JSON stored for a reachable target.
    fn value_for(&self, target: &str) -> Result<String, serde_json::Error> {
        match self.unit_data.get(target) {
            Some(data) => serde_json::to_string(data),
            None => serde_json::to_string(&serde_json::json!({ "server": target })),
        }
    }
}

#[async_trait]
impl<S: AvailabilityStore> NotificationSink for AvailabilitySink<S> {
    fn name(&self) -> &str {
        "kv_hash"
    }

    async fn notify(&self, event: &MonitorEvent) -> Result<(), SinkError> {
        let target = event.target();
        if event.kind().reports_up() {
            let value = self.value_for(target)?;
            self.store.set_field(&self.hash_name, target, &value).await
        } else {
            self.store.delete_field(&self.hash_name, target).await
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
