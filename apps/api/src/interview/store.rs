//! Session store — opaque session id → `SessionRecord`.
//!
//! CONTRACT: implementations must make `compare_and_swap` atomic per key. The turn
//! controller relies on it to serialize concurrent invocations for the same session;
//! it does no locking of its own. Eviction is the store's own policy (TTL for Redis).

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::interview::session::SessionRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// Stored revision matched; the new record is written.
    Swapped,
    /// Someone else wrote first.
    Conflict,
    /// The record is gone (evicted).
    Missing,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: Uuid) -> Result<Option<SessionRecord>, StoreError>;

    /// Unconditional write, used when a session is created.
    async fn put(&self, record: &SessionRecord) -> Result<(), StoreError>;

    /// Writes `record` only if the stored revision still equals `expected_revision`.
    async fn compare_and_swap(
        &self,
        expected_revision: u64,
        record: &SessionRecord,
    ) -> Result<CasOutcome, StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-process store
// ────────────────────────────────────────────────────────────────────────────

/// Used when no `REDIS_URL` is configured, and by tests. Records live until restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: Uuid) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.read().await.get(&session_id).cloned())
    }

    async fn put(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(record.session_id, record.clone());
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        expected_revision: u64,
        record: &SessionRecord,
    ) -> Result<CasOutcome, StoreError> {
        let mut sessions = self.sessions.write().await;
        let outcome = match sessions.get_mut(&record.session_id) {
            None => CasOutcome::Missing,
            Some(current) if current.revision != expected_revision => CasOutcome::Conflict,
            Some(current) => {
                *current = record.clone();
                CasOutcome::Swapped
            }
        };
        Ok(outcome)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis store
// ────────────────────────────────────────────────────────────────────────────

/// Returns 1 on swap, 0 on revision mismatch, -1 when the key is gone.
const CAS_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
  return -1
end
local decoded = cjson.decode(current)
if tonumber(decoded['revision']) ~= tonumber(ARGV[1]) then
  return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
return 1
"#;

const KEY_PREFIX: &str = "interview:session:";

/// Records stored as JSON strings with a sliding TTL; CAS runs as a Lua script so the
/// read-compare-write is atomic on the server.
pub struct RedisSessionStore {
    connection: redis::aio::MultiplexedConnection,
    ttl_secs: u64,
    cas: redis::Script,
}

impl RedisSessionStore {
    pub async fn connect(client: &redis::Client, ttl_secs: u64) -> Result<Self, StoreError> {
        let connection = client.get_multiplexed_async_connection().await?;
        info!("Redis session store connected (ttl={ttl_secs}s)");
        Ok(Self {
            connection,
            ttl_secs,
            cas: redis::Script::new(CAS_SCRIPT),
        })
    }
}

fn session_key(session_id: Uuid) -> String {
    format!("{KEY_PREFIX}{session_id}")
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session_id: Uuid) -> Result<Option<SessionRecord>, StoreError> {
        let mut con = self.connection.clone();
        let raw: Option<String> = con.get(session_key(session_id)).await?;
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn put(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let json = serde_json::to_string(record)?;
        con.set_ex::<_, _, ()>(session_key(record.session_id), json, self.ttl_secs)
            .await?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        expected_revision: u64,
        record: &SessionRecord,
    ) -> Result<CasOutcome, StoreError> {
        let mut con = self.connection.clone();
        let json = serde_json::to_string(record)?;
        let result: i64 = self
            .cas
            .key(session_key(record.session_id))
            .arg(expected_revision)
            .arg(json)
            .arg(self.ttl_secs)
            .invoke_async(&mut con)
            .await?;
        debug!(
            "CAS on session {} at revision {expected_revision} returned {result}",
            record.session_id
        );
        Ok(match result {
            1 => CasOutcome::Swapped,
            0 => CasOutcome::Conflict,
            _ => CasOutcome::Missing,
        })
    }
}
