//! Key-value backend behind the limiters, the audit log and the share store.
//!
//! Two implementations of one capability trait, picked once at startup:
//! Redis when `REDIS_URL` is configured, otherwise a process-local map.
//! The in-memory variant does not survive restarts and is not shared across
//! instances, so every limit effectively multiplies by instance count.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::clock::Clock;

// Full sweep of expired entries once the in-memory map grows past this
const MAX_MEMORY_ENTRIES: usize = 10_000;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Minimal get/set/incr surface shared by both backends.
///
/// `incr_expire` must re-arm the TTL on every increment so a window can't
/// expire out from under a late first increment.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn put_ex(&self, key: &str, value: String, ttl_secs: i64) -> Result<(), StoreError>;

    /// Current counter value, 0 when absent.
    async fn get_count(&self, key: &str) -> Result<u64, StoreError>;

    /// Increment every key by one and (re)set its TTL, in a single batch.
    /// Returns the post-increment value of each key in order.
    async fn incr_expire(&self, keys: &[&str], ttl_secs: i64) -> Result<Vec<u64>, StoreError>;
}

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(500));

        let client = Client::open(url)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn put_ex(&self, key: &str, value: String, ttl_secs: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_secs as u64).await?;
        Ok(())
    }

    async fn get_count(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<u64> = conn.get(key).await?;
        Ok(value.unwrap_or(0))
    }

    async fn incr_expire(&self, keys: &[&str], ttl_secs: i64) -> Result<Vec<u64>, StoreError> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.incr(*key, 1u64);
            pipe.expire(*key, ttl_secs).ignore();
        }
        let counts: Vec<u64> = pipe.query_async(&mut conn).await?;
        Ok(counts)
    }
}

struct MemoryEntry {
    data: String,
    expires_at: i64, // unix seconds
}

/// Process-local fallback with the same lazy-expiry semantics the remote
/// backend gets from TTLs. Grows until the sweep threshold, then drops
/// everything expired before inserting.
pub struct MemoryStore {
    map: DashMap<String, MemoryEntry>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            map: DashMap::new(),
            clock,
        }
    }

    fn now(&self) -> i64 {
        self.clock.now_utc().timestamp()
    }

    fn sweep_expired(&self, now: i64) {
        if self.map.len() > MAX_MEMORY_ENTRIES {
            self.map.retain(|_, entry| entry.expires_at > now);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.map.len()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn fetch(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.now();
        match self.map.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.data.clone())),
            Some(entry) => {
                // read-triggered eviction of the expired entry
                drop(entry);
                self.map.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put_ex(&self, key: &str, value: String, ttl_secs: i64) -> Result<(), StoreError> {
        let now = self.now();
        self.sweep_expired(now);
        self.map.insert(
            key.to_string(),
            MemoryEntry {
                data: value,
                expires_at: now + ttl_secs,
            },
        );
        Ok(())
    }

    async fn get_count(&self, key: &str) -> Result<u64, StoreError> {
        let value = self.fetch(key).await?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    async fn incr_expire(&self, keys: &[&str], ttl_secs: i64) -> Result<Vec<u64>, StoreError> {
        let now = self.now();
        let mut counts = Vec::with_capacity(keys.len());
        for key in keys {
            let mut entry = self
                .map
                .entry((*key).to_string())
                .or_insert_with(|| MemoryEntry {
                    data: "0".to_string(),
                    expires_at: now + ttl_secs,
                });
            if entry.expires_at <= now {
                entry.data = "0".to_string();
            }
            let count: u64 = entry.data.parse().unwrap_or(0) + 1;
            entry.data = count.to_string();
            entry.expires_at = now + ttl_secs;
            counts.push(count);
        }
        Ok(counts)
    }
}
