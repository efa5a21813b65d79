//! Cache facade over the external cache backend.
//!
//! Results are memoized as JSON strings keyed by a deterministic hash of
//! (operation, subject id, normalized parameters): identical requests
//! collide, differing ones never do. Reads are optimistic (get before
//! compute) and writes unconditional after a successful compute; last writer
//! wins, which is safe because results are pure functions of their inputs
//! within the TTL window.

use dashmap::DashMap;
use redis::{aio::ConnectionManager, AsyncCommands, RedisError};
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait::async_trait]
pub trait CacheFacade: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    /// Delete every key starting with the prefix; returns the count removed.
    async fn delete_pattern(&self, prefix: &str) -> Result<u64, CacheError>;
}

/// `<namespace>:<subject>:<param-digest>` — the subject id stays in clear so
/// per-subject invalidation can use `delete_pattern`.
pub fn cache_key(namespace: &str, subject: Uuid, params: &str) -> String {
    let digest = Sha256::digest(params.as_bytes());
    format!("{}:{}:{}", namespace, subject, hex::encode(&digest[..16]))
}

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl CacheFacade for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn delete_pattern(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(format!("{prefix}*"))
            .query_async(&mut conn)
            .await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let removed = keys.len() as u64;
        conn.del::<_, ()>(keys).await?;
        Ok(removed)
    }
}

/// Process-local facade for tests and single-node development.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CacheFacade for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                let (value, deadline) = entry.value();
                if Instant::now() < *deadline {
                    return Ok(Some(value.clone()));
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete_pattern(&self, prefix: &str) -> Result<u64, CacheError> {
        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        let removed = doomed.len() as u64;
        for key in doomed {
            self.entries.remove(&key);
        }
        Ok(removed)
    }
}
