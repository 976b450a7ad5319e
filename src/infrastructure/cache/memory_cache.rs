//! In-process TTL cache.
//!
//! Entries carry an absolute expiration computed from the injected
//! [`Clock`] at insertion time. Expired entries are never returned; they are
//! dropped lazily on access or in bulk by [`MemoryCache::purge_expired`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};

use super::cache_service::{deserialize, serialize, Cache};
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::error::AppError;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: String,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Concurrency-safe in-memory cache.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    fn live_data(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let data = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.data.clone()),
            _ => None,
        };

        if data.is_none() {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }

        data
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    #[instrument(skip(self), level = "debug")]
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.live_data(key) {
            Some(data) => {
                debug!(key, "Cache hit");
                Ok(Some(deserialize(&data)?))
            }
            None => {
                debug!(key, "Cache miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn set_ex<T: Serialize + Sync + Send>(
        &self,
        key: &str,
        value: &T,
        seconds: u64,
    ) -> Result<(), AppError> {
        let data = serialize(value)?;
        let ttl = i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AppError::Internal(format!("Cache TTL out of range: {}s", seconds)))?;
        let expires_at = self.clock.now() + ttl;

        self.entries
            .insert(key.to_string(), CacheEntry { data, expires_at });
        debug!(key, ttl = seconds, %expires_at, "Cache set with expiry");

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let now = self.clock.now();
        let existed = self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now));

        debug!(key, deleted = existed, "Cache delete");

        Ok(existed)
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.live_data(key).is_some())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_many(&self, keys: &[&str]) -> Result<u64, AppError> {
        let mut deleted = 0;
        for key in keys {
            if self.delete(key).await? {
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
