//! Cache Service
//!
//! Generic cache trait and the Redis implementation.
//!
//! Values are stored as JSON so every backend shares one encoding and a
//! cached `None` (`null`) stays distinguishable from a miss.
//!
//! # Example
//!
//! ```rust,ignore
//! use stream_sentry::infrastructure::cache::{Cache, RedisCache};
//!
//! let cache = RedisCache::new(redis_connection);
//!
//! cache.set_ex("setting:StreamerSettings:guild:1:includes:", &settings, 86_400).await?;
//! let cached: Option<Option<StreamerSettings>> = cache.get("setting:...").await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use super::key_index::RedisCacheKeys;
use crate::shared::error::AppError;

/// Generic cache trait for abstracting cache operations.
///
/// Implementations must be safe to share between concurrent tasks.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Retrieves a live value from the cache by key.
    ///
    /// # Returns
    /// * `Ok(Some(T))` - If the key exists and deserialization succeeds
    /// * `Ok(None)` - If the key does not exist or has expired
    /// * `Err(AppError)` - If a cache or deserialization error occurs
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError>;

    /// Stores a value that expires `seconds` from now.
    async fn set_ex<T: Serialize + Sync + Send>(
        &self,
        key: &str,
        value: &T,
        seconds: u64,
    ) -> Result<(), AppError>;

    /// Deletes a key. Deleting a missing key is a no-op returning `Ok(false)`.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;

    /// Checks if a live key exists in the cache.
    async fn exists(&self, key: &str) -> Result<bool, AppError>;

    /// Deletes multiple keys, returning how many existed.
    async fn delete_many(&self, keys: &[&str]) -> Result<u64, AppError>;
}

/// Return the cached value for `key`, or compute, store and return it.
///
/// The computed value expires `seconds` after insertion. Concurrent callers
/// that miss on the same key each run `compute`; the last write wins.
pub async fn get_or_set_ex<C, T, F, Fut>(
    cache: &C,
    key: &str,
    seconds: u64,
    compute: F,
) -> Result<T, AppError>
where
    C: Cache,
    T: Serialize + DeserializeOwned + Send + Sync,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    if let Some(value) = cache.get::<T>(key).await? {
        return Ok(value);
    }

    let value = compute().await?;
    cache.set_ex(key, &value, seconds).await?;

    Ok(value)
}

/// Serializes a value to JSON string.
pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| {
        warn!("Cache serialization error: {}", e);
        AppError::Internal(format!("Cache serialization failed: {}", e))
    })
}

/// Deserializes a JSON string to the target type.
pub(crate) fn deserialize<T: DeserializeOwned>(data: &str) -> Result<T, AppError> {
    serde_json::from_str(data).map_err(|e| {
        warn!("Cache deserialization error: {}", e);
        AppError::Internal(format!("Cache deserialization failed: {}", e))
    })
}

/// Redis-backed cache implementation.
///
/// Shares cached settings between bot processes. Expiry is delegated to
/// Redis `SET EX`.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    /// Optional key prefix for namespacing
    prefix: Option<Arc<str>>,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn, prefix: None }
    }

    /// Creates a cache whose keys are all prefixed with `prefix`.
    pub fn with_prefix(conn: ConnectionManager, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            conn,
            prefix: Some(prefix.into()),
        }
    }

    /// Key index for settings of `kind`, stored in the same Redis under the
    /// same prefix, so every process sharing this cache shares the index.
    pub fn key_index(&self, kind: &'static str) -> RedisCacheKeys {
        RedisCacheKeys::new(
            self.conn.clone(),
            kind,
            self.prefix.as_deref().map(str::to_string),
        )
    }

    fn format_key(&self, key: &str) -> String {
        format_key(self.prefix.as_deref(), key)
    }
}

fn format_key(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}{}", prefix, key),
        None => key.to_string(),
    }
}

#[async_trait]
impl Cache for RedisCache {
    #[instrument(skip(self), level = "debug")]
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.conn.clone();

        let result: Option<String> = conn.get(&full_key).await?;

        match result {
            Some(data) => {
                debug!(key = %full_key, "Cache hit");
                Ok(Some(deserialize(&data)?))
            }
            None => {
                debug!(key = %full_key, "Cache miss");
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
        let full_key = self.format_key(key);
        let data = serialize(value)?;
        let mut conn = self.conn.clone();

        let _: () = conn.set_ex(&full_key, data, seconds).await?;
        debug!(key = %full_key, ttl = seconds, "Cache set with expiry");

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.conn.clone();

        let deleted: u64 = conn.del(&full_key).await?;
        let existed = deleted > 0;

        debug!(key = %full_key, deleted = existed, "Cache delete");

        Ok(existed)
    }

    #[instrument(skip(self), level = "debug")]
    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.conn.clone();

        let exists: bool = conn.exists(&full_key).await?;

        Ok(exists)
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_many(&self, keys: &[&str]) -> Result<u64, AppError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let full_keys: Vec<String> = keys.iter().map(|k| self.format_key(k)).collect();
        let mut conn = self.conn.clone();

        let deleted: u64 = conn.del(full_keys.as_slice()).await?;
        debug!(count = deleted, "Cache delete many");

        Ok(deleted)
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
