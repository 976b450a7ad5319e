//! Cache Module
//!
//! Backends for the module settings cache.
//!
//! This module provides:
//! - A generic `Cache` trait for abstracting cache operations
//! - A process-local `MemoryCache` with absolute per-entry expiry
//! - A `RedisCache` for deployments running several bot processes
//! - A per-guild index of populated keys ([`CacheKeyIndex`]), stored in
//!   Redis alongside the entries when the Redis backend is used
//! - Cache key derivation in [`keys`]
//!
//! # Architecture
//!
//! ```text
//! +-------------------------+
//! |  ModuleSettingsService  |
//! +-------------------------+
//!             |
//!             v
//! +-------------------------+
//! |  Cache (CacheBackend)   |  <-- selected from configuration
//! +-------------------------+
//!        |            |
//!        v            v
//! +-------------+ +------------+
//! | MemoryCache | | RedisCache |
//! +-------------+ +------------+
//! ```

mod cache_service;
mod key_index;
mod memory_cache;

pub use cache_service::{get_or_set_ex, Cache, RedisCache};
pub use key_index::{CacheKeyIndex, RedisCacheKeys};
pub use memory_cache::MemoryCache;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, instrument};

use crate::config::{CacheBackendKind, CacheSettings};
use crate::shared::error::AppError;

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(url))]
pub async fn create_redis_client(url: &str) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Cache selected at startup.
#[derive(Debug, Clone)]
pub enum CacheBackend {
    Memory(MemoryCache),
    Redis(RedisCache),
}

/// Build the cache backend named in `settings`.
pub async fn create_cache(settings: &CacheSettings) -> Result<CacheBackend, AppError> {
    match settings.backend {
        CacheBackendKind::Memory => {
            info!("Using in-process settings cache");
            Ok(CacheBackend::Memory(MemoryCache::new()))
        }
        CacheBackendKind::Redis => {
            let url = settings
                .redis_url
                .as_deref()
                .ok_or_else(|| AppError::Config("cache.redis_url is not set".into()))?;
            let conn = create_redis_client(url).await?;
            let cache = match &settings.key_prefix {
                Some(prefix) => RedisCache::with_prefix(conn, prefix.as_str()),
                None => RedisCache::new(conn),
            };
            Ok(CacheBackend::Redis(cache))
        }
    }
}

impl CacheBackend {
    /// Key index living in the backend itself, if it is shared between
    /// processes. `None` means a process-local index is enough.
    pub fn shared_key_index(&self, kind: &'static str) -> Option<RedisCacheKeys> {
        match self {
            CacheBackend::Memory(_) => None,
            CacheBackend::Redis(cache) => Some(cache.key_index(kind)),
        }
    }
}

#[async_trait]
impl Cache for CacheBackend {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self {
            CacheBackend::Memory(cache) => cache.get(key).await,
            CacheBackend::Redis(cache) => cache.get(key).await,
        }
    }

    async fn set_ex<T: Serialize + Sync + Send>(
        &self,
        key: &str,
        value: &T,
        seconds: u64,
    ) -> Result<(), AppError> {
        match self {
            CacheBackend::Memory(cache) => cache.set_ex(key, value, seconds).await,
            CacheBackend::Redis(cache) => cache.set_ex(key, value, seconds).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        match self {
            CacheBackend::Memory(cache) => cache.delete(key).await,
            CacheBackend::Redis(cache) => cache.delete(key).await,
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        match self {
            CacheBackend::Memory(cache) => cache.exists(key).await,
            CacheBackend::Redis(cache) => cache.exists(key).await,
        }
    }

    async fn delete_many(&self, keys: &[&str]) -> Result<u64, AppError> {
        match self {
            CacheBackend::Memory(cache) => cache.delete_many(keys).await,
            CacheBackend::Redis(cache) => cache.delete_many(keys).await,
        }
    }
}

/// Cache key derivation.
///
/// # Example
/// ```rust
/// use stream_sentry::infrastructure::cache::keys;
///
/// let key = keys::module_settings("StreamerSettings", 100, &["channel_settings"]);
/// assert_eq!(key, "setting:StreamerSettings:guild:100:includes:channel_settings");
/// ```
pub mod keys {
    /// Prefix for module settings entries
    pub const MODULE_SETTINGS: &str = "setting:";

    /// Key of one (kind, guild, includes) settings entry.
    ///
    /// Include paths are joined in the order given, so the same set of
    /// includes in a different order yields a different key.
    #[inline]
    pub fn module_settings(
        kind: &str,
        guild_id: impl std::fmt::Display,
        include_paths: &[&str],
    ) -> String {
        format!(
            "{}{}:guild:{}:includes:{}",
            MODULE_SETTINGS,
            kind,
            guild_id,
            include_paths.join(",")
        )
    }

    /// Key of the set listing every populated settings key of a guild.
    #[inline]
    pub fn module_settings_index(kind: &str, guild_id: impl std::fmt::Display) -> String {
        format!("{}{}:guild:{}:keys", MODULE_SETTINGS, kind, guild_id)
    }
}
