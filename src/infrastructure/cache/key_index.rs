//! Cache Key Index
//!
//! Remembers which settings cache keys were populated for each guild, so a
//! save can evict every include variant of that guild. The index must be
//! visible to every process sharing the cache: an in-process index next to a
//! shared Redis cache would only evict the variants its own process read.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, instrument};

use super::keys;
use crate::domain::GuildId;
use crate::shared::error::AppError;

/// Guild to cache-key index.
#[async_trait]
pub trait CacheKeyIndex: Send + Sync {
    /// Record `key` under `guild_id`. Returns `false` if it was already known.
    async fn record_key(&self, guild_id: GuildId, key: &str) -> Result<bool, AppError>;

    /// Every key recorded under `guild_id`.
    async fn recorded_keys(&self, guild_id: GuildId) -> Result<Vec<String>, AppError>;
}

/// Index kept as one Redis set per (kind, guild), next to the cached entries.
#[derive(Clone)]
pub struct RedisCacheKeys {
    conn: ConnectionManager,
    kind: &'static str,
    prefix: Option<String>,
}

impl RedisCacheKeys {
    pub fn new(conn: ConnectionManager, kind: &'static str, prefix: Option<String>) -> Self {
        Self { conn, kind, prefix }
    }

    fn set_key(&self, guild_id: GuildId) -> String {
        index_set_key(self.prefix.as_deref(), self.kind, guild_id)
    }
}

fn index_set_key(prefix: Option<&str>, kind: &str, guild_id: GuildId) -> String {
    format!(
        "{}{}",
        prefix.unwrap_or_default(),
        keys::module_settings_index(kind, guild_id)
    )
}

#[async_trait]
impl CacheKeyIndex for RedisCacheKeys {
    #[instrument(skip(self), fields(kind = self.kind), level = "debug")]
    async fn record_key(&self, guild_id: GuildId, key: &str) -> Result<bool, AppError> {
        let set_key = self.set_key(guild_id);
        let mut conn = self.conn.clone();

        let added: u64 = conn.sadd(&set_key, key).await?;
        debug!(set = %set_key, added, "Recorded cache key");

        Ok(added > 0)
    }

    #[instrument(skip(self), fields(kind = self.kind), level = "debug")]
    async fn recorded_keys(&self, guild_id: GuildId) -> Result<Vec<String>, AppError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.smembers(self.set_key(guild_id)).await?;
        Ok(members)
    }
}

impl std::fmt::Debug for RedisCacheKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheKeys")
            .field("kind", &self.kind)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
