//! Per-guild cache key index.
//!
//! Remembers every settings cache key populated for a guild so a save can
//! evict exactly that guild's entries. Keys stay recorded after an eviction:
//! a reader racing a save may re-populate an entry, and the next save for
//! the guild must still reach it. The index is never trimmed.
//!
//! Only valid when every reader and writer shares this process, i.e. with
//! the in-process cache. Redis deployments use the index stored in Redis.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::GuildId;
use crate::infrastructure::cache::CacheKeyIndex;
use crate::shared::error::AppError;

#[derive(Debug, Default)]
pub struct GuildCacheKeys {
    keys: DashMap<GuildId, Vec<String>>,
}

impl GuildCacheKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` under `guild_id`. Returns `false` if it was already known.
    pub fn record(&self, guild_id: GuildId, key: &str) -> bool {
        let mut keys = self.keys.entry(guild_id).or_default();
        if keys.iter().any(|existing| existing == key) {
            return false;
        }
        keys.push(key.to_string());
        true
    }

    /// Snapshot of the keys recorded for `guild_id`, in recording order.
    pub fn keys_for(&self, guild_id: GuildId) -> Vec<String> {
        self.keys
            .get(&guild_id)
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, guild_id: GuildId, key: &str) -> bool {
        self.keys
            .get(&guild_id)
            .is_some_and(|keys| keys.iter().any(|existing| existing == key))
    }

    /// Number of guilds with at least one recorded key.
    pub fn guild_count(&self) -> usize {
        self.keys.len()
    }
}

#[async_trait]
impl CacheKeyIndex for GuildCacheKeys {
    async fn record_key(&self, guild_id: GuildId, key: &str) -> Result<bool, AppError> {
        Ok(self.record(guild_id, key))
    }

    async fn recorded_keys(&self, guild_id: GuildId) -> Result<Vec<String>, AppError> {
        Ok(self.keys_for(guild_id))
    }
}
