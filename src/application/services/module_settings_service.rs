//! Module Settings Service
//!
//! Cache-aside access to per-guild module settings.
//!
//! Reads go through the cache under a key built from the settings kind, the
//! guild and the requested include paths. The key is recorded in the guild's
//! key index before the entry can be populated, so an entry never exists
//! without its index record. A save evicts every recorded key of the guild
//! after the store commit, then notifies `settings_changed` subscribers.
//!
//! The key index must be shared by every service over the same cache: a
//! save only evicts what the index it consults has seen.
//!
//! Absence is cached too: a guild without settings is stored as `null` and
//! served from cache until it expires or a save for that guild evicts it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::guild_cache_keys::GuildCacheKeys;
use crate::application::events::{SettingsChangedEvent, Subscribers};
use crate::config::{CacheSettings, DEFAULT_CACHE_TTL_SECONDS};
use crate::domain::entity::include_paths;
use crate::domain::{GuildId, ModuleSettings, ModuleSettingsStore};
use crate::infrastructure::cache::{get_or_set_ex, keys, Cache, CacheKeyIndex};
use crate::shared::error::AppError;

/// How include lists map to cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncludeKeyOrder {
    /// Paths appear in call order. `[A, B]` and `[B, A]` are separate entries.
    #[default]
    AsGiven,
    /// Paths are sorted and deduplicated first.
    Sorted,
}

/// Caching behavior of a [`ModuleSettingsServiceImpl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsCacheOptions {
    pub ttl_seconds: u64,
    /// Also evict the guild's entries when settings are removed.
    pub invalidate_on_remove: bool,
    pub include_key_order: IncludeKeyOrder,
}

impl Default for SettingsCacheOptions {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            invalidate_on_remove: false,
            include_key_order: IncludeKeyOrder::AsGiven,
        }
    }
}

impl SettingsCacheOptions {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            ttl_seconds: settings.ttl_seconds,
            invalidate_on_remove: settings.invalidate_on_remove,
            include_key_order: if settings.normalize_include_order {
                IncludeKeyOrder::Sorted
            } else {
                IncludeKeyOrder::AsGiven
            },
        }
    }
}

/// Module settings service trait
#[async_trait]
pub trait ModuleSettingsService<T: ModuleSettings>: Send + Sync {
    /// Insert or merge `settings`, evict the guild's cached reads and notify.
    async fn save_settings(&self, settings: &T) -> Result<(), AppError>;

    /// Settings of `guild_id` with `includes` loaded, or `None` if the guild
    /// has none.
    async fn get_settings_by_guild(
        &self,
        guild_id: GuildId,
        includes: &[T::Include],
    ) -> Result<Option<T>, AppError>;

    /// Delete `settings` and notify.
    async fn remove_setting(&self, settings: &T) -> Result<(), AppError>;

    /// Raised after every successful save or removal.
    fn settings_changed(&self) -> &Subscribers<SettingsChangedEvent<T>>;
}

/// Module settings service implementation.
pub struct ModuleSettingsServiceImpl<T, S, C>
where
    T: ModuleSettings,
    S: ModuleSettingsStore<T>,
    C: Cache,
{
    store: Arc<S>,
    cache: Arc<C>,
    key_index: Arc<dyn CacheKeyIndex>,
    options: SettingsCacheOptions,
    settings_changed: Subscribers<SettingsChangedEvent<T>>,
}

impl<T, S, C> ModuleSettingsServiceImpl<T, S, C>
where
    T: ModuleSettings,
    S: ModuleSettingsStore<T>,
    C: Cache,
{
    /// Service with a private in-process key index. Only coherent while it is
    /// the sole reader and writer of `cache`.
    pub fn new(store: Arc<S>, cache: Arc<C>, options: SettingsCacheOptions) -> Self {
        Self::with_key_index(store, cache, Arc::new(GuildCacheKeys::new()), options)
    }

    /// Service sharing `key_index` with every other service over the same cache.
    pub fn with_key_index(
        store: Arc<S>,
        cache: Arc<C>,
        key_index: Arc<dyn CacheKeyIndex>,
        options: SettingsCacheOptions,
    ) -> Self {
        Self {
            store,
            cache,
            key_index,
            options,
            settings_changed: Subscribers::new(),
        }
    }

    pub fn options(&self) -> &SettingsCacheOptions {
        &self.options
    }

    pub fn key_index(&self) -> &dyn CacheKeyIndex {
        self.key_index.as_ref()
    }

    /// Cache key for `guild_id` read with `includes`.
    pub fn cache_key(&self, guild_id: GuildId, includes: &[T::Include]) -> String {
        let mut paths = include_paths(includes);
        if self.options.include_key_order == IncludeKeyOrder::Sorted {
            paths.sort_unstable();
            paths.dedup();
        }
        keys::module_settings(T::KIND, guild_id, &paths)
    }

    /// Evict every cached read recorded for `guild_id`.
    ///
    /// Index and cache failures are logged and swallowed; the entries then
    /// live until their TTL runs out.
    #[instrument(skip(self), fields(kind = T::KIND))]
    pub async fn invalidate_guild(&self, guild_id: GuildId) {
        let recorded = match self.key_index.recorded_keys(guild_id).await {
            Ok(recorded) => recorded,
            Err(e) => {
                warn!(error = %e, "Failed to read cache key index");
                return;
            }
        };
        if recorded.is_empty() {
            return;
        }

        let keys: Vec<&str> = recorded.iter().map(String::as_str).collect();
        match self.cache.delete_many(&keys).await {
            Ok(evicted) => debug!(evicted, recorded = keys.len(), "Evicted cached settings"),
            Err(e) => warn!(error = %e, "Failed to evict cached settings"),
        }
    }
}

#[async_trait]
impl<T, S, C> ModuleSettingsService<T> for ModuleSettingsServiceImpl<T, S, C>
where
    T: ModuleSettings,
    S: ModuleSettingsStore<T>,
    C: Cache,
{
    #[instrument(skip(self, settings), fields(kind = T::KIND, guild_id = %settings.guild_id()))]
    async fn save_settings(&self, settings: &T) -> Result<(), AppError> {
        self.store.upsert(settings).await?;
        self.invalidate_guild(settings.guild_id()).await;

        info!(enabled = settings.enabled(), "Settings saved");
        self.settings_changed
            .dispatch(&SettingsChangedEvent::new(settings.clone()))
    }

    #[instrument(skip(self), fields(kind = T::KIND))]
    async fn get_settings_by_guild(
        &self,
        guild_id: GuildId,
        includes: &[T::Include],
    ) -> Result<Option<T>, AppError> {
        let cache_key = self.cache_key(guild_id, includes);
        let key = cache_key.as_str();
        let store = self.store.as_ref();

        if self.key_index.record_key(guild_id, key).await? {
            debug!(key, "Recorded settings cache key");
        }

        let settings = get_or_set_ex(self.cache.as_ref(), key, self.options.ttl_seconds, move || async move {
            debug!(key, "Settings cache miss");
            store.find(&guild_id, includes).await
        })
        .await?;

        Ok(settings)
    }

    #[instrument(skip(self, settings), fields(kind = T::KIND, guild_id = %settings.guild_id()))]
    async fn remove_setting(&self, settings: &T) -> Result<(), AppError> {
        self.store.delete(std::slice::from_ref(settings)).await?;
        if self.options.invalidate_on_remove {
            self.invalidate_guild(settings.guild_id()).await;
        }

        info!("Settings removed");
        self.settings_changed
            .dispatch(&SettingsChangedEvent::new(settings.clone()))
    }

    fn settings_changed(&self) -> &Subscribers<SettingsChangedEvent<T>> {
        &self.settings_changed
    }
}
