//! Common Test Utilities
//!
//! Shared fixtures: an in-memory settings store, a manually driven clock,
//! a key index and the settings service built over them.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use stream_sentry::application::events::Subscribers;
use stream_sentry::application::services::{
    GuildCacheKeys, ModuleSettingsServiceImpl, SettingsCacheOptions,
};
use stream_sentry::domain::StreamerSettings;
use stream_sentry::infrastructure::cache::MemoryCache;
use stream_sentry::infrastructure::repositories::InMemoryStore;
use stream_sentry::shared::clock::ManualClock;

pub type SettingsService =
    ModuleSettingsServiceImpl<StreamerSettings, InMemoryStore<StreamerSettings>, MemoryCache>;

/// Settings service over in-memory store and cache, with a frozen clock.
pub struct SettingsFixture {
    pub store: Arc<InMemoryStore<StreamerSettings>>,
    pub cache: Arc<MemoryCache>,
    pub clock: Arc<ManualClock>,
    pub keys: Arc<GuildCacheKeys>,
    pub service: Arc<SettingsService>,
}

impl SettingsFixture {
    pub fn new() -> Self {
        Self::with_options(SettingsCacheOptions::default())
    }

    pub fn with_options(options: SettingsCacheOptions) -> Self {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()));
        let cache = Arc::new(MemoryCache::with_clock(clock.clone()));
        let store = Arc::new(InMemoryStore::new());
        let keys = Arc::new(GuildCacheKeys::new());
        let service = Arc::new(ModuleSettingsServiceImpl::with_key_index(
            Arc::clone(&store),
            Arc::clone(&cache),
            keys.clone(),
            options,
        ));

        Self {
            store,
            cache,
            clock,
            keys,
            service,
        }
    }

    /// A second service over the same store and cache, with its own index
    /// unless `keys` is given.
    pub fn sibling(&self, keys: Option<Arc<GuildCacheKeys>>) -> Arc<SettingsService> {
        let keys = keys.unwrap_or_default();
        Arc::new(ModuleSettingsServiceImpl::with_key_index(
            Arc::clone(&self.store),
            Arc::clone(&self.cache),
            keys,
            self.service.options().clone(),
        ))
    }
}

impl Default for SettingsFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Record a clone of every event dispatched to `subscribers`.
pub fn record<E: Clone + Send + Sync + 'static>(subscribers: &Subscribers<E>) -> Arc<Mutex<Vec<E>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    subscribers.subscribe(move |event: &E| {
        sink.lock().push(event.clone());
        Ok(())
    });
    seen
}
