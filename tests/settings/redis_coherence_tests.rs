//! Settings cache coherence across processes sharing one Redis.
//!
//! Needs a running Redis; skipped unless `TEST_REDIS_URL` is set.

use std::sync::Arc;

use chrono::Utc;
use pretty_assertions::assert_eq;

use stream_sentry::application::services::{
    ModuleSettingsService, ModuleSettingsServiceImpl, SettingsCacheOptions,
};
use stream_sentry::domain::{
    Entity, Snowflake, StreamerChannelSettings, StreamerSettings, StreamerSettingsInclude,
};
use stream_sentry::infrastructure::cache::{create_redis_client, CacheKeyIndex, RedisCache};
use stream_sentry::infrastructure::repositories::InMemoryStore;

type RedisSettingsService =
    ModuleSettingsServiceImpl<StreamerSettings, InMemoryStore<StreamerSettings>, RedisCache>;

/// One bot process: its own connection, cache handle and key index handle.
async fn process(
    url: &str,
    prefix: &str,
    store: &Arc<InMemoryStore<StreamerSettings>>,
) -> Arc<RedisSettingsService> {
    let conn = create_redis_client(url).await.unwrap();
    let cache = RedisCache::with_prefix(conn, prefix);
    let index = cache.key_index(StreamerSettings::KIND);

    Arc::new(ModuleSettingsServiceImpl::with_key_index(
        Arc::clone(store),
        Arc::new(cache),
        Arc::new(index),
        SettingsCacheOptions::default(),
    ))
}

#[tokio::test]
async fn test_save_in_one_process_evicts_reads_of_another() {
    let Ok(url) = std::env::var("TEST_REDIS_URL") else {
        return;
    };
    let prefix = format!("sentry-test:{}:", Utc::now().timestamp_micros());
    let store = Arc::new(InMemoryStore::new());
    let writer = process(&url, &prefix, &store).await;
    let reader = process(&url, &prefix, &store).await;
    let guild = Snowflake(21);
    let with_channels = |enabled| StreamerSettings {
        channel_settings: Some(vec![StreamerChannelSettings::new(Snowflake(210), guild)]),
        ..StreamerSettings::new(guild, enabled)
    };

    writer.save_settings(&with_channels(false)).await.unwrap();
    let first = reader
        .get_settings_by_guild(guild, &[StreamerSettingsInclude::ChannelSettings])
        .await
        .unwrap()
        .unwrap();
    assert!(!first.enabled);
    assert_eq!(
        writer.key_index().recorded_keys(guild).await.unwrap(),
        vec![reader.cache_key(guild, &[StreamerSettingsInclude::ChannelSettings])]
    );

    writer.save_settings(&with_channels(true)).await.unwrap();
    let second = reader
        .get_settings_by_guild(guild, &[StreamerSettingsInclude::ChannelSettings])
        .await
        .unwrap()
        .unwrap();

    assert!(second.enabled);
}
