//! Cache coherence of the settings read path.

use std::sync::Arc;

use chrono::Duration;
use pretty_assertions::assert_eq;

use stream_sentry::application::services::{IncludeKeyOrder, ModuleSettingsService, SettingsCacheOptions};
use stream_sentry::domain::{
    Snowflake, StreamerChannelSettings, StreamerSettings, StreamerSettingsInclude, WhiteListedRole,
};
use stream_sentry::infrastructure::cache::Cache;

use crate::common::SettingsFixture;
use StreamerSettingsInclude::*;

fn settings_with_channels(guild: u64, enabled: bool) -> StreamerSettings {
    StreamerSettings {
        channel_settings: Some(vec![StreamerChannelSettings::new(
            Snowflake(guild * 10),
            Snowflake(guild),
        )]),
        ..StreamerSettings::new(Snowflake(guild), enabled)
    }
}

#[tokio::test]
async fn test_unknown_guild_then_save_then_read() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(100);

    let before = fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    assert_eq!(before, None);
    assert_eq!(fx.keys.keys_for(guild).len(), 1);

    fx.service
        .save_settings(&StreamerSettings::new(guild, true))
        .await
        .unwrap();

    let reads_before = fx.store.read_count();
    let after = fx.service.get_settings_by_guild(guild, &[]).await.unwrap();

    assert_eq!(after, Some(StreamerSettings::new(guild, true)));
    assert_eq!(fx.store.read_count(), reads_before + 1);
}

#[tokio::test]
async fn test_save_evicts_every_include_variant() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(7);
    fx.service
        .save_settings(&settings_with_channels(7, false))
        .await
        .unwrap();

    let variants: [&[StreamerSettingsInclude]; 3] =
        [&[], &[ChannelSettings], &[StreamMessages, ChannelSettings]];
    for includes in variants {
        let cached = fx.service.get_settings_by_guild(guild, includes).await.unwrap().unwrap();
        assert!(!cached.enabled);
    }
    let reads_after_warmup = fx.store.read_count();

    fx.service
        .save_settings(&StreamerSettings::new(guild, true))
        .await
        .unwrap();

    for includes in variants {
        let fresh = fx.service.get_settings_by_guild(guild, includes).await.unwrap().unwrap();
        assert!(fresh.enabled);
    }
    assert_eq!(fx.store.read_count(), reads_after_warmup + variants.len());
}

#[tokio::test]
async fn test_cache_hit_skips_store() {
    let fx = SettingsFixture::new();
    fx.service
        .save_settings(&StreamerSettings::new(Snowflake(1), true))
        .await
        .unwrap();

    fx.service.get_settings_by_guild(Snowflake(1), &[ChannelSettings]).await.unwrap();
    fx.service.get_settings_by_guild(Snowflake(1), &[ChannelSettings]).await.unwrap();

    assert_eq!(fx.store.read_count(), 1);
}

#[tokio::test]
async fn test_repeated_reads_record_one_key() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(2);

    fx.service.get_settings_by_guild(guild, &[StreamMessages]).await.unwrap();
    fx.service.get_settings_by_guild(guild, &[StreamMessages]).await.unwrap();

    assert_eq!(
        fx.keys.keys_for(guild),
        vec!["setting:StreamerSettings:guild:2:includes:stream_messages".to_string()]
    );
}

#[tokio::test]
async fn test_include_order_is_part_of_the_key() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(3);
    fx.service
        .save_settings(&StreamerSettings::new(guild, true))
        .await
        .unwrap();

    fx.service
        .get_settings_by_guild(guild, &[ChannelSettings, WhiteListedRoleIds])
        .await
        .unwrap();
    fx.service
        .get_settings_by_guild(guild, &[WhiteListedRoleIds, ChannelSettings])
        .await
        .unwrap();

    assert_eq!(fx.keys.keys_for(guild).len(), 2);
    assert_eq!(fx.store.read_count(), 2);
}

#[tokio::test]
async fn test_sorted_include_order_shares_entry() {
    let fx = SettingsFixture::with_options(SettingsCacheOptions {
        include_key_order: IncludeKeyOrder::Sorted,
        ..SettingsCacheOptions::default()
    });
    let guild = Snowflake(3);
    fx.service
        .save_settings(&StreamerSettings::new(guild, true))
        .await
        .unwrap();

    fx.service
        .get_settings_by_guild(guild, &[ChannelSettings, WhiteListedRoleIds])
        .await
        .unwrap();
    fx.service
        .get_settings_by_guild(guild, &[WhiteListedRoleIds, ChannelSettings])
        .await
        .unwrap();

    assert_eq!(fx.keys.keys_for(guild).len(), 1);
    assert_eq!(fx.store.read_count(), 1);
}

#[tokio::test]
async fn test_entry_expires_after_ttl() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(4);
    fx.service
        .save_settings(&StreamerSettings::new(guild, true))
        .await
        .unwrap();

    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    let key = fx.service.cache_key(guild, &[]);

    fx.clock.advance(Duration::hours(24) - Duration::seconds(1));
    assert!(fx.cache.exists(&key).await.unwrap());
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    assert_eq!(fx.store.read_count(), 1);

    fx.clock.advance(Duration::seconds(1));
    assert!(!fx.cache.exists(&key).await.unwrap());
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    assert_eq!(fx.store.read_count(), 2);
}

#[tokio::test]
async fn test_expiry_is_absolute_from_insertion() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(5);
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();

    // Hits do not extend the lifetime.
    for _ in 0..23 {
        fx.clock.advance(Duration::hours(1));
        fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    }
    assert_eq!(fx.store.read_count(), 1);

    fx.clock.advance(Duration::hours(1));
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    assert_eq!(fx.store.read_count(), 2);
}

#[tokio::test]
async fn test_save_leaves_other_guilds_cached() {
    let fx = SettingsFixture::new();
    for guild in [1, 2] {
        fx.service
            .save_settings(&StreamerSettings::new(Snowflake(guild), false))
            .await
            .unwrap();
        fx.service.get_settings_by_guild(Snowflake(guild), &[]).await.unwrap();
    }
    let reads = fx.store.read_count();

    fx.service
        .save_settings(&StreamerSettings::new(Snowflake(1), true))
        .await
        .unwrap();
    let other = fx.service.get_settings_by_guild(Snowflake(2), &[]).await.unwrap();

    assert_eq!(other, Some(StreamerSettings::new(Snowflake(2), false)));
    assert_eq!(fx.store.read_count(), reads);
}

#[tokio::test]
async fn test_keys_survive_invalidation() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(6);
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    let key = fx.service.cache_key(guild, &[]);

    fx.service
        .save_settings(&StreamerSettings::new(guild, false))
        .await
        .unwrap();
    assert!(fx.keys.contains(guild, &key));

    // Re-populated after the first save, evicted by the second.
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    fx.service
        .save_settings(&StreamerSettings::new(guild, true))
        .await
        .unwrap();

    let current = fx.service.get_settings_by_guild(guild, &[]).await.unwrap().unwrap();
    assert!(current.enabled);
}

#[tokio::test]
async fn test_save_merges_into_existing_row() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(8);
    let original = StreamerSettings {
        white_listed_role_ids: Some(vec![WhiteListedRole::new(Snowflake(80), guild)]),
        ..settings_with_channels(8, false)
    };
    fx.service.save_settings(&original).await.unwrap();

    // Navigations left unloaded keep their stored rows.
    let update = StreamerSettings {
        streamer_role_enabled: true,
        role_id: Snowflake(81),
        channel_settings: Some(Vec::new()),
        ..StreamerSettings::new(guild, true)
    };
    fx.service.save_settings(&update).await.unwrap();

    let stored = fx
        .service
        .get_settings_by_guild(guild, &[ChannelSettings, WhiteListedRoleIds])
        .await
        .unwrap()
        .unwrap();

    assert!(stored.enabled);
    assert!(stored.streamer_role_enabled);
    assert_eq!(stored.role_id, Snowflake(81));
    assert_eq!(stored.channel_settings, Some(Vec::new()));
    assert_eq!(stored.white_listed_role_ids, original.white_listed_role_ids);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_record_every_key() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(9);
    let include_sets: Vec<Vec<StreamerSettingsInclude>> = vec![
        vec![],
        vec![ChannelSettings],
        vec![StreamMessages],
        vec![WhiteListedRoleIds],
        vec![ChannelSettings, StreamMessages],
        vec![StreamMessages, ChannelSettings],
    ];

    let reads = (0..4).flat_map(|_| include_sets.clone()).map(|includes| {
        let service = Arc::clone(&fx.service);
        tokio::spawn(async move { service.get_settings_by_guild(guild, &includes).await })
    });
    for result in futures::future::join_all(reads).await {
        result.unwrap().unwrap();
    }

    assert_eq!(fx.keys.keys_for(guild).len(), include_sets.len());
}

#[tokio::test]
async fn test_services_sharing_a_key_index_stay_coherent() {
    let fx = SettingsFixture::new();
    let reader = fx.sibling(Some(Arc::clone(&fx.keys)));
    let guild = Snowflake(12);

    fx.service
        .save_settings(&settings_with_channels(12, false))
        .await
        .unwrap();
    let first = reader
        .get_settings_by_guild(guild, &[ChannelSettings])
        .await
        .unwrap()
        .unwrap();
    assert!(!first.enabled);

    // The writer never read this variant itself.
    fx.service
        .save_settings(&settings_with_channels(12, true))
        .await
        .unwrap();
    let second = reader
        .get_settings_by_guild(guild, &[ChannelSettings])
        .await
        .unwrap()
        .unwrap();

    assert!(second.enabled);
    assert_eq!(second.channel_settings, settings_with_channels(12, true).channel_settings);
}

#[tokio::test]
async fn test_private_key_index_only_evicts_its_own_reads() {
    let fx = SettingsFixture::new();
    let reader = fx.sibling(None);
    let guild = Snowflake(13);

    fx.service
        .save_settings(&StreamerSettings::new(guild, false))
        .await
        .unwrap();
    reader.get_settings_by_guild(guild, &[]).await.unwrap();
    fx.service
        .save_settings(&StreamerSettings::new(guild, true))
        .await
        .unwrap();

    let key = reader.cache_key(guild, &[]);
    assert!(fx.keys.keys_for(guild).is_empty());
    assert!(fx.cache.exists(&key).await.unwrap());
}
