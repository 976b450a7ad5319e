//! Settings removal.

use chrono::Duration;
use pretty_assertions::assert_eq;

use stream_sentry::application::services::{ModuleSettingsService, SettingsCacheOptions};
use stream_sentry::domain::{Snowflake, StreamerSettings};

use crate::common::{record, SettingsFixture};

#[tokio::test]
async fn test_remove_leaves_stale_entry_until_expiry() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(100);
    let settings = StreamerSettings::new(guild, true);
    fx.service.save_settings(&settings).await.unwrap();
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    let events = record(fx.service.settings_changed());

    fx.service.remove_setting(&settings).await.unwrap();

    assert_eq!(fx.store.row(&guild), None);
    assert_eq!(events.lock().len(), 1);
    // Removal does not evict, so the deleted row is still served.
    let stale = fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    assert_eq!(stale, Some(settings));

    fx.clock.advance(Duration::hours(24));
    let fresh = fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    assert_eq!(fresh, None);
}

#[tokio::test]
async fn test_remove_then_save_evicts_stale_entry() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(101);
    let settings = StreamerSettings::new(guild, true);
    fx.service.save_settings(&settings).await.unwrap();
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();

    fx.service.remove_setting(&settings).await.unwrap();
    fx.service
        .save_settings(&StreamerSettings::new(guild, false))
        .await
        .unwrap();

    let current = fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    assert_eq!(current, Some(StreamerSettings::new(guild, false)));
}

#[tokio::test]
async fn test_remove_evicts_when_configured() {
    let fx = SettingsFixture::with_options(SettingsCacheOptions {
        invalidate_on_remove: true,
        ..SettingsCacheOptions::default()
    });
    let guild = Snowflake(102);
    let settings = StreamerSettings::new(guild, true);
    fx.service.save_settings(&settings).await.unwrap();
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();

    fx.service.remove_setting(&settings).await.unwrap();

    assert_eq!(fx.service.get_settings_by_guild(guild, &[]).await.unwrap(), None);
}

#[tokio::test]
async fn test_failed_remove_keeps_row_and_raises_nothing() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(103);
    let settings = StreamerSettings::new(guild, true);
    fx.service.save_settings(&settings).await.unwrap();
    let events = record(fx.service.settings_changed());

    fx.store.fail_next_commit();

    assert!(fx.service.remove_setting(&settings).await.is_err());
    assert!(fx.store.row(&guild).is_some());
    assert!(events.lock().is_empty());
}
