//! Settings change notification.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use stream_sentry::application::services::ModuleSettingsService;
use stream_sentry::domain::{Snowflake, StreamerSettings};
use stream_sentry::shared::error::AppError;

use crate::common::{record, SettingsFixture};

#[tokio::test]
async fn test_save_notifies_with_saved_settings() {
    let fx = SettingsFixture::new();
    let events = record(fx.service.settings_changed());

    let saved = StreamerSettings::new(Snowflake(100), true);
    fx.service.save_settings(&saved).await.unwrap();

    let events = events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].settings, saved);
}

#[tokio::test]
async fn test_failed_save_changes_nothing() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(1);
    fx.service
        .save_settings(&StreamerSettings::new(guild, false))
        .await
        .unwrap();
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    let events = record(fx.service.settings_changed());

    fx.store.fail_next_commit();
    let result = fx.service.save_settings(&StreamerSettings::new(guild, true)).await;

    assert!(matches!(result, Err(AppError::Store(_))));
    assert!(events.lock().is_empty());
    assert!(!fx.store.row(&guild).unwrap().enabled);
    // Not invalidated: still the cached pre-save value.
    let cached = fx.service.get_settings_by_guild(guild, &[]).await.unwrap().unwrap();
    assert!(!cached.enabled);
    assert_eq!(fx.store.read_count(), 1);
}

#[tokio::test]
async fn test_handlers_run_in_registration_order() {
    let fx = SettingsFixture::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    for name in ["audit", "announcer", "roles"] {
        let order = Arc::clone(&order);
        fx.service.settings_changed().subscribe(move |_| {
            order.lock().push(name);
            Ok(())
        });
    }

    fx.service
        .save_settings(&StreamerSettings::new(Snowflake(1), true))
        .await
        .unwrap();

    assert_eq!(*order.lock(), vec!["audit", "announcer", "roles"]);
}

#[tokio::test]
async fn test_failing_handler_surfaces_after_commit() {
    let fx = SettingsFixture::new();
    let guild = Snowflake(2);
    fx.service.get_settings_by_guild(guild, &[]).await.unwrap();

    fx.service
        .settings_changed()
        .subscribe(|_| Err(AppError::Subscriber("announcer offline".into())));
    let later = record(fx.service.settings_changed());

    let result = fx.service.save_settings(&StreamerSettings::new(guild, true)).await;

    assert!(matches!(result, Err(AppError::Subscriber(_))));
    assert!(later.lock().is_empty());
    // The write and the eviction both happened before delivery.
    assert!(fx.store.row(&guild).is_some());
    let current = fx.service.get_settings_by_guild(guild, &[]).await.unwrap();
    assert_eq!(current, Some(StreamerSettings::new(guild, true)));
}

#[tokio::test]
async fn test_unsubscribed_handler_is_not_called() {
    let fx = SettingsFixture::new();
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let id = fx.service.settings_changed().subscribe(move |_| {
        *counter.lock() += 1;
        Ok(())
    });

    fx.service
        .save_settings(&StreamerSettings::new(Snowflake(1), true))
        .await
        .unwrap();
    fx.service.settings_changed().unsubscribe(id);
    fx.service
        .save_settings(&StreamerSettings::new(Snowflake(1), false))
        .await
        .unwrap();

    assert_eq!(*calls.lock(), 1);
}
