//! Writes through `PgStreamerSettingsRepository` against a live database.

use chrono::Utc;
use pretty_assertions::assert_eq;
use sqlx::PgPool;

use stream_sentry::domain::{
    EntityStore, Snowflake, StreamAnnouncerMessage, StreamerSettings, StreamerSettingsInclude,
};
use stream_sentry::infrastructure::database;
use stream_sentry::infrastructure::repositories::PgStreamerSettingsRepository;

async fn pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.unwrap();
    database::run_migrations(&pool).await.unwrap();
    Some(pool)
}

fn unique_guild() -> Snowflake {
    Snowflake(Utc::now().timestamp_micros() as u64)
}

#[tokio::test]
async fn test_insert_returns_ids_of_nested_messages() {
    let Some(pool) = pool().await else {
        return;
    };
    let repository = PgStreamerSettingsRepository::new(pool);
    let guild = unique_guild();
    let settings = StreamerSettings {
        stream_messages: Some(vec![
            StreamAnnouncerMessage::new(Snowflake(1), Snowflake(2), Snowflake(3), guild),
            StreamAnnouncerMessage::new(Snowflake(4), Snowflake(5), Snowflake(3), guild),
        ]),
        ..StreamerSettings::new(guild, true)
    };

    let inserted = repository.insert(std::slice::from_ref(&settings)).await.unwrap();

    let returned = inserted[0].stream_messages.clone().unwrap();
    assert_eq!(returned.len(), 2);
    assert!(returned.iter().all(StreamAnnouncerMessage::is_persisted));
    assert_eq!(returned[0].user_id, Snowflake(1));
    assert_eq!(returned[1].user_id, Snowflake(4));

    let stored = repository
        .find(&guild, &[StreamerSettingsInclude::StreamMessages])
        .await
        .unwrap()
        .unwrap();
    let mut stored_ids: Vec<i32> = stored.stream_messages.unwrap().iter().map(|m| m.id).collect();
    let mut returned_ids: Vec<i32> = returned.iter().map(|m| m.id).collect();
    stored_ids.sort_unstable();
    returned_ids.sort_unstable();
    assert_eq!(stored_ids, returned_ids);

    repository.delete(&inserted).await.unwrap();
}
