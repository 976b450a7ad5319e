//! Streamer Settings Repository
//!
//! PostgreSQL implementation of `ModuleSettingsStore<StreamerSettings>`.
//! Navigations are loaded with one extra query per requested include and
//! written as part of the same transaction as the owning row.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};

use super::{
    stream_announcer_message_repository as messages,
    streamer_channel_settings_repository as channels, white_listed_role_repository as roles,
};
use crate::domain::{
    Entity, EntityStore, GuildId, ModuleSettingsStore, Snowflake, StreamerSettings,
    StreamerSettingsInclude,
};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct StreamerSettingsRow {
    guild_id: i64,
    enabled: bool,
    streamer_role_enabled: bool,
    role_id: i64,
}

impl StreamerSettingsRow {
    fn into_settings(self) -> StreamerSettings {
        StreamerSettings {
            guild_id: Snowflake::from_db(self.guild_id),
            enabled: self.enabled,
            channel_settings: None,
            stream_messages: None,
            streamer_role_enabled: self.streamer_role_enabled,
            role_id: Snowflake::from_db(self.role_id),
            white_listed_role_ids: None,
        }
    }
}

fn group_by_guild<T>(items: Vec<T>, guild_of: impl Fn(&T) -> GuildId) -> HashMap<GuildId, Vec<T>> {
    let mut grouped: HashMap<GuildId, Vec<T>> = HashMap::new();
    for item in items {
        grouped.entry(guild_of(&item)).or_default().push(item);
    }
    grouped
}

/// Attach the requested navigations to `settings`.
async fn load_includes(
    conn: &mut PgConnection,
    settings: &mut [StreamerSettings],
    includes: &[StreamerSettingsInclude],
) -> Result<(), AppError> {
    if settings.is_empty() {
        return Ok(());
    }

    let guild_ids: Vec<i64> = settings.iter().map(|s| s.guild_id.to_db()).collect();

    if includes.contains(&StreamerSettingsInclude::ChannelSettings) {
        let mut grouped =
            group_by_guild(channels::fetch_for_guilds(&mut *conn, &guild_ids).await?, |c| c.guild_id);
        for s in settings.iter_mut() {
            s.channel_settings = Some(grouped.remove(&s.guild_id).unwrap_or_default());
        }
    }

    if includes.contains(&StreamerSettingsInclude::StreamMessages) {
        let mut grouped =
            group_by_guild(messages::fetch_for_guilds(&mut *conn, &guild_ids).await?, |m| m.guild_id);
        for s in settings.iter_mut() {
            s.stream_messages = Some(grouped.remove(&s.guild_id).unwrap_or_default());
        }
    }

    if includes.contains(&StreamerSettingsInclude::WhiteListedRoleIds) {
        let mut grouped =
            group_by_guild(roles::fetch_for_guilds(&mut *conn, &guild_ids).await?, |r| r.guild_id);
        for s in settings.iter_mut() {
            s.white_listed_role_ids = Some(grouped.remove(&s.guild_id).unwrap_or_default());
        }
    }

    Ok(())
}

/// Write the loaded navigations of `settings`; unloaded ones are left alone.
///
/// Returns `settings` as stored: announcement messages carry the IDs the
/// database assigned.
async fn save_navigations(
    conn: &mut PgConnection,
    settings: &StreamerSettings,
) -> Result<StreamerSettings, AppError> {
    let guild_id = settings.guild_id.to_db();
    let mut stored = settings.clone();

    if let Some(channel_settings) = &settings.channel_settings {
        channels::replace_for_guild(&mut *conn, guild_id, channel_settings).await?;
    }
    if let Some(stream_messages) = &settings.stream_messages {
        stored.stream_messages =
            Some(messages::replace_for_guild(&mut *conn, guild_id, stream_messages).await?);
    }
    if let Some(white_listed) = &settings.white_listed_role_ids {
        roles::replace_for_guild(&mut *conn, guild_id, white_listed).await?;
    }

    Ok(stored)
}

async fn insert_settings(
    conn: &mut PgConnection,
    settings: &StreamerSettings,
) -> Result<StreamerSettings, AppError> {
    sqlx::query(
        r#"
        INSERT INTO streamer_settings (guild_id, enabled, streamer_role_enabled, role_id)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(settings.guild_id.to_db())
    .bind(settings.enabled)
    .bind(settings.streamer_role_enabled)
    .bind(settings.role_id.to_db())
    .execute(&mut *conn)
    .await?;

    save_navigations(conn, settings).await
}

async fn update_settings(conn: &mut PgConnection, settings: &StreamerSettings) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE streamer_settings
        SET enabled = $2, streamer_role_enabled = $3, role_id = $4
        WHERE guild_id = $1
        "#,
    )
    .bind(settings.guild_id.to_db())
    .bind(settings.enabled)
    .bind(settings.streamer_role_enabled)
    .bind(settings.role_id.to_db())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        save_navigations(conn, settings).await?;
    }

    Ok(result.rows_affected())
}

/// PostgreSQL streamer settings repository.
#[derive(Clone)]
pub struct PgStreamerSettingsRepository {
    pool: PgPool,
}

impl PgStreamerSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<StreamerSettings> for PgStreamerSettingsRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        key: &GuildId,
        includes: &[StreamerSettingsInclude],
    ) -> Result<Option<StreamerSettings>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, StreamerSettingsRow>(
            r#"
            SELECT guild_id, enabled, streamer_role_enabled, role_id
            FROM streamer_settings
            WHERE guild_id = $1
            "#,
        )
        .bind(key.to_db())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut found = [row.into_settings()];
        load_includes(&mut *conn, &mut found, includes).await?;
        let [settings] = found;

        Ok(Some(settings))
    }

    #[instrument(skip(self))]
    async fn list(&self, includes: &[StreamerSettingsInclude]) -> Result<Vec<StreamerSettings>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let mut all: Vec<StreamerSettings> = sqlx::query_as::<_, StreamerSettingsRow>(
            r#"
            SELECT guild_id, enabled, streamer_role_enabled, role_id
            FROM streamer_settings
            ORDER BY guild_id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(StreamerSettingsRow::into_settings)
        .collect();

        load_includes(&mut *conn, &mut all, includes).await?;

        Ok(all)
    }

    #[instrument(skip(self, entities), fields(count = entities.len()))]
    async fn insert(&self, entities: &[StreamerSettings]) -> Result<Vec<StreamerSettings>, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut inserted = Vec::with_capacity(entities.len());
        for settings in entities {
            inserted.push(insert_settings(&mut *tx, settings).await?);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    #[instrument(skip(self, entity), fields(guild_id = %entity.guild_id))]
    async fn update(&self, entity: &StreamerSettings) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if update_settings(&mut *tx, entity).await? == 0 {
            return Err(AppError::NotFound(format!(
                "{} for guild {}",
                StreamerSettings::KIND,
                entity.guild_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, entities), fields(count = entities.len()))]
    async fn delete(&self, entities: &[StreamerSettings]) -> Result<(), AppError> {
        let ids: Vec<i64> = entities.iter().map(|s| s.guild_id.to_db()).collect();
        let mut tx = self.pool.begin().await?;

        // Owned rows go with it through ON DELETE CASCADE.
        sqlx::query("DELETE FROM streamer_settings WHERE guild_id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ModuleSettingsStore<StreamerSettings> for PgStreamerSettingsRepository {
    #[instrument(skip(self, settings), fields(guild_id = %settings.guild_id))]
    async fn upsert(&self, settings: &StreamerSettings) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT guild_id FROM streamer_settings WHERE guild_id = $1 FOR UPDATE",
        )
        .bind(settings.guild_id.to_db())
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            debug!("Merging into existing settings row");
            update_settings(&mut *tx, settings).await?;
        } else {
            debug!("Inserting new settings row");
            insert_settings(&mut *tx, settings).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
