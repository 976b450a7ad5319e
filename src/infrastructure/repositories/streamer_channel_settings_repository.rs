//! Streamer Channel Settings Repository
//!
//! PostgreSQL implementation of `EntityStore<StreamerChannelSettings>`.
//! The row helpers are shared with the streamer settings repository, which
//! writes channel overrides as part of a settings save.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use crate::domain::{ChannelId, EntityStore, NoInclude, Snowflake, StreamerChannelSettings};
use crate::shared::error::AppError;

/// Database row representation of the `streamer_channel_settings` table.
#[derive(Debug, sqlx::FromRow)]
struct ChannelSettingsRow {
    channel_id: i64,
    guild_id: i64,
    remove_message: bool,
}

impl ChannelSettingsRow {
    fn into_entity(self) -> StreamerChannelSettings {
        StreamerChannelSettings {
            channel_id: Snowflake::from_db(self.channel_id),
            guild_id: Snowflake::from_db(self.guild_id),
            remove_message: self.remove_message,
        }
    }
}

/// Channel overrides owned by any of `guild_ids`.
pub(crate) async fn fetch_for_guilds(
    conn: &mut PgConnection,
    guild_ids: &[i64],
) -> Result<Vec<StreamerChannelSettings>, AppError> {
    let rows = sqlx::query_as::<_, ChannelSettingsRow>(
        r#"
        SELECT channel_id, guild_id, remove_message
        FROM streamer_channel_settings
        WHERE guild_id = ANY($1)
        ORDER BY channel_id
        "#,
    )
    .bind(guild_ids)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(ChannelSettingsRow::into_entity).collect())
}

/// Make `channels` the complete set of overrides for `guild_id`.
pub(crate) async fn replace_for_guild(
    conn: &mut PgConnection,
    guild_id: i64,
    channels: &[StreamerChannelSettings],
) -> Result<(), AppError> {
    let keep: Vec<i64> = channels.iter().map(|c| c.channel_id.to_db()).collect();

    sqlx::query(
        r#"
        DELETE FROM streamer_channel_settings
        WHERE guild_id = $1 AND NOT (channel_id = ANY($2))
        "#,
    )
    .bind(guild_id)
    .bind(&keep)
    .execute(&mut *conn)
    .await?;

    for channel in channels {
        sqlx::query(
            r#"
            INSERT INTO streamer_channel_settings (channel_id, guild_id, remove_message)
            VALUES ($1, $2, $3)
            ON CONFLICT (channel_id)
            DO UPDATE SET guild_id = EXCLUDED.guild_id, remove_message = EXCLUDED.remove_message
            "#,
        )
        .bind(channel.channel_id.to_db())
        .bind(guild_id)
        .bind(channel.remove_message)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// PostgreSQL channel override repository.
#[derive(Clone)]
pub struct PgStreamerChannelSettingsRepository {
    pool: PgPool,
}

impl PgStreamerChannelSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<StreamerChannelSettings> for PgStreamerChannelSettingsRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        key: &ChannelId,
        _includes: &[NoInclude],
    ) -> Result<Option<StreamerChannelSettings>, AppError> {
        let row = sqlx::query_as::<_, ChannelSettingsRow>(
            r#"
            SELECT channel_id, guild_id, remove_message
            FROM streamer_channel_settings
            WHERE channel_id = $1
            "#,
        )
        .bind(key.to_db())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ChannelSettingsRow::into_entity))
    }

    #[instrument(skip(self))]
    async fn list(&self, _includes: &[NoInclude]) -> Result<Vec<StreamerChannelSettings>, AppError> {
        let rows = sqlx::query_as::<_, ChannelSettingsRow>(
            r#"
            SELECT channel_id, guild_id, remove_message
            FROM streamer_channel_settings
            ORDER BY channel_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ChannelSettingsRow::into_entity).collect())
    }

    #[instrument(skip(self, entities), fields(count = entities.len()))]
    async fn insert(
        &self,
        entities: &[StreamerChannelSettings],
    ) -> Result<Vec<StreamerChannelSettings>, AppError> {
        let mut tx = self.pool.begin().await?;

        for channel in entities {
            sqlx::query(
                r#"
                INSERT INTO streamer_channel_settings (channel_id, guild_id, remove_message)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(channel.channel_id.to_db())
            .bind(channel.guild_id.to_db())
            .bind(channel.remove_message)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(entities.to_vec())
    }

    #[instrument(skip(self, entity), fields(channel_id = %entity.channel_id))]
    async fn update(&self, entity: &StreamerChannelSettings) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE streamer_channel_settings
            SET guild_id = $2, remove_message = $3
            WHERE channel_id = $1
            "#,
        )
        .bind(entity.channel_id.to_db())
        .bind(entity.guild_id.to_db())
        .bind(entity.remove_message)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "StreamerChannelSettings {}",
                entity.channel_id
            )));
        }

        Ok(())
    }

    #[instrument(skip(self, entities), fields(count = entities.len()))]
    async fn delete(&self, entities: &[StreamerChannelSettings]) -> Result<(), AppError> {
        let ids: Vec<i64> = entities.iter().map(|c| c.channel_id.to_db()).collect();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM streamer_channel_settings WHERE channel_id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
