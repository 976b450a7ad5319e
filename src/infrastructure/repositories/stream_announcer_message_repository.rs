//! Stream Announcer Message Repository
//!
//! PostgreSQL implementation of `EntityStore<StreamAnnouncerMessage>`.
//! Message IDs come from the `stream_announcer_messages.id` sequence.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use crate::domain::{EntityStore, NoInclude, Snowflake, StreamAnnouncerMessage};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct AnnouncerMessageRow {
    id: i32,
    user_id: i64,
    message_id: i64,
    channel_id: i64,
    guild_id: i64,
}

impl AnnouncerMessageRow {
    fn into_entity(self) -> StreamAnnouncerMessage {
        StreamAnnouncerMessage {
            id: self.id,
            user_id: Snowflake::from_db(self.user_id),
            message_id: Snowflake::from_db(self.message_id),
            channel_id: Snowflake::from_db(self.channel_id),
            guild_id: Snowflake::from_db(self.guild_id),
        }
    }
}

pub(crate) async fn fetch_for_guilds(
    conn: &mut PgConnection,
    guild_ids: &[i64],
) -> Result<Vec<StreamAnnouncerMessage>, AppError> {
    let rows = sqlx::query_as::<_, AnnouncerMessageRow>(
        r#"
        SELECT id, user_id, message_id, channel_id, guild_id
        FROM stream_announcer_messages
        WHERE guild_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(guild_ids)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(AnnouncerMessageRow::into_entity).collect())
}

async fn insert_row(
    conn: &mut PgConnection,
    message: &StreamAnnouncerMessage,
    guild_id: i64,
) -> Result<StreamAnnouncerMessage, AppError> {
    let row = sqlx::query_as::<_, AnnouncerMessageRow>(
        r#"
        INSERT INTO stream_announcer_messages (user_id, message_id, channel_id, guild_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, message_id, channel_id, guild_id
        "#,
    )
    .bind(message.user_id.to_db())
    .bind(message.message_id.to_db())
    .bind(message.channel_id.to_db())
    .bind(guild_id)
    .fetch_one(conn)
    .await?;

    Ok(row.into_entity())
}

async fn update_row(
    conn: &mut PgConnection,
    message: &StreamAnnouncerMessage,
    guild_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE stream_announcer_messages
        SET user_id = $2, message_id = $3, channel_id = $4, guild_id = $5
        WHERE id = $1
        "#,
    )
    .bind(message.id)
    .bind(message.user_id.to_db())
    .bind(message.message_id.to_db())
    .bind(message.channel_id.to_db())
    .bind(guild_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Make `messages` the complete set of tracked announcements of `guild_id`.
///
/// Persisted messages are updated in place, new ones get fresh IDs. Returns
/// the stored rows in input order, with their IDs.
pub(crate) async fn replace_for_guild(
    conn: &mut PgConnection,
    guild_id: i64,
    messages: &[StreamAnnouncerMessage],
) -> Result<Vec<StreamAnnouncerMessage>, AppError> {
    let keep: Vec<i32> = messages
        .iter()
        .filter(|m| m.is_persisted())
        .map(|m| m.id)
        .collect();

    sqlx::query("DELETE FROM stream_announcer_messages WHERE guild_id = $1 AND NOT (id = ANY($2))")
        .bind(guild_id)
        .bind(&keep)
        .execute(&mut *conn)
        .await?;

    let mut stored = Vec::with_capacity(messages.len());
    for message in messages {
        if message.is_persisted() {
            update_row(&mut *conn, message, guild_id).await?;
            stored.push(StreamAnnouncerMessage {
                guild_id: Snowflake::from_db(guild_id),
                ..message.clone()
            });
        } else {
            stored.push(insert_row(&mut *conn, message, guild_id).await?);
        }
    }

    Ok(stored)
}

/// PostgreSQL announcement message repository.
#[derive(Clone)]
pub struct PgStreamAnnouncerMessageRepository {
    pool: PgPool,
}

impl PgStreamAnnouncerMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<StreamAnnouncerMessage> for PgStreamAnnouncerMessageRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        key: &i32,
        _includes: &[NoInclude],
    ) -> Result<Option<StreamAnnouncerMessage>, AppError> {
        let row = sqlx::query_as::<_, AnnouncerMessageRow>(
            r#"
            SELECT id, user_id, message_id, channel_id, guild_id
            FROM stream_announcer_messages
            WHERE id = $1
            "#,
        )
        .bind(*key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AnnouncerMessageRow::into_entity))
    }

    #[instrument(skip(self))]
    async fn list(&self, _includes: &[NoInclude]) -> Result<Vec<StreamAnnouncerMessage>, AppError> {
        let rows = sqlx::query_as::<_, AnnouncerMessageRow>(
            r#"
            SELECT id, user_id, message_id, channel_id, guild_id
            FROM stream_announcer_messages
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AnnouncerMessageRow::into_entity).collect())
    }

    #[instrument(skip(self, entities), fields(count = entities.len()))]
    async fn insert(
        &self,
        entities: &[StreamAnnouncerMessage],
    ) -> Result<Vec<StreamAnnouncerMessage>, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut persisted = Vec::with_capacity(entities.len());
        for message in entities {
            persisted.push(insert_row(&mut *tx, message, message.guild_id.to_db()).await?);
        }

        tx.commit().await?;
        Ok(persisted)
    }

    #[instrument(skip(self, entity), fields(id = entity.id))]
    async fn update(&self, entity: &StreamAnnouncerMessage) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;

        if update_row(&mut *conn, entity, entity.guild_id.to_db()).await? == 0 {
            return Err(AppError::NotFound(format!("StreamAnnouncerMessage {}", entity.id)));
        }

        Ok(())
    }

    #[instrument(skip(self, entities), fields(count = entities.len()))]
    async fn delete(&self, entities: &[StreamAnnouncerMessage]) -> Result<(), AppError> {
        let ids: Vec<i32> = entities.iter().map(|m| m.id).collect();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM stream_announcer_messages WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
