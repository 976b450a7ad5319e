//! White Listed Role Repository
//!
//! PostgreSQL implementation of `EntityStore<WhiteListedRole>`.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use crate::domain::{EntityStore, NoInclude, RoleId, Snowflake, WhiteListedRole};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct WhiteListedRoleRow {
    role_id: i64,
    guild_id: i64,
}

impl WhiteListedRoleRow {
    fn into_entity(self) -> WhiteListedRole {
        WhiteListedRole {
            role_id: Snowflake::from_db(self.role_id),
            guild_id: Snowflake::from_db(self.guild_id),
        }
    }
}

pub(crate) async fn fetch_for_guilds(
    conn: &mut PgConnection,
    guild_ids: &[i64],
) -> Result<Vec<WhiteListedRole>, AppError> {
    let rows = sqlx::query_as::<_, WhiteListedRoleRow>(
        r#"
        SELECT role_id, guild_id
        FROM white_listed_roles
        WHERE guild_id = ANY($1)
        ORDER BY role_id
        "#,
    )
    .bind(guild_ids)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(WhiteListedRoleRow::into_entity).collect())
}

/// Make `roles` the complete whitelist of `guild_id`.
pub(crate) async fn replace_for_guild(
    conn: &mut PgConnection,
    guild_id: i64,
    roles: &[WhiteListedRole],
) -> Result<(), AppError> {
    let keep: Vec<i64> = roles.iter().map(|r| r.role_id.to_db()).collect();

    sqlx::query("DELETE FROM white_listed_roles WHERE guild_id = $1 AND NOT (role_id = ANY($2))")
        .bind(guild_id)
        .bind(&keep)
        .execute(&mut *conn)
        .await?;

    for role_id in keep {
        sqlx::query(
            r#"
            INSERT INTO white_listed_roles (role_id, guild_id)
            VALUES ($1, $2)
            ON CONFLICT (role_id) DO UPDATE SET guild_id = EXCLUDED.guild_id
            "#,
        )
        .bind(role_id)
        .bind(guild_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// PostgreSQL role whitelist repository.
#[derive(Clone)]
pub struct PgWhiteListedRoleRepository {
    pool: PgPool,
}

impl PgWhiteListedRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore<WhiteListedRole> for PgWhiteListedRoleRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        key: &RoleId,
        _includes: &[NoInclude],
    ) -> Result<Option<WhiteListedRole>, AppError> {
        let row = sqlx::query_as::<_, WhiteListedRoleRow>(
            "SELECT role_id, guild_id FROM white_listed_roles WHERE role_id = $1",
        )
        .bind(key.to_db())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(WhiteListedRoleRow::into_entity))
    }

    #[instrument(skip(self))]
    async fn list(&self, _includes: &[NoInclude]) -> Result<Vec<WhiteListedRole>, AppError> {
        let rows = sqlx::query_as::<_, WhiteListedRoleRow>(
            "SELECT role_id, guild_id FROM white_listed_roles ORDER BY role_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WhiteListedRoleRow::into_entity).collect())
    }

    #[instrument(skip(self, entities), fields(count = entities.len()))]
    async fn insert(&self, entities: &[WhiteListedRole]) -> Result<Vec<WhiteListedRole>, AppError> {
        let mut tx = self.pool.begin().await?;

        for role in entities {
            sqlx::query("INSERT INTO white_listed_roles (role_id, guild_id) VALUES ($1, $2)")
                .bind(role.role_id.to_db())
                .bind(role.guild_id.to_db())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(entities.to_vec())
    }

    #[instrument(skip(self, entity), fields(role_id = %entity.role_id))]
    async fn update(&self, entity: &WhiteListedRole) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE white_listed_roles SET guild_id = $2 WHERE role_id = $1")
            .bind(entity.role_id.to_db())
            .bind(entity.guild_id.to_db())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("WhiteListedRole {}", entity.role_id)));
        }

        Ok(())
    }

    #[instrument(skip(self, entities), fields(count = entities.len()))]
    async fn delete(&self, entities: &[WhiteListedRole]) -> Result<(), AppError> {
        let ids: Vec<i64> = entities.iter().map(|r| r.role_id.to_db()).collect();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM white_listed_roles WHERE role_id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
