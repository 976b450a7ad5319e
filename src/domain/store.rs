//! Persistent store contracts.
//!
//! Implemented in the infrastructure layer by the PostgreSQL repositories
//! and by [`InMemoryStore`](crate::infrastructure::repositories::InMemoryStore).
//! Every call runs in its own short-lived session: a pooled connection or
//! transaction that is committed (or rolled back) before the call returns.

use async_trait::async_trait;

use super::entity::{Entity, ModuleSettings};
use crate::shared::error::AppError;

/// CRUD access to a single entity type.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Find one entity by primary key with the given navigations loaded.
    async fn find(&self, key: &T::Key, includes: &[T::Include]) -> Result<Option<T>, AppError>;

    /// Load every entity of the type.
    async fn list(&self, includes: &[T::Include]) -> Result<Vec<T>, AppError>;

    /// Insert all `entities` in one transaction.
    ///
    /// Returns the persisted entities in input order, with store-generated
    /// keys filled in. Nothing is written if any insert fails.
    async fn insert(&self, entities: &[T]) -> Result<Vec<T>, AppError>;

    /// Write the current values of an existing entity.
    async fn update(&self, entity: &T) -> Result<(), AppError>;

    /// Delete all `entities` in one transaction.
    async fn delete(&self, entities: &[T]) -> Result<(), AppError>;
}

/// Store for a per-guild configuration kind.
#[async_trait]
pub trait ModuleSettingsStore<T: ModuleSettings>: EntityStore<T> {
    /// Insert `settings`, or merge it into the guild's existing row.
    async fn upsert(&self, settings: &T) -> Result<(), AppError>;
}
