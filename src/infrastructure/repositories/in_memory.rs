//! In-Memory Store
//!
//! A [`EntityStore`] kept in process memory. Used by the test suites and for
//! running the bot without PostgreSQL.
//!
//! Writes are all-or-nothing: a batch that violates key uniqueness leaves
//! the store untouched. [`InMemoryStore::fail_next_commit`] makes the next
//! write fail the same way a lost connection or rejected commit would.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::domain::{Entity, EntityStore, ModuleSettings, ModuleSettingsStore};
use crate::shared::error::AppError;

/// Assigns keys to entities whose key is generated by the store.
pub trait KeyAssigner<T>: Send + Sync {
    fn assign(&self, entity: &mut T);
}

/// Keys are supplied by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallerKeys;

impl<T> KeyAssigner<T> for CallerKeys {
    fn assign(&self, _entity: &mut T) {}
}

/// Sequence-backed keys for announcer messages, mimicking `SERIAL`.
#[derive(Debug)]
pub struct SerialKeys(AtomicI32);

impl Default for SerialKeys {
    fn default() -> Self {
        Self(AtomicI32::new(1))
    }
}

impl KeyAssigner<crate::domain::StreamAnnouncerMessage> for SerialKeys {
    fn assign(&self, entity: &mut crate::domain::StreamAnnouncerMessage) {
        if !entity.is_persisted() {
            entity.id = self.0.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Process-memory store for one entity type.
pub struct InMemoryStore<T: Entity, K = CallerKeys> {
    rows: Mutex<Vec<T>>,
    keys: K,
    fail_next_commit: AtomicBool,
    reads: AtomicUsize,
}

impl<T: Entity> InMemoryStore<T> {
    pub fn new() -> Self {
        Self::with_keys(CallerKeys)
    }

    /// Store pre-populated with `rows`.
    pub fn seeded(rows: Vec<T>) -> Self {
        let store = Self::new();
        *store.rows.lock() = rows;
        store
    }
}

impl<T: Entity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity, K: KeyAssigner<T>> InMemoryStore<T, K> {
    pub fn with_keys(keys: K) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            keys,
            fail_next_commit: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        }
    }

    /// Make the next write fail before anything is applied.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of read queries served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    /// Raw stored row, bypassing include handling and read counting.
    pub fn row(&self, key: &T::Key) -> Option<T> {
        self.rows.lock().iter().find(|r| &r.key() == key).cloned()
    }

    fn commit(&self) -> Result<(), AppError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(AppError::Store("commit failed".into()));
        }
        Ok(())
    }

    fn materialize(row: &T, includes: &[T::Include]) -> T {
        let mut entity = row.clone();
        entity.restrict_to(includes);
        entity
    }
}

#[async_trait]
impl<T: Entity, K: KeyAssigner<T>> EntityStore<T> for InMemoryStore<T, K> {
    #[instrument(skip(self), fields(kind = T::KIND))]
    async fn find(&self, key: &T::Key, includes: &[T::Include]) -> Result<Option<T>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock();

        Ok(rows
            .iter()
            .find(|row| &row.key() == key)
            .map(|row| Self::materialize(row, includes)))
    }

    #[instrument(skip(self), fields(kind = T::KIND))]
    async fn list(&self, includes: &[T::Include]) -> Result<Vec<T>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock();

        Ok(rows.iter().map(|row| Self::materialize(row, includes)).collect())
    }

    #[instrument(skip(self, entities), fields(kind = T::KIND, count = entities.len()))]
    async fn insert(&self, entities: &[T]) -> Result<Vec<T>, AppError> {
        let mut rows = self.rows.lock();

        let mut staged: Vec<T> = Vec::with_capacity(entities.len());
        for entity in entities {
            let mut entity = entity.clone();
            self.keys.assign(&mut entity);

            let key = entity.key();
            if rows.iter().chain(staged.iter()).any(|r| r.key() == key) {
                return Err(AppError::Store(format!(
                    "duplicate key {:?} for {}",
                    key,
                    T::KIND
                )));
            }
            staged.push(entity);
        }

        self.commit()?;
        rows.extend(staged.iter().cloned());
        debug!(count = staged.len(), "Inserted rows");

        Ok(staged)
    }

    #[instrument(skip(self, entity), fields(kind = T::KIND))]
    async fn update(&self, entity: &T) -> Result<(), AppError> {
        let mut rows = self.rows.lock();
        let key = entity.key();

        let index = rows
            .iter()
            .position(|r| r.key() == key)
            .ok_or_else(|| AppError::NotFound(format!("{} {:?}", T::KIND, key)))?;

        self.commit()?;
        rows[index] = entity.clone();

        Ok(())
    }

    #[instrument(skip(self, entities), fields(kind = T::KIND, count = entities.len()))]
    async fn delete(&self, entities: &[T]) -> Result<(), AppError> {
        let mut rows = self.rows.lock();

        self.commit()?;
        let keys: Vec<T::Key> = entities.iter().map(Entity::key).collect();
        rows.retain(|r| !keys.contains(&r.key()));

        Ok(())
    }
}

#[async_trait]
impl<T: ModuleSettings, K: KeyAssigner<T>> ModuleSettingsStore<T> for InMemoryStore<T, K> {
    #[instrument(skip(self, settings), fields(kind = T::KIND, guild_id = %settings.guild_id()))]
    async fn upsert(&self, settings: &T) -> Result<(), AppError> {
        let mut rows = self.rows.lock();
        let guild_id = settings.guild_id();

        self.commit()?;
        match rows.iter_mut().find(|r| r.guild_id() == guild_id) {
            Some(existing) => existing.merge_from(settings),
            None => rows.push(settings.clone()),
        }

        Ok(())
    }
}
