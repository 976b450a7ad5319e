//! Entity Service
//!
//! Generic CRUD over one entity type with change notification.
//!
//! Every successful write raises one event per affected entity, in input
//! order, after the store has committed. Failed writes raise nothing.
//!
//! Reads and creates hand out [`Attached`] values. Only a value issued by
//! the same service instance, whose key has not been removed since, is
//! accepted by `update`. An entity built by the caller cannot be passed to
//! `update` at all.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashSet;
use tracing::{debug, instrument};

use crate::application::events::EntityChangedDispatcher;
use crate::domain::{Entity, EntityStore};
use crate::shared::error::AppError;

static NEXT_SERVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Row filter for [`EntityService::get`].
pub type EntityFilter<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);

/// An entity issued by an entity service.
///
/// Dereferences to the entity, so fields can be read and changed in place
/// before handing it back to [`EntityService::update`].
///
/// ```compile_fail
/// use stream_sentry::application::services::EntityService;
/// use stream_sentry::domain::{Snowflake, WhiteListedRole};
///
/// async fn rename(service: &dyn EntityService<WhiteListedRole>) {
///     let fresh = WhiteListedRole::new(Snowflake(1), Snowflake(100));
///     let _ = service.update(&fresh).await;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Attached<T> {
    entity: T,
    owner: u64,
}

impl<T> Attached<T> {
    pub fn get(&self) -> &T {
        &self.entity
    }

    /// Detach and return the plain entity.
    pub fn into_inner(self) -> T {
        self.entity
    }
}

impl<T> Deref for Attached<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.entity
    }
}

impl<T> DerefMut for Attached<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.entity
    }
}

impl<T> AsRef<T> for Attached<T> {
    fn as_ref(&self) -> &T {
        &self.entity
    }
}

impl<T: PartialEq> PartialEq<T> for Attached<T> {
    fn eq(&self, other: &T) -> bool {
        self.entity == *other
    }
}

/// Entity service trait
#[async_trait]
pub trait EntityService<T: Entity>: Send + Sync {
    /// Entity with primary key `key`, without navigations.
    async fn find(&self, key: &T::Key) -> Result<Option<Attached<T>>, AppError>;

    /// Entities matching `filter`, with `includes` loaded.
    async fn get(
        &self,
        filter: EntityFilter<'_, T>,
        includes: &[T::Include],
    ) -> Result<Vec<Attached<T>>, AppError>;

    /// Every entity, with `includes` loaded.
    async fn get_all(&self, includes: &[T::Include]) -> Result<Vec<Attached<T>>, AppError>;

    /// Persist a new entity and return it with any store-assigned key.
    async fn create(&self, entity: T) -> Result<Attached<T>, AppError>;

    /// Persist several entities in one commit.
    async fn create_bulk(&self, entities: Vec<T>) -> Result<Vec<Attached<T>>, AppError>;

    /// Write back an entity previously issued by this service.
    async fn update(&self, entity: &Attached<T>) -> Result<(), AppError>;

    async fn remove(&self, entity: &T) -> Result<(), AppError>;

    /// Delete several entities in one commit.
    async fn remove_bulk(&self, entities: &[T]) -> Result<(), AppError>;

    /// Change streams of this service.
    fn dispatch(&self) -> &EntityChangedDispatcher<T>;
}

/// Entity service implementation over an [`EntityStore`].
pub struct EntityServiceImpl<T, S>
where
    T: Entity,
    S: EntityStore<T>,
{
    id: u64,
    store: Arc<S>,
    dispatch: Arc<EntityChangedDispatcher<T>>,
    attached: DashSet<T::Key>,
}

impl<T, S> EntityServiceImpl<T, S>
where
    T: Entity,
    S: EntityStore<T>,
{
    /// Service publishing to a shared dispatcher, so several service
    /// instances over the same entity type feed the same subscribers.
    pub fn new(store: Arc<S>, dispatch: Arc<EntityChangedDispatcher<T>>) -> Self {
        Self {
            id: NEXT_SERVICE_ID.fetch_add(1, Ordering::Relaxed),
            store,
            dispatch,
            attached: DashSet::new(),
        }
    }

    /// Service with its own dispatcher.
    pub fn with_store(store: Arc<S>) -> Self {
        Self::new(store, Arc::new(EntityChangedDispatcher::new()))
    }

    /// Whether the entity with `key` is attached to this service.
    pub fn is_attached(&self, key: &T::Key) -> bool {
        self.attached.contains(key)
    }

    fn attach(&self, entity: T) -> Attached<T> {
        self.attached.insert(entity.key());
        Attached {
            entity,
            owner: self.id,
        }
    }

    fn attach_all(&self, entities: Vec<T>) -> Vec<Attached<T>> {
        entities.into_iter().map(|entity| self.attach(entity)).collect()
    }
}

#[async_trait]
impl<T, S> EntityService<T> for EntityServiceImpl<T, S>
where
    T: Entity,
    S: EntityStore<T>,
{
    #[instrument(skip(self), fields(kind = T::KIND))]
    async fn find(&self, key: &T::Key) -> Result<Option<Attached<T>>, AppError> {
        let found = self.store.find(key, &[]).await?;
        Ok(found.map(|entity| self.attach(entity)))
    }

    #[instrument(skip(self, filter), fields(kind = T::KIND))]
    async fn get(
        &self,
        filter: EntityFilter<'_, T>,
        includes: &[T::Include],
    ) -> Result<Vec<Attached<T>>, AppError> {
        let matching: Vec<T> = self
            .store
            .list(includes)
            .await?
            .into_iter()
            .filter(|entity| filter(entity))
            .collect();

        Ok(self.attach_all(matching))
    }

    #[instrument(skip(self), fields(kind = T::KIND))]
    async fn get_all(&self, includes: &[T::Include]) -> Result<Vec<Attached<T>>, AppError> {
        let all = self.store.list(includes).await?;
        Ok(self.attach_all(all))
    }

    #[instrument(skip(self, entity), fields(kind = T::KIND))]
    async fn create(&self, entity: T) -> Result<Attached<T>, AppError> {
        let mut persisted = self.store.insert(std::slice::from_ref(&entity)).await?;
        let created = persisted
            .pop()
            .ok_or_else(|| AppError::Internal(format!("{} insert returned no row", T::KIND)))?;

        debug!(key = ?created.key(), "Entity created");
        let created = self.attach(created);

        self.dispatch.on_entity_created(created.get().clone())?;
        Ok(created)
    }

    #[instrument(skip(self, entities), fields(kind = T::KIND, count = entities.len()))]
    async fn create_bulk(&self, entities: Vec<T>) -> Result<Vec<Attached<T>>, AppError> {
        let created = self.attach_all(self.store.insert(&entities).await?);
        debug!(count = created.len(), "Entities created");

        for entity in &created {
            self.dispatch.on_entity_created(entity.get().clone())?;
        }
        Ok(created)
    }

    #[instrument(skip(self, entity), fields(kind = T::KIND))]
    async fn update(&self, entity: &Attached<T>) -> Result<(), AppError> {
        if entity.owner != self.id || !self.attached.contains(&entity.key()) {
            return Err(AppError::InvalidState(
                "You must use an attached entity when updating.".into(),
            ));
        }

        self.store.update(entity.get()).await?;
        debug!(key = ?entity.key(), "Entity updated");

        self.dispatch.on_entity_updated(entity.get().clone())
    }

    #[instrument(skip(self, entity), fields(kind = T::KIND))]
    async fn remove(&self, entity: &T) -> Result<(), AppError> {
        self.store.delete(std::slice::from_ref(entity)).await?;
        self.attached.remove(&entity.key());
        debug!(key = ?entity.key(), "Entity removed");

        self.dispatch.on_entity_deleted(entity.clone())
    }

    #[instrument(skip(self, entities), fields(kind = T::KIND, count = entities.len()))]
    async fn remove_bulk(&self, entities: &[T]) -> Result<(), AppError> {
        self.store.delete(entities).await?;
        for entity in entities {
            self.attached.remove(&entity.key());
        }
        debug!(count = entities.len(), "Entities removed");

        for entity in entities {
            self.dispatch.on_entity_deleted(entity.clone())?;
        }
        Ok(())
    }

    fn dispatch(&self) -> &EntityChangedDispatcher<T> {
        &self.dispatch
    }
}
