//! Change Notification
//!
//! Synchronous, in-process fan-out of entity and settings changes.
//!
//! Handlers run on the caller's task, in registration order, after the store
//! commit that produced the event. A handler returning an error stops the
//! dispatch: later handlers are skipped and the error is returned to whoever
//! performed the mutation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::shared::error::AppError;

/// Handle returned by [`Subscribers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Arc<dyn Fn(&E) -> Result<(), AppError> + Send + Sync>;

/// Ordered registry of event handlers.
pub struct Subscribers<E> {
    handlers: RwLock<Vec<(SubscriptionId, Handler<E>)>>,
    next_id: AtomicU64,
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler. It receives every event dispatched after this call.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&E) -> Result<(), AppError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Deliver `event` to every handler in registration order.
    pub fn dispatch(&self, event: &E) -> Result<(), AppError> {
        // Snapshot so handlers may (un)subscribe without deadlocking.
        let handlers: Vec<Handler<E>> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            handler(event)?;
        }

        Ok(())
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("handlers", &self.len())
            .finish()
    }
}

/// Payload of the entity change streams.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityChangedEvent<T> {
    pub entity: T,
}

impl<T> EntityChangedEvent<T> {
    pub(crate) fn new(entity: T) -> Self {
        Self { entity }
    }
}

/// Payload of the settings change stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsChangedEvent<T> {
    pub settings: T,
}

impl<T> SettingsChangedEvent<T> {
    pub(crate) fn new(settings: T) -> Self {
        Self { settings }
    }
}

/// The three change streams of an entity service.
#[derive(Debug)]
pub struct EntityChangedDispatcher<T> {
    pub entity_created: Subscribers<EntityChangedEvent<T>>,
    pub entity_updated: Subscribers<EntityChangedEvent<T>>,
    pub entity_deleted: Subscribers<EntityChangedEvent<T>>,
}

impl<T> EntityChangedDispatcher<T> {
    pub fn new() -> Self {
        Self {
            entity_created: Subscribers::new(),
            entity_updated: Subscribers::new(),
            entity_deleted: Subscribers::new(),
        }
    }

    pub(crate) fn on_entity_created(&self, entity: T) -> Result<(), AppError> {
        self.entity_created.dispatch(&EntityChangedEvent::new(entity))
    }

    pub(crate) fn on_entity_updated(&self, entity: T) -> Result<(), AppError> {
        self.entity_updated.dispatch(&EntityChangedEvent::new(entity))
    }

    pub(crate) fn on_entity_deleted(&self, entity: T) -> Result<(), AppError> {
        self.entity_deleted.dispatch(&EntityChangedEvent::new(entity))
    }
}

impl<T> Default for EntityChangedDispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}
