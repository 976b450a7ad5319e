//! Application Error Types
//!
//! Centralized error handling for the store, cache and service layers.

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller handed in an entity the service is not tracking.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Failure reported by a non-SQL store (connectivity, constraint, commit).
    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A change-event subscriber rejected the event.
    #[error("Subscriber error: {0}")]
    Subscriber(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error came from the persistent store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, AppError::Store(_) | AppError::Database(_))
    }
}
