//! # StreamSentry Library
//!
//! Settings and entity access for the StreamSentry Discord bot:
//! - Per-guild module settings behind a cache-aside read path
//! - Targeted invalidation of every cached read of a guild on save
//! - Generic entity CRUD with created/updated/deleted notifications
//! - PostgreSQL storage, with an in-process or Redis settings cache
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Entities, kind descriptors and store traits
//! - **Application Layer**: Settings and entity services, change events
//! - **Infrastructure Layer**: Database, cache and store implementations
//!
//! ## Module Structure
//!
//! ```text
//! stream_sentry/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, and store traits
//! +-- application/    Services and change notification
//! +-- infrastructure/ Database, cache, and repository implementations
//! +-- shared/         Common utilities (errors, clock)
//! ```

// Configuration module
pub mod config;

// Domain layer - Entities and store boundary
pub mod domain;

// Application layer - Services and events
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
