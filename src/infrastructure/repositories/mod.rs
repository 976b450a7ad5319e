//! Repository Implementations
//!
//! Implementations of the domain store traits.
//!
//! ## Available Repositories
//!
//! - **PgStreamerSettingsRepository** - Streamer module settings with
//!   eager-loadable navigations (`ModuleSettingsStore`)
//! - **PgStreamerChannelSettingsRepository** - Per-channel overrides
//! - **PgStreamAnnouncerMessageRepository** - Posted announcements
//! - **PgWhiteListedRoleRepository** - Role whitelist
//! - **InMemoryStore** - Process-memory store for any entity type
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use stream_sentry::infrastructure::repositories::PgStreamerSettingsRepository;
//!
//! async fn setup(pool: PgPool) {
//!     let settings_repo = PgStreamerSettingsRepository::new(pool.clone());
//! }
//! ```

pub mod in_memory;
pub mod stream_announcer_message_repository;
pub mod streamer_channel_settings_repository;
pub mod streamer_settings_repository;
pub mod white_listed_role_repository;

pub use in_memory::{CallerKeys, InMemoryStore, KeyAssigner, SerialKeys};
pub use stream_announcer_message_repository::PgStreamAnnouncerMessageRepository;
pub use streamer_channel_settings_repository::PgStreamerChannelSettingsRepository;
pub use streamer_settings_repository::PgStreamerSettingsRepository;
pub use white_listed_role_repository::PgWhiteListedRoleRepository;
