//! Application Services
//!
//! Services that coordinate stores, the settings cache and change
//! notification.
//!
//! ## Available Services
//!
//! - **EntityService**: CRUD over any entity type with created/updated/deleted events
//! - **ModuleSettingsService**: Cache-aside per-guild settings with targeted invalidation

pub mod entity_service;
pub mod guild_cache_keys;
pub mod module_settings_service;

// Re-export entity service types
pub use entity_service::{Attached, EntityFilter, EntityService, EntityServiceImpl};

// Re-export settings service types
pub use guild_cache_keys::GuildCacheKeys;
pub use module_settings_service::{
    IncludeKeyOrder, ModuleSettingsService, ModuleSettingsServiceImpl, SettingsCacheOptions,
};
