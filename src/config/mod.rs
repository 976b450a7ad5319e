//! # Configuration Module
//!
//! Configuration can be loaded from:
//! - Environment variables (prefixed with APP__, plus DATABASE_URL,
//!   REDIS_URL and DISCORD_TOKEN)
//! - Configuration files (config/default.toml, config/{environment}.toml)
//! - .env files (via dotenvy)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stream_sentry::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("Settings cached for {}s", settings.cache.ttl_seconds);
//! ```

mod settings;

pub use settings::*;
