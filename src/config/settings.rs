//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Settings cache configuration
    pub cache: CacheSettings,

    /// Discord application credentials
    pub discord: DiscordSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

/// Which cache holds module settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// Process-local TTL cache
    Memory,
    /// Shared Redis instance
    Redis,
}

/// Settings cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,

    /// Absolute lifetime of a cached settings entry (default: one day)
    pub ttl_seconds: u64,

    /// Also flush a guild's cached settings when its row is removed
    pub invalidate_on_remove: bool,

    /// Sort includes before building cache keys
    pub normalize_include_order: bool,

    /// Redis connection URL, required for the redis backend
    pub redis_url: Option<String>,

    /// Prefix applied to every Redis key
    pub key_prefix: Option<String>,
}

/// Discord application credentials.
///
/// Reserved for the gateway client. Only reported at startup for now; the
/// token never appears in logs or `Debug` output.
#[derive(Clone, Deserialize)]
pub struct DiscordSettings {
    /// Bot token
    pub token: String,

    /// OAuth2 application client ID
    pub client_id: String,
}

impl DiscordSettings {
    /// Both the token and the client ID are present.
    pub fn is_configured(&self) -> bool {
        !self.token.trim().is_empty() && !self.client_id.trim().is_empty()
    }
}

impl std::fmt::Debug for DiscordSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordSettings")
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Default settings cache lifetime: 24 hours.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 24 * 60 * 60;

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            invalidate_on_remove: false,
            normalize_include_order: false,
            redis_url: None,
            key_prefix: None,
        }
    }
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded, parsed or
    /// fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("cache.backend", "memory")?
            .set_default("cache.ttl_seconds", DEFAULT_CACHE_TTL_SECONDS)?
            .set_default("cache.invalidate_on_remove", false)?
            .set_default("cache.normalize_include_order", false)?
            .set_default("discord.token", "")?
            .set_default("discord.client_id", "")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__CACHE__TTL_SECONDS=60 -> cache.ttl_seconds = 60
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.redis_url", std::env::var("REDIS_URL").ok())?
            .set_override_option("discord.token", std::env::var("DISCORD_TOKEN").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Check cross-field constraints the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::Message(
                "cache.ttl_seconds must be greater than zero".into(),
            ));
        }

        if self.cache.backend == CacheBackendKind::Redis
            && self.cache.redis_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Message(
                "cache.redis_url is required when cache.backend = \"redis\"".into(),
            ));
        }

        Ok(())
    }
}
