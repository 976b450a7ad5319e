//! Application Startup
//!
//! Wires stores, the settings cache and services together.

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;

use crate::application::services::{
    EntityService, EntityServiceImpl, GuildCacheKeys, ModuleSettingsService,
    ModuleSettingsServiceImpl, SettingsCacheOptions,
};
use crate::config::Settings;
use crate::domain::modules::{Documented, StreamerModule};
use crate::domain::{
    Entity, StreamAnnouncerMessage, StreamerChannelSettings, StreamerSettings, WhiteListedRole,
};
use crate::infrastructure::cache::CacheKeyIndex;
use crate::infrastructure::repositories::{
    PgStreamAnnouncerMessageRepository, PgStreamerChannelSettingsRepository,
    PgStreamerSettingsRepository, PgWhiteListedRoleRepository,
};
use crate::infrastructure::{cache, database};

/// Services shared by every module of the bot
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub streamer_settings: Arc<dyn ModuleSettingsService<StreamerSettings>>,
    pub channel_settings: Arc<dyn EntityService<StreamerChannelSettings>>,
    pub announcer_messages: Arc<dyn EntityService<StreamAnnouncerMessage>>,
    pub white_listed_roles: Arc<dyn EntityService<WhiteListedRole>>,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    state: AppState,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let db = database::create_pool(&settings.database).await?;

        if settings.database.run_migrations {
            database::run_migrations(&db).await?;
            tracing::info!("Database migrations applied");
        }

        if settings.discord.is_configured() {
            tracing::info!(client_id = %settings.discord.client_id, "Discord credentials loaded");
        } else {
            tracing::warn!("Discord credentials are incomplete, set DISCORD_TOKEN and discord.client_id");
        }

        let settings_cache = Arc::new(cache::create_cache(&settings.cache).await?);
        let options = SettingsCacheOptions::from_settings(&settings.cache);
        tracing::info!(
            ttl_seconds = options.ttl_seconds,
            invalidate_on_remove = options.invalidate_on_remove,
            include_key_order = ?options.include_key_order,
            "Settings cache configured"
        );

        let key_index: Arc<dyn CacheKeyIndex> =
            match settings_cache.shared_key_index(StreamerSettings::KIND) {
                Some(index) => {
                    tracing::info!(kind = StreamerSettings::KIND, "Using Redis settings key index");
                    Arc::new(index)
                }
                None => Arc::new(GuildCacheKeys::new()),
            };

        let streamer_settings = Arc::new(ModuleSettingsServiceImpl::<StreamerSettings, _, _>::with_key_index(
            Arc::new(PgStreamerSettingsRepository::new(db.clone())),
            settings_cache,
            key_index,
            options,
        ));
        let channel_settings = Arc::new(EntityServiceImpl::<StreamerChannelSettings, _>::with_store(
            Arc::new(PgStreamerChannelSettingsRepository::new(db.clone())),
        ));
        let announcer_messages = Arc::new(EntityServiceImpl::<StreamAnnouncerMessage, _>::with_store(
            Arc::new(PgStreamAnnouncerMessageRepository::new(db.clone())),
        ));
        let white_listed_roles = Arc::new(EntityServiceImpl::<WhiteListedRole, _>::with_store(
            Arc::new(PgWhiteListedRoleRepository::new(db.clone())),
        ));

        let state = AppState {
            db,
            streamer_settings,
            channel_settings,
            announcer_messages,
            white_listed_roles,
            settings: Arc::new(settings),
        };

        let module = StreamerModule;
        tracing::info!(
            module = module.name(),
            version = module.version(),
            release_state = %module.release_state(),
            configurable = module.configurable(),
            "{}",
            module.description()
        );

        Ok(Self { state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run until Ctrl-C, then close the pool
    pub async fn run_until_stopped(self) -> Result<()> {
        tracing::info!("Bot running, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;

        tracing::info!("Shutdown signal received");
        self.state.db.close().await;
        Ok(())
    }
}
