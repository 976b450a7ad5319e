//! # StreamSentry
//!
//! Discord stream announcement bot.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool and migrations
//! - Settings cache and services

use anyhow::Result;
use tracing::info;

use stream_sentry::config::Settings;
use stream_sentry::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    stream_sentry::telemetry::init_tracing();

    info!("Starting StreamSentry...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        environment = %settings.environment,
        cache_backend = ?settings.cache.backend,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    application.run_until_stopped().await?;

    Ok(())
}
