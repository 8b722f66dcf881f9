//! # Hackabot worker
//!
//! Sends weekly polls, event reminders and the weekly summary, and prunes
//! old photos.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hackabot::config::Config;
use hackabot::database::connection::DatabaseManager;
use hackabot::services::telegram::TeloxideClient;
use hackabot::services::worker::Worker;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hackabot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let _sentry = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(config.environment.as_str().into()),
                ..Default::default()
            },
        ))
    });

    info!("Starting Hackabot worker v{}", env!("CARGO_PKG_VERSION"));

    let db_manager = DatabaseManager::new(&config.database_url).await?;
    db_manager.run_migrations().await?;

    let telegram = TeloxideClient::new(&config.telegram_bot_token);
    let worker = Worker::new(telegram, Arc::new(db_manager), Arc::new(config));
    let mut scheduler = worker.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down worker");
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("Error stopping scheduler: {}", e);
    }

    info!("Worker stopped");
    Ok(())
}
