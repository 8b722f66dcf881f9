//! # Hackabot web process
//!
//! Serves the Telegram webhook, health checks and the public API.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hackabot::config::Config;
use hackabot::database::connection::DatabaseManager;
use hackabot::services::telegram::TeloxideClient;
use hackabot::services::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hackabot=debug,tower_http=debug".into()),
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

    info!("Starting Hackabot v{} ({})", env!("CARGO_PKG_VERSION"), config.environment);
    info!("Configuration loaded - HTTP Port: {}", config.http_port);

    let db_manager = DatabaseManager::new(&config.database_url).await?;
    db_manager.run_migrations().await?;
    info!("Database initialized successfully");

    let telegram = TeloxideClient::new(&config.telegram_bot_token);
    let port = config.http_port;
    let state = AppState::new(Arc::new(db_manager), telegram, Arc::new(config));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", port, e))?;

    info!("HTTP server listening on port {}", port);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("Application stopped");
    Ok(())
}
