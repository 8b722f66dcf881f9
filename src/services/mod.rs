pub mod api;
pub mod attendance;
pub mod health;
pub mod images;
pub mod notifications;
pub mod schedule;
pub mod telegram;
pub mod webhook;
pub mod worker;

use std::sync::Arc;

use axum::{routing::post, Router};
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::services::telegram::TelegramApi;

/// Shared state of the web process.
#[derive(Clone)]
pub struct AppState<T: TelegramApi> {
    pub db: Arc<DatabaseManager>,
    pub telegram: T,
    pub config: Arc<Config>,
    pub start_time: DateTime<Utc>,
}

impl<T: TelegramApi> AppState<T> {
    pub fn new(db: Arc<DatabaseManager>, telegram: T, config: Arc<Config>) -> Self {
        Self {
            db,
            telegram,
            config,
            start_time: Utc::now(),
        }
    }
}

/// Health checks, the Telegram webhook and the public API.
pub fn router<T: TelegramApi>(state: AppState<T>) -> Router {
    Router::new()
        .merge(health::routes::<T>())
        .route("/webhook/telegram/", post(webhook::telegram_webhook::<T>))
        .merge(api::routes::<T>())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
