use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde_json::{json, Value};

use crate::bot::handlers::handle_update;
use crate::bot::updates::Update;
use crate::services::telegram::TelegramApi;
use crate::services::AppState;

pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// `POST /webhook/telegram/`
pub async fn telegram_webhook<T: TelegramApi>(
    State(state): State<AppState<T>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    if !verify_secret(&headers, state.config.telegram_webhook_secret.as_deref()) {
        tracing::warn!("Webhook secret verification failed");
        return Err(StatusCode::FORBIDDEN);
    }

    let update: Update = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Failed to parse webhook body: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    if let Err(e) = handle_update(&state, &update).await {
        tracing::error!("Failed to handle update {}: {:#}", update.update_id, e);
        let source: &(dyn std::error::Error + 'static) = e.as_ref();
        sentry::capture_error(source);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok(Json(json!({ "ok": true })))
}

/// A missing header counts as empty, which matches an unset secret.
fn verify_secret(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    provided == expected.unwrap_or_default()
}
