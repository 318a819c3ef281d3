use super::{secrets_match, AppState};
use crate::error::{AppError, AppResult};
use crate::telegram::Update;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /telegram/webhook`
///
/// Acknowledges once the update is queued. The enqueue happens before the
/// response, so a user's updates reach the dispatcher in delivery order.
/// Updates that cannot be parsed are acknowledged too, so Telegram does not
/// redeliver them.
pub async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let presented = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !secrets_match(expected, presented) {
            warn!("Rejected webhook call with missing or wrong secret token");
            return Err(AppError::Unauthorized);
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Ignoring malformed update: {}", e);
            return Ok(Json(json!({ "ok": true })));
        }
    };

    let update_id = update.update_id;
    match update.into_event() {
        Some(event) => state.dispatcher.dispatch(event).await,
        None => debug!("Update {} carries nothing to handle", update_id),
    }

    Ok(Json(json!({ "ok": true })))
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/telegram/webhook", post(telegram_webhook))
        .route("/intents/ws", get(super::websocket::intents_ws))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
