use super::{secrets_match, AppState};
use crate::error::AppError;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

/// `GET /intents/ws`: stream trade intents to an authenticated trade engine.
pub async fn intents_ws(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(expected) = state.intents_token.as_deref() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();
    if !secrets_match(expected, presented) {
        warn!("Rejected intent stream connection: bad token");
        return AppError::Unauthorized.into_response();
    }

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, state)),
        Err(rejection) => rejection.into_response(),
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.intents.subscribe();
    info!(
        "Trade engine connected ({} subscriber(s))",
        state.intents.subscriber_count()
    );

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(intent) => {
                    let json = match serde_json::to_string(&intent) {
                        Ok(j) => j,
                        Err(e) => {
                            error!("Failed to serialize intent {}: {}", intent.id, e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    warn!("Intent stream lagged, {} intent(s) lost", n);
                    continue;
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    error!("Intent stream error: {}", e);
                    break;
                }
            }
        }
    });

    // The receiver must not outlive the socket or it keeps counting as a
    // subscriber.
    tokio::select! {
        _ = &mut send_task => {
            debug!("Intent send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!("Intent receive task completed");
            send_task.abort();
        }
    }

    info!("Trade engine disconnected");
}
