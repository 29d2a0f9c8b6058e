//! WebSocket push of pipeline status events
//!
//! A client connecting to `/ws` first receives one snapshot frame per known
//! pipeline, then an update frame after every stage status change. Frames are
//! JSON-encoded [`StatusEvent`](crate::models::StatusEvent)s.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info};

use super::AppState;

pub async fn status_websocket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_status_socket(state, socket))
}

async fn handle_status_socket(state: AppState, socket: WebSocket) {
    let service = state.pipeline_service.clone();
    let mut subscription = service.subscribe().await;
    let subscriber_id = subscription.id();
    info!(subscriber_id = %subscriber_id, "Client connected!");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else {
                    break;
                };
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!(subscriber_id = %subscriber_id, "Failed to encode status event: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(payload)).await.is_err() {
                    debug!(subscriber_id = %subscriber_id, "Send failed, closing connection");
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(subscriber_id = %subscriber_id, "WebSocket error: {}", e);
                        break;
                    }
                    // Client frames carry no commands
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    service.unsubscribe(&subscription).await;
    info!(subscriber_id = %subscriber_id, "Client disconnected!");
}
