//! WebSocket upgrade and socket loop.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::orchestrator::SessionEvent;
use crate::persona;
use crate::state::AppState;

use super::session::SessionProcessor;

const EVENT_CHANNEL_SIZE: usize = 1024;

/// `GET /ws/session/{persona_id}`: upgrade and run one conversation
/// session against the named persona.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(persona_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, persona_id, state))
}

async fn handle_socket(socket: WebSocket, persona_id: String, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (event_tx, mut event_rx) = mpsc::channel::<SessionEvent>(EVENT_CHANNEL_SIZE);

    // All outbound traffic goes through one sender task so the session
    // core never touches the socket directly.
    let sender_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(payload) => {
                    if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(error) => warn!(error = %error, "failed to serialize session event"),
            }
        }
        let _ = ws_sender.close().await;
    });

    let Some(persona) = persona::find(&persona_id) else {
        warn!(persona_id = %persona_id, "unknown persona requested");
        let _ = event_tx
            .send(SessionEvent::Error {
                message: format!("unknown persona: {persona_id}"),
            })
            .await;
        drop(event_tx);
        let _ = sender_task.await;
        return;
    };

    let session = match SessionProcessor::start(&state.config, persona, event_tx.clone()).await {
        Ok(session) => session,
        Err(error) => {
            // The orchestrator already pushed an error event; just let
            // the sender drain and close.
            warn!(error = %error, "session failed to start");
            drop(event_tx);
            let _ = sender_task.await;
            return;
        }
    };

    while let Some(message) = ws_receiver.next().await {
        let message = match message {
            Ok(message) => message,
            Err(error) => {
                debug!(error = %error, "websocket receive error");
                break;
            }
        };

        match message {
            Message::Text(text) => {
                if session.handle_text(text.as_str()).await.is_break() {
                    break;
                }
            }
            Message::Binary(data) => session.handle_binary(data.to_vec()).await,
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    info!(session_id = %session.session_id(), "session closing");
    session.shutdown().await;

    // Drop our channel handle so the sender task drains and exits.
    drop(event_tx);
    let _ = sender_task.await;
}
