//! WebSocket endpoint bridging sockets to the hub

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::hub::messages::ServerEvent;
use crate::hub::{ClientConnection, Hub, PROCESSING_ERROR};
use crate::server::state::ServerState;

/// Upgrade handler for `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<Hub>) {
    let (mut sink, mut stream) = socket.split();
    let ClientConnection { id, mut events } = hub.connect().await;

    let writer = tokio::spawn(async move {
        while let Some(text) = events.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                hub.handle_message(&id, text.as_str()).await;
            }
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    hub.handle_message(&id, text).await;
                }
                Err(_) => {
                    hub.clients()
                        .send_to(&id, &ServerEvent::error(PROCESSING_ERROR));
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Socket error for client {}: {}", id, e);
                break;
            }
        }
    }

    hub.disconnect(&id);
    if writer.await.is_err() {
        warn!("Writer task for client {} panicked", id);
    }
}
