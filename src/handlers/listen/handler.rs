//! Listening socket handler
//!
//! Upgrades `GET /ws` and runs one session per connection:
//!
//! 1. open a fresh `stream-*.webm` sink
//! 2. join the hub, which queues the current listening state for this client
//! 3. classify and route every inbound frame in arrival order
//! 4. on close or error, close the sink, release the slot, leave the hub,
//!    then flush and close the socket

use axum::{
    Extension,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::messages::StatePush;
use super::processor::{InboundFrame, handle_frame};
use super::session::ListenSession;
use crate::core::AudioSink;
use crate::middleware::ClientIp;
use crate::state::AppState;

/// Outbound state pushes queued per session before new ones are dropped
const CHANNEL_BUFFER_SIZE: usize = 256;

/// How long the outbound task may take to flush and close after the session ends
const SENDER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Listening socket upgrade handler
///
/// # Arguments
/// * `ws` - The WebSocket upgrade request from Axum
/// * `state` - Application state holding the hub and recordings store
/// * `client_ip` - Connection slot acquired by the connection limit middleware
pub async fn listen_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    let client_ip = client_ip.map(|Extension(ip)| ip);
    debug!(ip = ?client_ip.map(|ClientIp(ip)| ip), "Listening socket upgrade requested");

    let failed_state = state.clone();
    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_failed_upgrade(move |e| {
            warn!("WebSocket upgrade failed: {}", e);
            if let Some(ClientIp(ip)) = client_ip {
                failed_state.release_connection(ip);
            }
        })
        .on_upgrade(move |socket| handle_listen_socket(socket, state, client_ip))
}

async fn handle_listen_socket(
    socket: WebSocket,
    app_state: Arc<AppState>,
    client_ip: Option<ClientIp>,
) {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "WebSocket connection established");

    let sink = match AudioSink::create(&app_state.recordings).await {
        Ok(sink) => {
            info!(
                %connection_id,
                path = %sink.path().display(),
                "Audio sink allocated"
            );
            Some(sink)
        }
        Err(e) => {
            error!(%connection_id, "Failed to open audio sink, audio will be dropped: {}", e);
            None
        }
    };
    let mut session = ListenSession::new(connection_id, sink);

    let (mut sender, mut receiver) = socket.split();
    let (push_tx, mut push_rx) = mpsc::channel::<StatePush>(CHANNEL_BUFFER_SIZE);

    let mut sender_task = tokio::spawn(async move {
        while let Some(push) = push_rx.recv().await {
            let json = match serde_json::to_string(&push) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize state push: {}", e);
                    continue;
                }
            };

            if let Err(e) = sender.send(Message::Text(json.into())).await {
                debug!(%connection_id, "Failed to send state push: {}", e);
                break;
            }
        }

        if let Err(e) = sender.close().await {
            debug!(%connection_id, "WebSocket close did not complete: {}", e);
        }
    });

    app_state.hub.join(connection_id, push_tx);

    while let Some(msg_result) = receiver.next().await {
        match msg_result {
            Ok(msg) => {
                let frame = InboundFrame::classify(msg);
                if !handle_frame(frame, &mut session, &app_state).await {
                    break;
                }
            }
            Err(e) => {
                error!(%connection_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    // Sink first, then the slot, then the hub: a session absent from the hub
    // has its capture complete on disk and its slot returned.
    session.close().await;
    if let Some(ClientIp(ip)) = client_ip {
        app_state.release_connection(ip);
    }
    app_state.hub.leave(&connection_id);

    // The hub held the only sender, so the outbound task now drains and
    // closes the socket, completing the close handshake.
    if tokio::time::timeout(SENDER_SHUTDOWN_TIMEOUT, &mut sender_task)
        .await
        .is_err()
    {
        debug!(%connection_id, "Outbound task did not finish, aborting");
        sender_task.abort();
    }

    info!(%connection_id, "WebSocket connection closed");
}
