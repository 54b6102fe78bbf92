//! Inbound frame demultiplexing
//!
//! Every WebSocket message is classified once at the transport boundary into
//! an [`InboundFrame`], then routed by [`handle_frame`]. Nothing here can
//! terminate the session except a close frame: malformed control messages,
//! rejected toggles and sink write failures are logged and the next frame is
//! processed normally.

use axum::extract::ws::Message;
use bytes::Bytes;
use tracing::{debug, error, info, warn};

use super::messages::ControlMessage;
use super::session::ListenSession;
use crate::errors::session_error::SessionError;
use crate::state::AppState;

/// One classified inbound frame
#[derive(Debug)]
pub enum InboundFrame {
    /// Text frame carrying a parsed control message
    Control(ControlMessage),
    /// Text frame that is not a valid control message
    Malformed(SessionError),
    /// Binary frame: raw audio
    Data(Bytes),
    /// Ping or pong; axum answers pings itself
    Keepalive,
    /// Client-initiated close
    Close,
}

impl InboundFrame {
    pub fn classify(msg: Message) -> Self {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ControlMessage>(text.as_str()) {
                Ok(control) => InboundFrame::Control(control),
                Err(e) => InboundFrame::Malformed(e.into()),
            },
            Message::Binary(data) => InboundFrame::Data(data),
            Message::Ping(_) | Message::Pong(_) => InboundFrame::Keepalive,
            Message::Close(_) => InboundFrame::Close,
        }
    }
}

/// Route one frame
///
/// # Returns
/// * `bool` - true to keep reading, false when the client closed the socket
pub async fn handle_frame(
    frame: InboundFrame,
    session: &mut ListenSession,
    app_state: &AppState,
) -> bool {
    let connection_id = session.connection_id();

    match frame {
        InboundFrame::Control(ControlMessage::ToggleListen { status, user_id }) => {
            match app_state.hub.toggle(&status, user_id) {
                Ok(report) => debug!(
                    %connection_id,
                    delivered = report.delivered,
                    skipped = report.skipped,
                    "toggle-listen applied"
                ),
                Err(e) => warn!(%connection_id, "Ignoring toggle-listen: {}", e),
            }
            true
        }
        InboundFrame::Control(ControlMessage::Unknown) => {
            debug!(%connection_id, "Ignoring control message with unhandled type");
            true
        }
        InboundFrame::Malformed(e) => {
            warn!(%connection_id, "Invalid JSON message: {}", e);
            true
        }
        InboundFrame::Data(data) => {
            debug!(%connection_id, bytes = data.len(), "Received audio chunk");
            if let Err(e) = session.write_audio(&data).await {
                error!(%connection_id, "Failed to write audio chunk: {}", e);
            }
            true
        }
        InboundFrame::Keepalive => true,
        InboundFrame::Close => {
            info!(%connection_id, "Close frame received");
            false
        }
    }
}
