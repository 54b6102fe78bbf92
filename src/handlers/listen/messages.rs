//! Listening socket message types

use serde::{Deserialize, Serialize};

use crate::core::ListenerId;
pub use crate::core::StatePush;

/// Control messages sent as JSON text frames
///
/// Closed set keyed on `type`. Any `type` this server does not handle parses
/// as [`ControlMessage::Unknown`] and is ignored; a frame with no `type` at
/// all is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Start or stop listening
    #[serde(rename = "toggle-listen")]
    ToggleListen {
        /// `"Listening..."` starts listening, anything else stops it
        #[serde(default)]
        status: String,
        /// Client designated as listener, any JSON value except `null`
        #[serde(default, rename = "userId")]
        user_id: Option<ListenerId>,
    },

    #[serde(other)]
    Unknown,
}
