use thiserror::Error;

/// Result type for per-frame session work.
pub type SessionResult<T> = Result<T, SessionError>;

/// Failures confined to one frame of one WebSocket session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Text frame was not a JSON object with a `type` field.
    #[error("Invalid control message: {0}")]
    MalformedControl(#[from] serde_json::Error),

    /// `toggle-listen` asked to start listening without naming the listener.
    #[error("toggle-listen with status \"Listening...\" requires a userId")]
    MissingListenerId,

    /// The session's audio file could not be opened, written or closed.
    #[error("Audio sink I/O failed: {0}")]
    Sink(#[from] std::io::Error),
}
