//! Error types.
//!
//! - `app_error`: errors returned from HTTP handlers, rendered as
//!   `{"error": "..."}` JSON bodies
//! - `session_error`: per-frame failures inside a WebSocket session, logged
//!   and never sent to the client

pub mod app_error;
pub mod session_error;
