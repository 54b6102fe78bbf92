//! Listening socket
//!
//! One WebSocket session per client. Each session owns an audio sink and
//! demultiplexes inbound frames:
//!
//! ## Client → Server
//!
//! - **toggle-listen** (text): `{"type": "toggle-listen", "status": "Listening..." | "", "userId": "..."}`
//!   updates the shared listening state and is broadcast to every session
//! - **Binary frames**: raw audio appended to the session's `stream-*.webm` file
//!
//! ## Server → Client
//!
//! - `{"status": "Listening..." | "", "userId": "..." | null}` on connect and
//!   after every toggle

mod handler;
pub mod messages;
pub mod processor;
mod session;

pub use handler::listen_handler;
pub use messages::ControlMessage;
pub use processor::InboundFrame;
pub use session::ListenSession;
