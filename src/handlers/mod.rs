//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `listen` - Listening socket: audio capture and listening-state broadcast
//! - `upload` - Whole-file audio upload fallback

pub mod api;
pub mod listen;
pub mod upload;

pub use listen::listen_handler;
pub use upload::upload_recording;
