//! Connection-scoped audio ingestion and listening-state broadcast core.
//!
//! - `listening`: the shared "who is listening" record and its wire snapshot
//! - `hub`: registry of live sessions plus the single critical section that
//!   applies toggles and fans them out
//! - `recordings`: recordings directory and collision-free filenames
//! - `sink`: per-session append-only audio file

pub mod hub;
pub mod listening;
pub mod recordings;
pub mod sink;

pub use hub::{BroadcastReport, ConnectionId, SessionHub};
pub use listening::{LISTENING_STATUS, ListenerId, ListeningState, StatePush};
pub use recordings::RecordingStore;
pub use sink::{AudioSink, SinkSummary};
