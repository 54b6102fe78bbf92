//! Recordings directory and filename generation.
//!
//! Two unrelated file families share the directory:
//!
//! - `stream-<timestamp>-<random>.webm`: raw capture of one WebSocket session
//! - `recording-<timestamp>.webm`: a file received through `POST /upload`
//!
//! Timestamps come from a process-wide monotonic millisecond clock, so two
//! names generated by this process never share a timestamp.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

pub const RECORDING_EXTENSION: &str = "webm";
pub const STREAM_PREFIX: &str = "stream";
pub const UPLOAD_PREFIX: &str = "recording";

/// Length of the random suffix on stream filenames.
const STREAM_SUFFIX_LEN: usize = 8;

static LAST_TIMESTAMP_MS: AtomicU64 = AtomicU64::new(0);

/// Wall-clock milliseconds since the epoch, bumped forward when needed so
/// that no two calls in this process return the same value.
pub fn monotonic_timestamp_ms() -> u64 {
    let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64;
    let mut last = LAST_TIMESTAMP_MS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TIMESTAMP_MS.compare_exchange_weak(
            last,
            next,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// `stream-<timestamp>-<random>.webm`
pub fn stream_filename() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{STREAM_PREFIX}-{}-{}.{RECORDING_EXTENSION}",
        monotonic_timestamp_ms(),
        &random[..STREAM_SUFFIX_LEN]
    )
}

/// `recording-<timestamp>.webm`
pub fn upload_filename() -> String {
    format!(
        "{UPLOAD_PREFIX}-{}.{RECORDING_EXTENSION}",
        monotonic_timestamp_ms()
    )
}

/// Location where session sinks and uploads are written.
#[derive(Debug, Clone)]
pub struct RecordingStore {
    dir: PathBuf,
}

impl RecordingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory (and parents) if it does not exist yet.
    pub async fn prepare(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        info!("Recordings directory ready at {}", self.dir.display());
        Ok(())
    }

    /// Fresh path for a session capture file.
    pub fn next_stream_path(&self) -> PathBuf {
        self.dir.join(stream_filename())
    }

    /// Fresh `(filename, path)` for an uploaded recording.
    pub fn next_upload_path(&self) -> (String, PathBuf) {
        let filename = upload_filename();
        let path = self.dir.join(&filename);
        (filename, path)
    }
}
