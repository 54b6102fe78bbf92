//! Per-session audio sink.
//!
//! An [`AudioSink`] is an append-only file owned by exactly one session. It
//! accumulates the raw concatenation of every binary frame received on that
//! connection: no framing, no length prefix. [`AudioSink::close`] consumes the
//! sink, so it can only be closed once. The file is kept on disk whatever
//! happens to the connection.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::recordings::RecordingStore;

const SINK_BUFFER_SIZE: usize = 64 * 1024;

/// What a sink wrote over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSummary {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub chunks_written: u64,
}

#[derive(Debug)]
pub struct AudioSink {
    path: PathBuf,
    writer: BufWriter<File>,
    bytes_written: u64,
    chunks_written: u64,
}

impl AudioSink {
    /// Open a fresh `stream-*.webm` file in the store.
    ///
    /// The file is created with `create_new`, so an existing recording is
    /// never truncated.
    pub async fn create(store: &RecordingStore) -> io::Result<Self> {
        Self::create_at(store.next_stream_path()).await
    }

    pub async fn create_at(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), "Audio sink opened");

        Ok(Self {
            path,
            writer: BufWriter::with_capacity(SINK_BUFFER_SIZE, file),
            bytes_written: 0,
            chunks_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one chunk verbatim.
    pub async fn append(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.writer.write_all(chunk).await?;
        self.bytes_written += chunk.len() as u64;
        self.chunks_written += 1;
        Ok(())
    }

    /// Flush buffered bytes and close the file.
    pub async fn close(mut self) -> io::Result<SinkSummary> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;

        Ok(SinkSummary {
            path: self.path,
            bytes_written: self.bytes_written,
            chunks_written: self.chunks_written,
        })
    }
}
