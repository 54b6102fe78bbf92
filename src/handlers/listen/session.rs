use tracing::{debug, error, info};

use crate::core::{AudioSink, ConnectionId};
use crate::errors::session_error::SessionResult;

/// Server-side state of one live listening socket
#[derive(Debug)]
pub struct ListenSession {
    connection_id: ConnectionId,
    sink: Option<AudioSink>,
    dropped_chunks: u64,
}

impl ListenSession {
    /// `sink` is `None` when the capture file could not be opened; binary
    /// frames are then dropped.
    pub fn new(connection_id: ConnectionId, sink: Option<AudioSink>) -> Self {
        Self {
            connection_id,
            sink,
            dropped_chunks: 0,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn dropped_chunks(&self) -> u64 {
        self.dropped_chunks
    }

    /// Append one binary frame to the capture file
    pub async fn write_audio(&mut self, chunk: &[u8]) -> SessionResult<()> {
        let Some(sink) = self.sink.as_mut() else {
            self.dropped_chunks += 1;
            debug!(
                connection_id = %self.connection_id,
                bytes = chunk.len(),
                "No audio sink, dropping chunk"
            );
            return Ok(());
        };

        if let Err(e) = sink.append(chunk).await {
            self.dropped_chunks += 1;
            return Err(e.into());
        }
        Ok(())
    }

    /// Flush and close the capture file. The file stays on disk.
    pub async fn close(self) {
        let connection_id = self.connection_id;
        let Some(sink) = self.sink else {
            return;
        };

        match sink.close().await {
            Ok(summary) => info!(
                %connection_id,
                path = %summary.path.display(),
                bytes = summary.bytes_written,
                chunks = summary.chunks_written,
                dropped = self.dropped_chunks,
                "Audio sink closed"
            ),
            Err(e) => error!(%connection_id, "Failed to close audio sink: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RecordingStore;
    use tempfile::TempDir;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_session_without_sink_drops_audio() {
        let mut session = ListenSession::new(Uuid::new_v4(), None);

        session.write_audio(b"abc").await.unwrap();
        session.write_audio(b"def").await.unwrap();

        assert!(!session.has_sink());
        assert_eq!(session.dropped_chunks(), 2);
        session.close().await;
    }

    #[tokio::test]
    async fn test_session_writes_through_to_sink() {
        let temp = TempDir::new().unwrap();
        let store = RecordingStore::new(temp.path());
        let sink = AudioSink::create(&store).await.unwrap();
        let path = sink.path().to_path_buf();

        let mut session = ListenSession::new(Uuid::new_v4(), Some(sink));
        session.write_audio(b"first-").await.unwrap();
        session.write_audio(b"second").await.unwrap();
        session.close().await;

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"first-second");
    }
}
