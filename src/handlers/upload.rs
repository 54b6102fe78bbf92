//! `POST /upload`: whole-file fallback for clients that cannot stream
//!
//! Accepts a multipart form with a file field named `audio` and stores it as
//! `recording-<timestamp>.webm` in the recordings directory. Never touches the
//! shared listening state.

use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

use crate::core::RecordingStore;
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio";

pub const NO_AUDIO_FILE: &str = "No audio file provided";

pub const UPLOAD_SUCCESS: &str = "File uploaded successfully";

/// Fresh filenames tried before giving up on an upload
const MAX_NAME_ATTEMPTS: usize = 64;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

/// Store an uploaded recording
///
/// Fields other than `audio`, and an `audio` field sent without a filename,
/// are skipped. Only the first `audio` file is stored.
///
/// # Returns
/// * `200 {message, filename}` on success
/// * `400 {"error": "No audio file provided"}` when no `audio` file is present
pub async fn upload_recording(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) || field.file_name().is_none() {
            continue;
        }

        let (filename, path, file) = create_upload_file(&state.recordings).await?;
        let size = match persist_field(field, file).await {
            Ok(size) => size,
            Err(e) => {
                // Only reached for a file this request created itself
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    warn!(
                        path = %path.display(),
                        "Failed to remove partial upload: {}", remove_err
                    );
                }
                return Err(e);
            }
        };

        info!("File uploaded: {} ({:.2} KB)", filename, size as f64 / 1024.0);

        return Ok(Json(UploadResponse {
            message: UPLOAD_SUCCESS.to_string(),
            filename,
        }));
    }

    Err(AppError::BadRequest(NO_AUDIO_FILE.to_string()))
}

/// Open a fresh `recording-*.webm`, skipping names already on disk
///
/// Existing files are never opened for writing or removed.
async fn create_upload_file(store: &RecordingStore) -> AppResult<(String, PathBuf, File)> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let (filename, path) = store.next_upload_path();
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((filename, path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(path = %path.display(), "Upload filename already taken, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Storage(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free upload filename after {MAX_NAME_ATTEMPTS} attempts"),
    )))
}

/// Stream one field into `file`, returning the number of bytes written
async fn persist_field(mut field: Field<'_>, file: File) -> AppResult<u64> {
    let mut writer = BufWriter::new(file);
    let mut size = 0u64;

    while let Some(chunk) = field.chunk().await? {
        writer.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }

    writer.flush().await?;
    writer.shutdown().await?;
    Ok(size)
}
