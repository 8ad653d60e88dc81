//! Multipart upload handling and persistence under `uploads/`.

use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use tracing::debug;

use crate::error::ApiError;

/// One file field read from a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Reject uploads that arrived without a filename.
    pub fn require_filename(&self) -> Result<&str, ApiError> {
        if self.filename.trim().is_empty() {
            return Err(ApiError::BadRequest("No selected file".into()));
        }
        Ok(&self.filename)
    }

    pub fn filename_opt(&self) -> Option<&str> {
        Some(self.filename.as_str()).filter(|f| !f.trim().is_empty())
    }
}

/// Read the first field called `name`; other fields are skipped.
pub async fn read_file_field(multipart: &mut Multipart, name: &str) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(name) {
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        debug!("Received {} ({} bytes)", filename, bytes.len());
        return Ok(UploadedFile {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::BadRequest("No file uploaded".into()))
}

/// Strip directory components from a client-supplied filename.
pub fn sanitize_filename(name: &str) -> String {
    let name = name.replace(['/', '\\'], "").replace("..", "");

    Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string()
}

/// Target path for `filename` in `dir`, adding a timestamp when it is taken.
fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let path = Path::new(filename);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let ts = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
    if ext.is_empty() {
        dir.join(format!("{}_{}", stem, ts))
    } else {
        dir.join(format!("{}_{}.{}", stem, ts, ext))
    }
}

/// Persist an upload; returns where it was written.
pub async fn save_upload(dir: &Path, upload: &UploadedFile) -> Result<PathBuf, ApiError> {
    let safe = sanitize_filename(&upload.filename);
    let path = unique_path(dir, &safe);
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, &upload.bytes).await?;
    debug!("Saved upload to {}", path.display());
    Ok(path)
}
