//! # Uploads
//!
//! Product images and other user files behind a small blob store trait.
//!
//! ## Handles
//! ```text
//!   save(bytes, "Foto do Café.PNG")
//!        │
//!        ▼
//!   sanitize: last path component, [A-Za-z0-9._-] kept, others → '_'
//!        │
//!        ▼
//!   handle = "{uuid}_Foto_do_Caf_.PNG"   (written under the upload dir)
//! ```
//!
//! `retrieve` refuses handles with path separators or `..`, so a handle
//! can never point outside the upload directory.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::UploadSettings;

/// Upload errors.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File too large: {size} bytes (limit {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("No file content")]
    Empty,

    #[error("Invalid file handle: {0}")]
    InvalidHandle(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Upload I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Opaque blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` and returns the handle to fetch them with.
    async fn save(&self, bytes: &[u8], suggested_name: &str) -> UploadResult<String>;

    async fn retrieve(&self, handle: &str) -> UploadResult<Vec<u8>>;
}

/// Blob store writing plain files into one directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
    max_bytes: u64,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        FsBlobStore {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn from_settings(settings: &UploadSettings) -> Self {
        Self::new(settings.dir.clone(), settings.max_bytes)
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn save(&self, bytes: &[u8], suggested_name: &str) -> UploadResult<String> {
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        let handle = format!("{}_{}", Uuid::new_v4(), sanitize_filename(suggested_name));

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&handle), bytes).await?;

        info!(handle = %handle, size, "Upload saved");
        Ok(handle)
    }

    async fn retrieve(&self, handle: &str) -> UploadResult<Vec<u8>> {
        check_handle(handle)?;

        match tokio::fs::read(self.dir.join(handle)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(handle = %handle, "Upload not found");
                Err(UploadError::NotFound(handle.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Reduces a client-supplied name to a safe file name.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn check_handle(handle: &str) -> UploadResult<()> {
    if handle.is_empty()
        || handle.contains('/')
        || handle.contains('\\')
        || handle.contains("..")
    {
        return Err(UploadError::InvalidHandle(handle.to_string()));
    }
    Ok(())
}
