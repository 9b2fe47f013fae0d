//! On-disk storage for evidence attachments.
//!
//! Files live under a configurable root as
//! `<parent_type>/<parent_id>/<uuid>-<sanitized name>`. Only the relative
//! path is stored in the database, so the root can move between deployments.

use std::io;
use std::path::{Component, Path, PathBuf};

use aqms_core::attachment::ParentType;
use aqms_core::types::DbId;
use uuid::Uuid;

/// Errors raised by [`EvidenceStore`].
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The stored relative path escapes the storage root or is absolute.
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Evidence file store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    root: PathBuf,
}

impl EvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` for a parent entity and return the relative path to store.
    ///
    /// `file_name` must already be sanitized; a UUID prefix keeps repeated
    /// uploads of the same name apart.
    pub async fn save(
        &self,
        parent_type: ParentType,
        parent_id: DbId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let relative = format!(
            "{}/{parent_id}/{}-{file_name}",
            parent_type.as_str().to_ascii_lowercase(),
            Uuid::new_v4()
        );
        let dest = self.resolve(&relative)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, bytes).await?;
        Ok(relative)
    }

    /// Open a stored file for streaming.
    pub async fn open(&self, relative: &str) -> Result<tokio::fs::File, StorageError> {
        let path = self.resolve(relative)?;
        Ok(tokio::fs::File::open(path).await?)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<(), StorageError> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Map a stored relative path to an absolute one under the root.
    ///
    /// Only plain path components are accepted.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(relative);
        let is_plain = path.components().all(|c| matches!(c, Component::Normal(_)));
        if relative.is_empty() || !is_plain {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(path))
    }
}

/// MIME type for an allowed evidence extension.
pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
