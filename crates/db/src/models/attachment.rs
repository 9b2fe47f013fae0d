//! Evidence attachment model and DTOs.

use aqms_core::error::CoreError;
use aqms_core::status::{AttachmentStatus, StatusId};
use aqms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `attachments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attachment {
    pub id: DbId,
    pub parent_type: String,
    pub parent_id: DbId,
    pub file_name: String,
    /// Path relative to the storage root. Not exposed to clients.
    #[serde(skip_serializing)]
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    pub status_id: StatusId,
    pub uploaded_by: DbId,
    pub uploaded_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Attachment {
    pub fn status(&self) -> Result<AttachmentStatus, CoreError> {
        AttachmentStatus::try_from_id(self.status_id)
    }
}

/// Insert DTO built by the upload handler after the file is on disk.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub parent_type: String,
    pub parent_id: DbId,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: String,
    pub uploaded_by: DbId,
}

/// Request body for `PUT /attachments/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAttachmentStatus {
    pub status: String,
}

/// Query parameters for `GET /attachments`.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentListParams {
    pub parent_type: String,
    pub parent_id: DbId,
    /// Include `Inactive` attachments. Defaults to false.
    #[serde(default)]
    pub include_inactive: bool,
}
