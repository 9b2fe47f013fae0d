//! Evidence attachment rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::AttachmentStatus;
use crate::types::DbId;

/// Maximum stored file name length.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// File extensions accepted as evidence.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "gif", "webp", "doc", "docx", "xls", "xlsx", "csv", "txt", "zip",
];

/// The entity an attachment hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentType {
    Finding,
    Action,
}

impl ParentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParentType::Finding => "Finding",
            ParentType::Action => "Action",
        }
    }
}

impl fmt::Display for ParentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParentType {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "finding" => Ok(ParentType::Finding),
            "action" => Ok(ParentType::Action),
            _ => Err(CoreError::Validation(format!(
                "Invalid parent type '{value}'. Must be one of: Finding, Action"
            ))),
        }
    }
}

/// Check whether `current → target` is an allowed review transition.
///
/// Reviewers approve or reject open evidence, may reopen rejected evidence,
/// and anything not yet inactive can be deactivated.
pub fn ensure_transition(
    current: AttachmentStatus,
    target: AttachmentStatus,
) -> Result<(), CoreError> {
    use AttachmentStatus as S;

    let allowed = matches!(
        (current, target),
        (S::Open, S::Approved)
            | (S::Open, S::Rejected)
            | (S::Rejected, S::Open)
            | (S::Open | S::Approved | S::Rejected, S::Inactive)
    );
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot change attachment status from {current} to {target}"
        )))
    }
}

/// Pick the attachments to approve alongside their parent action.
///
/// Only `Open` evidence is approved; rejected and inactive evidence is left
/// untouched.
pub fn select_for_bulk_approval<I>(attachments: I) -> Vec<DbId>
where
    I: IntoIterator<Item = (DbId, AttachmentStatus)>,
{
    attachments
        .into_iter()
        .filter(|(_, status)| *status == AttachmentStatus::Open)
        .map(|(id, _)| id)
        .collect()
}

/// Validate an uploaded file's name and size, returning its lowercase extension.
pub fn validate_upload(file_name: &str, size: u64, max_bytes: u64) -> Result<String, CoreError> {
    if file_name.trim().is_empty() {
        return Err(CoreError::Validation("File name must not be empty".to_string()));
    }
    if file_name.chars().count() > MAX_FILE_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "File name exceeds maximum length of {MAX_FILE_NAME_LENGTH} characters"
        )));
    }
    if size == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".to_string()));
    }
    if size > max_bytes {
        return Err(CoreError::Validation(format!(
            "File is {size} bytes; the limit is {max_bytes} bytes"
        )));
    }

    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Unsupported file type '.{ext}'. Supported: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    Ok(ext)
}

/// Strip path components and unsafe characters from a client-supplied name.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
