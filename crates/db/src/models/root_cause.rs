//! Root cause entity model and DTOs.

use aqms_core::action::RootCauseSummary;
use aqms_core::error::CoreError;
use aqms_core::status::{RootCauseStatus, StatusId};
use aqms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `root_causes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RootCause {
    pub id: DbId,
    pub finding_id: DbId,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub status_id: StatusId,
    pub reason_reject: Option<String>,
    pub proposed_by: DbId,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RootCause {
    pub fn status(&self) -> Result<RootCauseStatus, CoreError> {
        RootCauseStatus::try_from_id(self.status_id)
    }

    /// The fields action planning needs.
    pub fn summary(&self) -> Result<RootCauseSummary, CoreError> {
        Ok(RootCauseSummary {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            status: self.status()?,
        })
    }
}

/// Request body for proposing a root cause.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRootCause {
    #[validate(length(min = 1, max = 300, message = "must be 1-300 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub category: String,
    #[validate(length(max = 10000, message = "must be at most 10000 characters"))]
    pub description: Option<String>,
}

/// Request body for re-proposing a rejected root cause. Omitted fields keep
/// their current value.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReproposeRootCause {
    #[validate(length(min = 1, max = 300, message = "must be 1-300 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub category: Option<String>,
    #[validate(length(max = 10000, message = "must be at most 10000 characters"))]
    pub description: Option<String>,
}

/// Request body for rejecting a root cause.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectRootCause {
    pub reason_reject: Option<String>,
}
