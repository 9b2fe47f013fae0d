//! Audit plan entity model and DTOs.

use aqms_core::error::CoreError;
use aqms_core::status::{AuditStatus, StatusId};
use aqms_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `audits` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Audit {
    pub id: DbId,
    pub title: String,
    pub scope: Option<String>,
    pub dept_id: DbId,
    pub lead_auditor_id: Option<DbId>,
    pub start_date: Date,
    pub end_date: Date,
    pub status_id: StatusId,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Audit {
    pub fn status(&self) -> Result<AuditStatus, CoreError> {
        AuditStatus::try_from_id(self.status_id)
    }
}

/// Request body for creating an audit plan.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAudit {
    #[validate(length(min = 1, max = 300, message = "must be 1-300 characters"))]
    pub title: String,
    pub scope: Option<String>,
    #[validate(range(min = 1, message = "must reference a department"))]
    pub dept_id: DbId,
    pub lead_auditor_id: Option<DbId>,
    pub start_date: Date,
    pub end_date: Date,
}

/// Request body for `PUT /audits/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAuditStatus {
    pub status: String,
}

/// Query parameters for listing audits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditListParams {
    pub dept_id: Option<DbId>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
