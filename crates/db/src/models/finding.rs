//! Finding entity model and DTOs.

use aqms_core::error::CoreError;
use aqms_core::status::{FindingStatus, StatusId};
use aqms_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `findings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Finding {
    pub id: DbId,
    pub audit_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub severity: String,
    pub status_id: StatusId,
    pub dept_id: DbId,
    pub created_by: DbId,
    pub deadline: Date,
    pub witness_id: Option<DbId>,
    pub witness_reason: Option<String>,
    pub witnessed_at: Option<Timestamp>,
    pub reviewer_id: Option<DbId>,
    pub root_cause_id: Option<DbId>,
    pub source: String,
    pub external_auditor_name: Option<String>,
    pub return_reason: Option<String>,
    pub closed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Finding {
    pub fn status(&self) -> Result<FindingStatus, CoreError> {
        FindingStatus::try_from_id(self.status_id)
    }
}

/// Request body for `POST /findings`.
///
/// Severity and source arrive as strings and are parsed into the core enums
/// by the handler; unknown values are validation errors.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFinding {
    #[validate(range(min = 1, message = "is required"))]
    pub audit_id: DbId,
    #[validate(length(min = 1, max = 300, message = "must be 1-300 characters"))]
    pub title: String,
    #[validate(length(max = 10000, message = "must be at most 10000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "is required"))]
    pub severity: String,
    #[validate(range(min = 1, message = "is required"))]
    pub dept_id: DbId,
    pub deadline: Date,
    pub witness_id: Option<DbId>,
    pub source: Option<String>,
    pub external_auditor_name: Option<String>,
}

/// Insert DTO with every field already validated and normalized.
#[derive(Debug, Clone)]
pub struct NewFinding {
    pub audit_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub severity: String,
    pub status_id: StatusId,
    pub dept_id: DbId,
    pub created_by: DbId,
    pub deadline: Date,
    pub witness_id: Option<DbId>,
    pub source: String,
    pub external_auditor_name: Option<String>,
}

/// Query parameters for `GET /findings`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindingListParams {
    pub audit_id: Option<DbId>,
    pub dept_id: Option<DbId>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub witness_id: Option<DbId>,
    /// One of `created_at`, `deadline`, `severity`. Defaults to `created_at`.
    pub sort: Option<String>,
    /// `asc` or `desc`. Defaults to `desc`.
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Parsed filters handed to the repository.
#[derive(Debug, Clone, Default)]
pub struct FindingFilter {
    pub audit_id: Option<DbId>,
    pub dept_id: Option<DbId>,
    pub status_id: Option<StatusId>,
    pub severity: Option<String>,
    pub witness_id: Option<DbId>,
    pub sort: FindingSort,
    pub descending: bool,
    pub limit: i64,
    pub offset: i64,
}

/// Sort keys accepted by the finding list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FindingSort {
    #[default]
    CreatedAt,
    Deadline,
    Severity,
}

impl FindingSort {
    /// Parse a `sort` query value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created_at" => Some(FindingSort::CreatedAt),
            "deadline" => Some(FindingSort::Deadline),
            "severity" => Some(FindingSort::Severity),
            _ => None,
        }
    }

    /// SQL expression for the ORDER BY clause.
    pub fn sql(self) -> &'static str {
        match self {
            FindingSort::CreatedAt => "created_at",
            FindingSort::Deadline => "deadline",
            FindingSort::Severity => {
                "CASE severity WHEN 'Critical' THEN 0 WHEN 'High' THEN 1 \
                 WHEN 'Medium' THEN 2 ELSE 3 END"
            }
        }
    }
}

/// Request body for `POST /findings/{id}/witness`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignWitnessRequest {
    pub witness_id: DbId,
}

/// Request body carrying a mandatory free-text reason
/// (witness disagreement, returning a finding).
#[derive(Debug, Clone, Deserialize)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}
