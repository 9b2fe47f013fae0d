//! Corrective action (CAPA) model and DTOs.

use aqms_core::action::{ActionState, StaffAssignment};
use aqms_core::error::CoreError;
use aqms_core::status::{ActionStatus, StatusId};
use aqms_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `actions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Action {
    pub id: DbId,
    pub finding_id: DbId,
    pub title: String,
    pub description: String,
    pub assigned_to: DbId,
    pub assigned_dept_id: Option<DbId>,
    pub due_date: Date,
    pub progress_percent: i32,
    pub status_id: StatusId,
    pub review_feedback: Option<String>,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Action {
    pub fn status(&self) -> Result<ActionStatus, CoreError> {
        ActionStatus::try_from_id(self.status_id)
    }

    /// The review-relevant part of the row, for the core state machine.
    pub fn state(&self) -> Result<ActionState, CoreError> {
        Ok(ActionState::new(self.status()?, self.progress_percent))
    }
}

/// An action together with the ids of the root causes it remediates.
#[derive(Debug, Clone, Serialize)]
pub struct ActionDetail {
    #[serde(flatten)]
    pub action: Action,
    pub root_cause_ids: Vec<DbId>,
}

/// Request body for `POST /findings/{id}/actions`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignActionsRequest {
    #[validate(length(min = 1, message = "must contain at least one assignment"))]
    pub assignments: Vec<StaffAssignment>,
    pub due_date: Date,
    #[validate(length(min = 1, max = 300, message = "must be 1-300 characters"))]
    pub title: Option<String>,
}

/// Insert DTO for a single planned action.
#[derive(Debug, Clone)]
pub struct NewAction {
    pub finding_id: DbId,
    pub title: String,
    pub description: String,
    pub assigned_to: DbId,
    pub assigned_dept_id: Option<DbId>,
    pub due_date: Date,
    pub created_by: DbId,
    pub root_cause_ids: Vec<DbId>,
}

/// Request body for `PUT /actions/{id}/progress`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProgressRequest {
    pub progress_percent: i32,
}

/// Request body for the review endpoints. Feedback is mandatory on reject
/// and return, optional on approve.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRequest {
    pub feedback: Option<String>,
}
