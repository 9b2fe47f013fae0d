//! Two-level action review.
//!
//! First level (auditee owner): approve to `Reviewed`, reject, or return.
//! Higher level (lead auditor): approve to `Approved`, reject, or return.
//! A higher-level approval also approves the action's open evidence and
//! closes the finding once its last action is approved, in the same
//! transaction. Actions of a closed or archived finding cannot be reviewed.

use aqms_core::action::{apply, ActionEvent, ReviewLevel};
use aqms_core::attachment::{select_for_bulk_approval, ParentType};
use aqms_core::status::AttachmentStatus;
use aqms_core::types::DbId;
use aqms_core::validation::require_reason;
use aqms_db::models::action::{Action, ReviewRequest};
use aqms_db::repositories::{ActionRepo, AttachmentRepo};
use aqms_events::event_types::{
    entity, ACTION_APPROVED, ACTION_REJECTED, ACTION_RETURNED, ACTION_REVIEWED, FINDING_CLOSED,
};
use aqms_events::DomainEvent;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use super::action::{action_event, lock_action};
use super::finding::{close_if_complete, lock_finding_for_action};
use super::optional_text;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAuditee, RequireLeadAuditor};
use crate::response::DataResponse;
use crate::state::AppState;

/// Result of a review command.
#[derive(Debug, Serialize)]
pub struct ReviewOutcome {
    pub action: Action,
    /// Evidence approved together with the action (higher-level approval only).
    pub approved_attachment_ids: Vec<DbId>,
    /// Whether this review closed the parent finding.
    pub finding_closed: bool,
}

fn event_type_for(event: ActionEvent) -> &'static str {
    match event {
        ActionEvent::Approve(ReviewLevel::First) => ACTION_REVIEWED,
        ActionEvent::Approve(ReviewLevel::Higher) => ACTION_APPROVED,
        ActionEvent::Reject(_) => ACTION_REJECTED,
        ActionEvent::Return(_) => ACTION_RETURNED,
        ActionEvent::UpdateProgress(_) | ActionEvent::Resubmit => ACTION_REVIEWED,
    }
}

fn review_level(event: ActionEvent) -> Option<ReviewLevel> {
    match event {
        ActionEvent::Approve(level) | ActionEvent::Reject(level) | ActionEvent::Return(level) => {
            Some(level)
        }
        ActionEvent::UpdateProgress(_) | ActionEvent::Resubmit => None,
    }
}

/// Rejections and returns must say why; approvals may.
fn review_feedback(event: ActionEvent, feedback: Option<String>) -> AppResult<Option<String>> {
    match event {
        ActionEvent::Reject(_) | ActionEvent::Return(_) => {
            Ok(Some(require_reason(feedback.as_deref(), "Review feedback")?))
        }
        _ => Ok(optional_text(feedback)),
    }
}

async fn review(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
    event: ActionEvent,
    feedback: Option<String>,
) -> AppResult<ReviewOutcome> {
    let feedback = review_feedback(event, feedback)?;

    let mut tx = state.pool.begin().await?;
    let action = lock_action(&mut tx, id).await?;
    let next = apply(action.state()?, event)?;

    let mut approved_attachment_ids = Vec::new();
    if event == ActionEvent::Approve(ReviewLevel::Higher) {
        let current = AttachmentRepo::lock_statuses_for_parent(&mut *tx, ParentType::Action, id)
            .await?
            .into_iter()
            .map(|(attachment_id, status_id)| {
                AttachmentStatus::try_from_id(status_id).map(|status| (attachment_id, status))
            })
            .collect::<Result<Vec<_>, _>>()?;
        approved_attachment_ids = select_for_bulk_approval(current);
        AttachmentRepo::approve_many(&mut *tx, &approved_attachment_ids).await?;
    }

    let action =
        ActionRepo::set_review(&mut *tx, id, next, feedback.as_deref(), user.user_id).await?;

    let finding = lock_finding_for_action(&mut tx, action.finding_id).await?;
    if review_level(event) == Some(ReviewLevel::First) {
        user.ensure_department(finding.dept_id)?;
    }
    let mut finding_closed = false;
    if event == ActionEvent::Approve(ReviewLevel::Higher) {
        finding_closed = close_if_complete(&mut tx, &finding).await?.is_some();
    }
    tx.commit().await?;

    state.event_bus.publish(
        action_event(event_type_for(event), &action, user.user_id).with_payload(json!({
            "finding_id": action.finding_id,
            "status": next.status,
            "progress_percent": next.progress_percent,
            "feedback": feedback,
            "approved_attachment_ids": approved_attachment_ids,
        })),
    );
    if finding_closed {
        state.event_bus.publish(
            DomainEvent::new(FINDING_CLOSED)
                .with_entity(entity::FINDING, action.finding_id)
                .with_actor(user.user_id),
        );
    }
    tracing::info!(
        user_id = user.user_id,
        action_id = id,
        status = %next.status,
        approved_attachments = approved_attachment_ids.len(),
        finding_closed,
        "Action reviewed"
    );

    Ok(ReviewOutcome {
        action,
        approved_attachment_ids,
        finding_closed,
    })
}

/// POST /api/v1/action-reviews/{id}/approve
pub async fn approve(
    RequireAuditee(user): RequireAuditee,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<ReviewOutcome>>> {
    let event = ActionEvent::Approve(ReviewLevel::First);
    let outcome = review(&state, &user, id, event, input.feedback).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/action-reviews/{id}/reject
///
/// Feedback is required; progress resets to 0.
pub async fn reject(
    RequireAuditee(user): RequireAuditee,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<ReviewOutcome>>> {
    let event = ActionEvent::Reject(ReviewLevel::First);
    let outcome = review(&state, &user, id, event, input.feedback).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/action-reviews/{id}/returned
pub async fn return_action(
    RequireAuditee(user): RequireAuditee,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<ReviewOutcome>>> {
    let event = ActionEvent::Return(ReviewLevel::First);
    let outcome = review(&state, &user, id, event, input.feedback).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/action-reviews/{id}/approve/higher-level
pub async fn approve_higher(
    RequireLeadAuditor(user): RequireLeadAuditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<ReviewOutcome>>> {
    let event = ActionEvent::Approve(ReviewLevel::Higher);
    let outcome = review(&state, &user, id, event, input.feedback).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/action-reviews/{id}/reject/higher-level
///
/// Allowed on reviewed and already approved actions; progress resets to 0.
pub async fn reject_higher(
    RequireLeadAuditor(user): RequireLeadAuditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<ReviewOutcome>>> {
    let event = ActionEvent::Reject(ReviewLevel::Higher);
    let outcome = review(&state, &user, id, event, input.feedback).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/action-reviews/{id}/returned/higher-level
pub async fn return_higher(
    RequireLeadAuditor(user): RequireLeadAuditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<ReviewOutcome>>> {
    let event = ActionEvent::Return(ReviewLevel::Higher);
    let outcome = review(&state, &user, id, event, input.feedback).await?;
    Ok(Json(DataResponse { data: outcome }))
}
