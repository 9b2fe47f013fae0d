//! Handlers for corrective actions (CAPA): assignment from approved root
//! causes, progress updates by the assignee, and resubmission.

use aqms_core::action::{apply, plan_actions, validate_due_date, ActionEvent};
use aqms_core::error::CoreError;
use aqms_core::finding::{next_status, FindingEvent};
use aqms_core::roles::AUDITEE_ROLES;
use aqms_core::status::ActionStatus;
use aqms_core::types::DbId;
use aqms_core::validation::validate_request;
use aqms_db::models::action::{
    Action, ActionDetail, AssignActionsRequest, NewAction, UpdateProgressRequest,
};
use aqms_db::repositories::{ActionRepo, FindingRepo, RootCauseRepo, UserRepo};
use aqms_events::event_types::{
    entity, ACTION_ASSIGNED, ACTION_PROGRESS_UPDATED, ACTION_RESUBMITTED, FINDING_RECEIVED,
};
use aqms_events::DomainEvent;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use sqlx::PgConnection;

use super::finding::{find_finding, lock_finding, lock_finding_for_action};
use super::{optional_text, today};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAuditee, RequireAuth};
use crate::query::{parse_optional, StatusFilterParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Lock an action inside a transaction or return 404.
pub(crate) async fn lock_action(conn: &mut PgConnection, id: DbId) -> AppResult<Action> {
    ActionRepo::lock(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Action", id))
}

pub(crate) fn action_event(event_type: &str, action: &Action, actor: DbId) -> DomainEvent {
    DomainEvent::new(event_type)
        .with_entity(entity::ACTION, action.id)
        .with_actor(actor)
}

/// GET /api/v1/findings/{finding_id}/actions
pub async fn list_by_finding(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(finding_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Action>>>> {
    find_finding(&state.pool, finding_id).await?;
    let actions = ActionRepo::list_by_finding(&state.pool, finding_id).await?;
    Ok(Json(DataResponse { data: actions }))
}

/// POST /api/v1/findings/{finding_id}/actions
///
/// Assign approved root causes to staff. Creates one action per distinct
/// staff member and marks the finding received, all in one transaction.
/// Refused unless every root cause of the finding is approved.
pub async fn assign(
    RequireAuditee(user): RequireAuditee,
    State(state): State<AppState>,
    Path(finding_id): Path<DbId>,
    Json(input): Json<AssignActionsRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;

    let mut tx = state.pool.begin().await?;
    let finding = lock_finding(&mut tx, finding_id).await?;
    user.ensure_department(finding.dept_id)?;
    validate_due_date(input.due_date, today(), finding.deadline)?;

    let summaries = RootCauseRepo::list_by_finding(&mut *tx, finding_id)
        .await?
        .iter()
        .map(|rc| rc.summary())
        .collect::<Result<Vec<_>, _>>()?;
    let planned = plan_actions(&summaries, &input.assignments)?;

    let previous = finding.status()?;
    let received = next_status(previous, FindingEvent::MarkReceived)?;
    FindingRepo::set_received(&mut *tx, finding_id, user.user_id).await?;

    let title = optional_text(input.title.clone()).unwrap_or_else(|| finding.title.clone());
    let mut created = Vec::with_capacity(planned.len());
    for plan in planned {
        let staff = UserRepo::find_by_id(&mut *tx, plan.assigned_to)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| {
                AppError::Core(CoreError::Validation(format!(
                    "Staff member {} does not exist or is inactive",
                    plan.assigned_to
                )))
            })?;

        let action = ActionRepo::create(
            &mut tx,
            &NewAction {
                finding_id,
                title: title.clone(),
                description: plan.description,
                assigned_to: staff.id,
                assigned_dept_id: staff.dept_id,
                due_date: input.due_date,
                created_by: user.user_id,
                root_cause_ids: plan.root_cause_ids.clone(),
            },
        )
        .await?;
        created.push(ActionDetail {
            action,
            root_cause_ids: plan.root_cause_ids,
        });
    }
    tx.commit().await?;

    if previous != received {
        state.event_bus.publish(
            DomainEvent::new(FINDING_RECEIVED)
                .with_entity(entity::FINDING, finding_id)
                .with_actor(user.user_id),
        );
    }
    for detail in &created {
        state.event_bus.publish(
            action_event(ACTION_ASSIGNED, &detail.action, user.user_id).with_payload(json!({
                "finding_id": finding_id,
                "assigned_to": detail.action.assigned_to,
                "root_cause_ids": detail.root_cause_ids,
                "due_date": detail.action.due_date,
            })),
        );
    }
    tracing::info!(
        user_id = user.user_id,
        finding_id,
        action_count = created.len(),
        "Corrective actions assigned"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/actions/mine?status=
///
/// Actions assigned to the caller.
pub async fn list_mine(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<StatusFilterParams>,
) -> AppResult<Json<DataResponse<Vec<Action>>>> {
    let status: Option<ActionStatus> = parse_optional(params.status.as_deref())?;
    let actions =
        ActionRepo::list_assigned_to(&state.pool, user.user_id, status.map(ActionStatus::id)).await?;
    Ok(Json(DataResponse { data: actions }))
}

/// GET /api/v1/actions/{id}
///
/// The action with the ids of the root causes it remediates.
pub async fn get(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ActionDetail>>> {
    let mut conn = state.pool.acquire().await?;
    let detail = ActionRepo::find_detail(&mut conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Action", id))?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/actions/{id}/progress
///
/// Only the assignee, only while the action is `Open`. Values outside
/// 0-100 are clamped.
pub async fn update_progress(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProgressRequest>,
) -> AppResult<Json<DataResponse<Action>>> {
    let mut tx = state.pool.begin().await?;
    let action = lock_action(&mut tx, id).await?;
    if action.assigned_to != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the assignee may update progress".into(),
        )));
    }
    let next = apply(action.state()?, ActionEvent::UpdateProgress(input.progress_percent))?;
    lock_finding_for_action(&mut tx, action.finding_id).await?;
    let action = ActionRepo::set_progress(&mut *tx, id, next.progress_percent).await?;
    tx.commit().await?;

    state.event_bus.publish(
        action_event(ACTION_PROGRESS_UPDATED, &action, user.user_id)
            .with_payload(json!({ "progress_percent": action.progress_percent })),
    );
    tracing::info!(
        user_id = user.user_id,
        action_id = id,
        progress_percent = action.progress_percent,
        "Action progress updated"
    );

    Ok(Json(DataResponse { data: action }))
}

/// POST /api/v1/actions/{id}/resubmit
///
/// Reopen a returned or rejected action ("Redo"). Allowed for the assignee
/// and auditee owners.
pub async fn resubmit(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Action>>> {
    let mut tx = state.pool.begin().await?;
    let action = lock_action(&mut tx, id).await?;
    if action.assigned_to != user.user_id {
        user.require_any(AUDITEE_ROLES, "Only the assignee or an auditee owner may resubmit")?;
    }
    let next = apply(action.state()?, ActionEvent::Resubmit)?;
    lock_finding_for_action(&mut tx, action.finding_id).await?;
    let action = ActionRepo::set_reopened(&mut *tx, id).await?;
    tx.commit().await?;

    state
        .event_bus
        .publish(action_event(ACTION_RESUBMITTED, &action, user.user_id));
    tracing::info!(user_id = user.user_id, action_id = id, status = %next.status, "Action resubmitted");

    Ok(Json(DataResponse { data: action }))
}
