//! Handlers for root causes: proposal by the auditee, review by auditors,
//! and re-proposal after rejection.

use aqms_core::finding::accepts_root_causes;
use aqms_core::root_cause::{next_status, RootCauseEvent};
use aqms_core::types::DbId;
use aqms_core::validation::{require_reason, validate_request};
use aqms_db::models::root_cause::{CreateRootCause, RejectRootCause, ReproposeRootCause, RootCause};
use aqms_db::repositories::{FindingRepo, RootCauseRepo};
use aqms_events::event_types::{
    entity, ROOT_CAUSE_APPROVED, ROOT_CAUSE_PROPOSED, ROOT_CAUSE_REJECTED, ROOT_CAUSE_REPROPOSED,
};
use aqms_events::DomainEvent;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use sqlx::PgConnection;

use super::finding::{find_finding, lock_finding};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAuditee, RequireAuth, RequireRootCauseReviewer};
use crate::response::DataResponse;
use crate::state::AppState;

async fn lock_root_cause(conn: &mut PgConnection, id: DbId) -> AppResult<RootCause> {
    RootCauseRepo::lock(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("RootCause", id))
}

fn root_cause_event(event_type: &str, root_cause: &RootCause, actor: DbId) -> DomainEvent {
    DomainEvent::new(event_type)
        .with_entity(entity::ROOT_CAUSE, root_cause.id)
        .with_actor(actor)
}

/// GET /api/v1/findings/{finding_id}/root-causes
pub async fn list_by_finding(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(finding_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<RootCause>>>> {
    find_finding(&state.pool, finding_id).await?;
    let root_causes = RootCauseRepo::list_by_finding(&state.pool, finding_id).await?;
    Ok(Json(DataResponse { data: root_causes }))
}

/// GET /api/v1/findings/{finding_id}/root-causes/approved
///
/// The root causes offered on the action assignment form.
pub async fn list_approved(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(finding_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<RootCause>>>> {
    find_finding(&state.pool, finding_id).await?;
    let root_causes = RootCauseRepo::list_approved(&state.pool, finding_id).await?;
    Ok(Json(DataResponse { data: root_causes }))
}

/// POST /api/v1/findings/{finding_id}/root-causes
pub async fn propose(
    RequireAuditee(user): RequireAuditee,
    State(state): State<AppState>,
    Path(finding_id): Path<DbId>,
    Json(input): Json<CreateRootCause>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;

    // The finding lock serialises proposals with closure.
    let mut tx = state.pool.begin().await?;
    let finding = lock_finding(&mut tx, finding_id).await?;
    user.ensure_department(finding.dept_id)?;
    accepts_root_causes(finding.status()?)?;
    let root_cause = RootCauseRepo::create(&mut *tx, finding_id, &input, user.user_id).await?;
    tx.commit().await?;

    state.event_bus.publish(
        root_cause_event(ROOT_CAUSE_PROPOSED, &root_cause, user.user_id)
            .with_payload(json!({ "finding_id": finding_id, "category": root_cause.category })),
    );
    tracing::info!(
        user_id = user.user_id,
        finding_id,
        root_cause_id = root_cause.id,
        "Root cause proposed"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: root_cause })))
}

/// GET /api/v1/root-causes/{id}
pub async fn get(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RootCause>>> {
    let root_cause = RootCauseRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("RootCause", id))?;
    Ok(Json(DataResponse { data: root_cause }))
}

/// POST /api/v1/root-causes/{id}/approve
pub async fn approve(
    RequireRootCauseReviewer(user): RequireRootCauseReviewer,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RootCause>>> {
    let mut tx = state.pool.begin().await?;
    let root_cause = lock_root_cause(&mut tx, id).await?;
    let next = next_status(root_cause.status()?, RootCauseEvent::Approve)?;
    let root_cause = RootCauseRepo::set_review(&mut *tx, id, next, None, user.user_id).await?;
    tx.commit().await?;

    state.event_bus.publish(
        root_cause_event(ROOT_CAUSE_APPROVED, &root_cause, user.user_id)
            .with_payload(json!({ "finding_id": root_cause.finding_id })),
    );
    tracing::info!(user_id = user.user_id, root_cause_id = id, status = %next, "Root cause approved");

    Ok(Json(DataResponse { data: root_cause }))
}

/// POST /api/v1/root-causes/{id}/reject
///
/// `reason_reject` is required.
pub async fn reject(
    RequireRootCauseReviewer(user): RequireRootCauseReviewer,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RejectRootCause>,
) -> AppResult<Json<DataResponse<RootCause>>> {
    let reason = require_reason(input.reason_reject.as_deref(), "Rejection reason")?;

    let mut tx = state.pool.begin().await?;
    let root_cause = lock_root_cause(&mut tx, id).await?;
    let next = next_status(root_cause.status()?, RootCauseEvent::Reject)?;
    let root_cause =
        RootCauseRepo::set_review(&mut *tx, id, next, Some(&reason), user.user_id).await?;
    tx.commit().await?;

    state.event_bus.publish(
        root_cause_event(ROOT_CAUSE_REJECTED, &root_cause, user.user_id).with_payload(json!({
            "finding_id": root_cause.finding_id,
            "proposed_by": root_cause.proposed_by,
            "reason": reason,
        })),
    );
    tracing::info!(user_id = user.user_id, root_cause_id = id, status = %next, "Root cause rejected");

    Ok(Json(DataResponse { data: root_cause }))
}

/// POST /api/v1/root-causes/{id}/repropose
///
/// Edit a rejected root cause and send it back for review.
pub async fn repropose(
    RequireAuditee(user): RequireAuditee,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReproposeRootCause>,
) -> AppResult<Json<DataResponse<RootCause>>> {
    validate_request(&input)?;

    let mut tx = state.pool.begin().await?;
    let root_cause = lock_root_cause(&mut tx, id).await?;
    let finding = FindingRepo::find_by_id(&mut *tx, root_cause.finding_id)
        .await?
        .ok_or_else(|| AppError::not_found("Finding", root_cause.finding_id))?;
    user.ensure_department(finding.dept_id)?;
    let next = next_status(root_cause.status()?, RootCauseEvent::Repropose)?;
    let root_cause = RootCauseRepo::repropose(&mut *tx, id, &input).await?;
    tx.commit().await?;

    state.event_bus.publish(
        root_cause_event(ROOT_CAUSE_REPROPOSED, &root_cause, user.user_id)
            .with_payload(json!({ "finding_id": root_cause.finding_id })),
    );
    tracing::info!(user_id = user.user_id, root_cause_id = id, status = %next, "Root cause re-proposed");

    Ok(Json(DataResponse { data: root_cause }))
}
