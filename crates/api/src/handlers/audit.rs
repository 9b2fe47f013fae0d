//! Handlers for the `/audits` resource (audit plans).

use aqms_core::audit::{ensure_transition, validate_window};
use aqms_core::status::AuditStatus;
use aqms_core::types::DbId;
use aqms_core::validation::validate_request;
use aqms_db::models::audit::{Audit, AuditListParams, CreateAudit, UpdateAuditStatus};
use aqms_db::repositories::AuditRepo;
use aqms_db::{clamp_limit, clamp_offset};
use aqms_events::event_types::{entity, AUDIT_CREATED, AUDIT_STATUS_CHANGED};
use aqms_events::DomainEvent;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequireLeadAuditor};
use crate::query::parse_optional;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/audits
pub async fn create(
    RequireLeadAuditor(user): RequireLeadAuditor,
    State(state): State<AppState>,
    Json(input): Json<CreateAudit>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    validate_window(input.start_date, input.end_date)?;

    let audit = AuditRepo::create(&state.pool, &input, user.user_id).await?;

    state.event_bus.publish(
        DomainEvent::new(AUDIT_CREATED)
            .with_entity(entity::AUDIT, audit.id)
            .with_actor(user.user_id)
            .with_payload(json!({ "dept_id": audit.dept_id, "title": audit.title })),
    );
    tracing::info!(user_id = user.user_id, audit_id = audit.id, "Audit planned");

    Ok((StatusCode::CREATED, Json(DataResponse { data: audit })))
}

/// GET /api/v1/audits?dept_id=&status=&limit=&offset=
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<AuditListParams>,
) -> AppResult<Json<DataResponse<Vec<Audit>>>> {
    let status: Option<AuditStatus> = parse_optional(params.status.as_deref())?;
    let audits = AuditRepo::list(
        &state.pool,
        params.dept_id,
        status.map(AuditStatus::id),
        clamp_limit(params.limit),
        clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: audits }))
}

/// GET /api/v1/audits/{id}
pub async fn get(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Audit>>> {
    let audit = AuditRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Audit", id))?;
    Ok(Json(DataResponse { data: audit }))
}

/// PUT /api/v1/audits/{id}/status
pub async fn update_status(
    RequireLeadAuditor(user): RequireLeadAuditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAuditStatus>,
) -> AppResult<Json<DataResponse<Audit>>> {
    let target: AuditStatus = input.status.parse()?;

    let mut tx = state.pool.begin().await?;
    let audit = AuditRepo::lock(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Audit", id))?;
    let current = audit.status()?;
    ensure_transition(current, target)?;
    let audit = AuditRepo::update_status(&mut *tx, id, target).await?;
    tx.commit().await?;

    state.event_bus.publish(
        DomainEvent::new(AUDIT_STATUS_CHANGED)
            .with_entity(entity::AUDIT, id)
            .with_actor(user.user_id)
            .with_payload(json!({ "from": current, "to": target })),
    );
    tracing::info!(user_id = user.user_id, audit_id = id, status = %target, "Audit status changed");

    Ok(Json(DataResponse { data: audit }))
}
