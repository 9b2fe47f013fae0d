//! Handlers for the `/findings` resource: recording, witness confirmation,
//! receipt, return, closure and archival.

use aqms_core::action::all_actions_approved;
use aqms_core::audit::accepts_findings;
use aqms_core::error::CoreError;
use aqms_core::finding::{
    accepts_action_changes, ensure_can_assign_witness, ensure_witness, initial_status, next_status, validate_deadline,
    validate_source, FindingEvent, FindingSource, Severity,
};
use aqms_core::root_cause::{assignment_readiness, AssignmentReadiness};
use aqms_core::status::{ActionStatus, FindingStatus, RootCauseStatus};
use aqms_core::types::DbId;
use aqms_core::validation::{require_reason, validate_request};
use aqms_db::models::event::Event;
use aqms_db::models::finding::{
    AssignWitnessRequest, CreateFinding, Finding, FindingFilter, FindingListParams, FindingSort,
    NewFinding, ReasonRequest,
};
use aqms_db::repositories::{ActionRepo, AuditRepo, EventRepo, FindingRepo, RootCauseRepo, UserRepo};
use aqms_db::{clamp_limit, clamp_offset, DbPool};
use aqms_events::event_types::{
    entity, FINDING_ARCHIVED, FINDING_CLOSED, FINDING_CREATED, FINDING_RECEIVED, FINDING_RETURNED,
    FINDING_WITNESS_ASSIGNED, FINDING_WITNESS_CONFIRMED, FINDING_WITNESS_DISAGREED,
};
use aqms_events::DomainEvent;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use sqlx::PgConnection;

use super::{optional_text, today};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireAuditee, RequireAuth, RequireFindingAuthor, RequireLeadAuditor};
use crate::query::parse_optional;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response for `GET /findings/{id}/readiness`.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub finding_id: DbId,
    pub readiness: AssignmentReadiness,
    pub ready: bool,
    pub root_cause_count: usize,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load a finding or return 404.
pub(crate) async fn find_finding(pool: &DbPool, id: DbId) -> AppResult<Finding> {
    FindingRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Finding", id))
}

/// Lock a finding inside a transaction or return 404.
pub(crate) async fn lock_finding(conn: &mut PgConnection, id: DbId) -> AppResult<Finding> {
    FindingRepo::lock(conn, id)
        .await?
        .ok_or_else(|| AppError::not_found("Finding", id))
}

/// Lock the finding that owns an action and refuse if it is closed or
/// archived. Callers lock the action (and its evidence) first.
pub(crate) async fn lock_finding_for_action(
    conn: &mut PgConnection,
    finding_id: DbId,
) -> AppResult<Finding> {
    let finding = lock_finding(conn, finding_id).await?;
    accepts_action_changes(finding.status()?)?;
    Ok(finding)
}

async fn action_statuses(conn: &mut PgConnection, finding_id: DbId) -> AppResult<Vec<ActionStatus>> {
    let ids = ActionRepo::status_ids_for_finding(conn, finding_id).await?;
    let statuses = ids
        .into_iter()
        .map(ActionStatus::try_from_id)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(statuses)
}

/// Close a received finding whose actions are all approved and whose root
/// causes are all approved.
///
/// Returns the closed finding, or `None` when the finding is not ready.
/// A root cause proposed after assignment keeps the finding open until it
/// is reviewed.
pub(crate) async fn close_if_complete(
    conn: &mut PgConnection,
    finding: &Finding,
) -> AppResult<Option<Finding>> {
    if finding.status()? != FindingStatus::Received {
        return Ok(None);
    }
    let root_causes = RootCauseRepo::status_ids_for_finding(&mut *conn, finding.id)
        .await?
        .into_iter()
        .map(RootCauseStatus::try_from_id)
        .collect::<Result<Vec<_>, _>>()?;
    if !assignment_readiness(&root_causes).is_ready() {
        return Ok(None);
    }
    let statuses = action_statuses(conn, finding.id).await?;
    if !all_actions_approved(&statuses) {
        return Ok(None);
    }
    Ok(Some(FindingRepo::set_closed(conn, finding.id).await?))
}

fn finding_event(event_type: &str, finding_id: DbId, actor: DbId) -> DomainEvent {
    DomainEvent::new(event_type)
        .with_entity(entity::FINDING, finding_id)
        .with_actor(actor)
}

async fn ensure_active_user(pool: &DbPool, user_id: DbId, what: &str) -> AppResult<()> {
    if UserRepo::is_active(pool, user_id).await? {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Validation(format!(
            "{what} {user_id} does not exist or is inactive"
        ))))
    }
}

// ---------------------------------------------------------------------------
// Recording and listing
// ---------------------------------------------------------------------------

/// POST /api/v1/findings
///
/// Record a finding against a running audit. With a witness named the
/// finding waits for witness confirmation, otherwise it starts `Open`.
pub async fn create(
    RequireFindingAuthor(user): RequireFindingAuthor,
    State(state): State<AppState>,
    Json(input): Json<CreateFinding>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    let severity: Severity = input.severity.parse()?;
    let source: FindingSource = parse_optional(input.source.as_deref())?.unwrap_or(FindingSource::Internal);
    let external_auditor_name = validate_source(source, input.external_auditor_name.as_deref())?;
    validate_deadline(input.deadline, today())?;

    let audit = AuditRepo::find_by_id(&state.pool, input.audit_id)
        .await?
        .ok_or_else(|| AppError::not_found("Audit", input.audit_id))?;
    let audit_status = audit.status()?;
    if !accepts_findings(audit_status) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Audit {} is {audit_status} and no longer accepts findings",
            audit.id
        ))));
    }

    if let Some(witness_id) = input.witness_id {
        if witness_id == user.user_id {
            return Err(AppError::Core(CoreError::Validation(
                "The finding author cannot witness their own finding".into(),
            )));
        }
        ensure_active_user(&state.pool, witness_id, "Witness").await?;
    }

    let status = initial_status(input.witness_id.is_some());
    let finding = FindingRepo::create(
        &state.pool,
        &NewFinding {
            audit_id: input.audit_id,
            title: input.title.trim().to_string(),
            description: optional_text(input.description),
            severity: severity.as_str().to_string(),
            status_id: status.id(),
            dept_id: input.dept_id,
            created_by: user.user_id,
            deadline: input.deadline,
            witness_id: input.witness_id,
            source: source.as_str().to_string(),
            external_auditor_name,
        },
    )
    .await?;

    state.event_bus.publish(
        finding_event(FINDING_CREATED, finding.id, user.user_id).with_payload(json!({
            "audit_id": finding.audit_id,
            "dept_id": finding.dept_id,
            "severity": severity,
            "status": status,
            "witness_id": finding.witness_id,
        })),
    );
    tracing::info!(
        user_id = user.user_id,
        finding_id = finding.id,
        severity = %severity,
        status = %status,
        "Finding recorded"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: finding })))
}

/// GET /api/v1/findings?audit_id=&dept_id=&status=&severity=&witness_id=&sort=&order=&limit=&offset=
///
/// Newest first by default; `sort=deadline` and `sort=severity` default to
/// ascending (soonest deadline, most severe first).
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<FindingListParams>,
) -> AppResult<Json<DataResponse<Vec<Finding>>>> {
    let status: Option<FindingStatus> = parse_optional(params.status.as_deref())?;
    let severity: Option<Severity> = parse_optional(params.severity.as_deref())?;

    let sort = match params.sort.as_deref() {
        None => FindingSort::default(),
        Some(value) => FindingSort::parse(value).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid sort '{value}'. Must be one of: created_at, deadline, severity"
            ))
        })?,
    };
    let descending = match params.order.as_deref() {
        None => sort == FindingSort::CreatedAt,
        Some("asc") => false,
        Some("desc") => true,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Invalid order '{other}'. Must be asc or desc"
            )))
        }
    };

    let filter = FindingFilter {
        audit_id: params.audit_id,
        dept_id: params.dept_id,
        status_id: status.map(FindingStatus::id),
        severity: severity.map(|s| s.as_str().to_string()),
        witness_id: params.witness_id,
        sort,
        descending,
        limit: clamp_limit(params.limit),
        offset: clamp_offset(params.offset),
    };
    let findings = FindingRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: findings }))
}

/// GET /api/v1/findings/{id}
pub async fn get(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Finding>>> {
    let finding = find_finding(&state.pool, id).await?;
    Ok(Json(DataResponse { data: finding }))
}

/// GET /api/v1/findings/{id}/events
///
/// Workflow history of the finding, oldest first.
pub async fn events(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    find_finding(&state.pool, id).await?;
    let events = EventRepo::list_for_entity(&state.pool, entity::FINDING, id).await?;
    Ok(Json(DataResponse { data: events }))
}

/// GET /api/v1/findings/{id}/readiness
///
/// Whether corrective actions can be assigned yet.
pub async fn readiness(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReadinessResponse>>> {
    find_finding(&state.pool, id).await?;
    let statuses = RootCauseRepo::status_ids_for_finding(&state.pool, id)
        .await?
        .into_iter()
        .map(RootCauseStatus::try_from_id)
        .collect::<Result<Vec<_>, _>>()?;
    let readiness = assignment_readiness(&statuses);

    Ok(Json(DataResponse {
        data: ReadinessResponse {
            finding_id: id,
            readiness,
            ready: readiness.is_ready(),
            root_cause_count: statuses.len(),
        },
    }))
}

// ---------------------------------------------------------------------------
// Witness confirmation
// ---------------------------------------------------------------------------

/// POST /api/v1/findings/{id}/witness
///
/// Name a witness for an `Open` finding that has none.
pub async fn assign_witness(
    RequireFindingAuthor(user): RequireFindingAuthor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AssignWitnessRequest>,
) -> AppResult<Json<DataResponse<Finding>>> {
    ensure_active_user(&state.pool, input.witness_id, "Witness").await?;

    let mut tx = state.pool.begin().await?;
    let finding = lock_finding(&mut tx, id).await?;
    ensure_can_assign_witness(
        finding.status()?,
        finding.witness_id,
        finding.created_by,
        input.witness_id,
    )?;
    let finding = FindingRepo::set_witness(&mut *tx, id, input.witness_id).await?;
    tx.commit().await?;

    state.event_bus.publish(
        finding_event(FINDING_WITNESS_ASSIGNED, id, user.user_id)
            .with_payload(json!({ "witness_id": input.witness_id })),
    );
    tracing::info!(user_id = user.user_id, finding_id = id, witness_id = input.witness_id, "Witness assigned");

    Ok(Json(DataResponse { data: finding }))
}

/// POST /api/v1/findings/{id}/witness/confirm
///
/// Only the named witness may respond, and only once.
pub async fn confirm_witness(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Finding>>> {
    let mut tx = state.pool.begin().await?;
    let finding = lock_finding(&mut tx, id).await?;
    let current = finding.status()?;
    ensure_witness(current, finding.witness_id, user.user_id)?;
    let next = next_status(current, FindingEvent::WitnessConfirm)?;
    let finding = FindingRepo::set_witness_response(&mut *tx, id, next, None).await?;
    tx.commit().await?;

    state.event_bus.publish(
        finding_event(FINDING_WITNESS_CONFIRMED, id, user.user_id)
            .with_payload(json!({ "auditor_id": finding.created_by })),
    );
    tracing::info!(user_id = user.user_id, finding_id = id, status = %next, "Witness confirmed finding");

    Ok(Json(DataResponse { data: finding }))
}

/// POST /api/v1/findings/{id}/witness/disagree
///
/// The reason is stored on the finding and published to the auditor.
pub async fn disagree_witness(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReasonRequest>,
) -> AppResult<Json<DataResponse<Finding>>> {
    let reason = require_reason(input.reason.as_deref(), "Disagreement reason")?;

    let mut tx = state.pool.begin().await?;
    let finding = lock_finding(&mut tx, id).await?;
    let current = finding.status()?;
    ensure_witness(current, finding.witness_id, user.user_id)?;
    let next = next_status(current, FindingEvent::WitnessDisagree)?;
    let finding = FindingRepo::set_witness_response(&mut *tx, id, next, Some(&reason)).await?;
    tx.commit().await?;

    state.event_bus.publish(
        finding_event(FINDING_WITNESS_DISAGREED, id, user.user_id)
            .with_payload(json!({ "auditor_id": finding.created_by, "reason": reason })),
    );
    tracing::info!(user_id = user.user_id, finding_id = id, status = %next, "Witness disagreed with finding");

    Ok(Json(DataResponse { data: finding }))
}

// ---------------------------------------------------------------------------
// Auditee and lead auditor transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/findings/{id}/receive
///
/// Idempotent: receiving an already received finding succeeds unchanged.
pub async fn receive(
    RequireAuditee(user): RequireAuditee,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Finding>>> {
    let mut tx = state.pool.begin().await?;
    let finding = lock_finding(&mut tx, id).await?;
    user.ensure_department(finding.dept_id)?;
    let current = finding.status()?;
    let next = next_status(current, FindingEvent::MarkReceived)?;
    let finding = FindingRepo::set_received(&mut *tx, id, user.user_id).await?;
    tx.commit().await?;

    if current != next {
        state
            .event_bus
            .publish(finding_event(FINDING_RECEIVED, id, user.user_id));
        tracing::info!(user_id = user.user_id, finding_id = id, status = %next, "Finding received");
    }

    Ok(Json(DataResponse { data: finding }))
}

/// POST /api/v1/findings/{id}/return
pub async fn return_finding(
    RequireLeadAuditor(user): RequireLeadAuditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ReasonRequest>,
) -> AppResult<Json<DataResponse<Finding>>> {
    let reason = require_reason(input.reason.as_deref(), "Return reason")?;

    let mut tx = state.pool.begin().await?;
    let finding = lock_finding(&mut tx, id).await?;
    let next = next_status(finding.status()?, FindingEvent::Return)?;
    let finding = FindingRepo::set_returned(&mut *tx, id, &reason).await?;
    tx.commit().await?;

    state.event_bus.publish(
        finding_event(FINDING_RETURNED, id, user.user_id).with_payload(json!({ "reason": reason })),
    );
    tracing::info!(user_id = user.user_id, finding_id = id, status = %next, "Finding returned to auditee");

    Ok(Json(DataResponse { data: finding }))
}

/// POST /api/v1/findings/{id}/close
///
/// Requires at least one action, every action approved and no root cause
/// pending or rejected.
pub async fn close(
    RequireLeadAuditor(user): RequireLeadAuditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Finding>>> {
    let mut tx = state.pool.begin().await?;
    let finding = lock_finding(&mut tx, id).await?;
    next_status(finding.status()?, FindingEvent::Close)?;
    let closed = close_if_complete(&mut tx, &finding).await?.ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Finding cannot close until every root cause and every action is approved".into(),
        ))
    })?;
    tx.commit().await?;

    state
        .event_bus
        .publish(finding_event(FINDING_CLOSED, id, user.user_id));
    tracing::info!(user_id = user.user_id, finding_id = id, "Finding closed");

    Ok(Json(DataResponse { data: closed }))
}

/// POST /api/v1/findings/{id}/archive
pub async fn archive(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Finding>>> {
    let mut tx = state.pool.begin().await?;
    let finding = lock_finding(&mut tx, id).await?;
    let next = next_status(finding.status()?, FindingEvent::Archive)?;
    let finding = FindingRepo::set_status(&mut *tx, id, next).await?;
    tx.commit().await?;

    state
        .event_bus
        .publish(finding_event(FINDING_ARCHIVED, id, user.user_id));
    tracing::info!(user_id = user.user_id, finding_id = id, "Finding archived");

    Ok(Json(DataResponse { data: finding }))
}
