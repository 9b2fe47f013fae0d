//! Director summary report.

use aqms_core::finding::Severity;
use aqms_core::reporting::{closure_rate, fill_counts, is_resolved};
use aqms_core::status::{ActionStatus, FindingStatus};
use aqms_db::models::report::{ReportParams, StatusCount, SummaryReport};
use aqms_db::repositories::{AuditRepo, ReportRepo};
use axum::extract::{Query, State};
use axum::Json;

use super::today;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireReportReader;
use crate::response::DataResponse;
use crate::state::AppState;

/// Map raw `status_id` rows onto a status enum, failing on ids the enum
/// does not know.
fn typed_rows<S>(
    rows: &[StatusCount],
    parse: impl Fn(i16) -> Result<S, aqms_core::error::CoreError>,
) -> Result<Vec<(S, i64)>, AppError> {
    rows.iter()
        .map(|row| Ok((parse(row.status_id)?, row.count)))
        .collect()
}

/// GET /api/v1/reports/summary?audit_id=
///
/// Finding and action breakdowns, overdue actions and the closure rate,
/// for one audit or across all of them.
pub async fn summary(
    RequireReportReader(user): RequireReportReader,
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> AppResult<Json<DataResponse<SummaryReport>>> {
    let audit_id = params.audit_id;
    if let Some(id) = audit_id {
        AuditRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Audit", id))?;
    }

    let total_findings = ReportRepo::count_findings(&state.pool, audit_id).await?;
    let finding_rows = typed_rows(
        &ReportRepo::findings_by_status(&state.pool, audit_id).await?,
        FindingStatus::try_from_id,
    )?;
    let action_rows = typed_rows(
        &ReportRepo::actions_by_status(&state.pool, audit_id).await?,
        ActionStatus::try_from_id,
    )?;
    let severity_rows = ReportRepo::findings_by_severity(&state.pool, audit_id)
        .await?
        .into_iter()
        .map(|row| Ok((row.label.parse::<Severity>()?, row.count)))
        .collect::<Result<Vec<_>, AppError>>()?;
    let overdue_actions = ReportRepo::count_overdue_actions(&state.pool, audit_id, today()).await?;

    let mut resolved = 0;
    for row in ReportRepo::findings_by_closure(&state.pool, audit_id).await? {
        if is_resolved(FindingStatus::try_from_id(row.status_id)?, row.was_closed) {
            resolved += row.count;
        }
    }

    let report = SummaryReport {
        audit_id,
        total_findings,
        findings_by_status: fill_counts(FindingStatus::ALL, &finding_rows, |s| s.to_string()),
        findings_by_severity: fill_counts(Severity::ALL, &severity_rows, |s| s.to_string()),
        actions_by_status: fill_counts(ActionStatus::ALL, &action_rows, |s| s.to_string()),
        overdue_actions,
        closure_rate: closure_rate(resolved, total_findings),
    };

    tracing::debug!(user_id = user.user_id, ?audit_id, total_findings, "Summary report generated");

    Ok(Json(DataResponse { data: report }))
}
