//! Aggregate rows for director reporting.

use aqms_core::reporting::CountBy;
use aqms_core::types::DbId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A `GROUP BY` result keyed by a status id.
#[derive(Debug, Clone, FromRow)]
pub struct StatusCount {
    pub status_id: i16,
    pub count: i64,
}

/// Findings grouped by status and by whether they were ever closed.
#[derive(Debug, Clone, FromRow)]
pub struct ClosureCount {
    pub status_id: i16,
    pub was_closed: bool,
    pub count: i64,
}

/// A `GROUP BY` result keyed by a text column.
#[derive(Debug, Clone, FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Query parameters for `GET /reports/summary`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportParams {
    pub audit_id: Option<DbId>,
}

/// Response body for `GET /reports/summary`.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub audit_id: Option<DbId>,
    pub total_findings: i64,
    pub findings_by_status: Vec<CountBy>,
    pub findings_by_severity: Vec<CountBy>,
    pub actions_by_status: Vec<CountBy>,
    pub overdue_actions: i64,
    /// Percentage of findings that are closed, or archived after closing.
    pub closure_rate: f64,
}
