//! Aggregate queries behind the director summary report.
//!
//! Every query takes an optional `audit_id`; `None` reports across all audits.

use aqms_core::status::ActionStatus;
use aqms_core::types::{Date, DbId};
use sqlx::PgExecutor;

use crate::models::report::{ClosureCount, LabelCount, StatusCount};

pub struct ReportRepo;

impl ReportRepo {
    pub async fn count_findings<'e, E>(executor: E, audit_id: Option<DbId>) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM findings WHERE ($1::BIGINT IS NULL OR audit_id = $1)",
        )
        .bind(audit_id)
        .fetch_one(executor)
        .await
    }

    pub async fn findings_by_status<'e, E>(
        executor: E,
        audit_id: Option<DbId>,
    ) -> Result<Vec<StatusCount>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status_id, COUNT(*) AS count FROM findings
             WHERE ($1::BIGINT IS NULL OR audit_id = $1)
             GROUP BY status_id",
        )
        .bind(audit_id)
        .fetch_all(executor)
        .await
    }

    /// Findings by status, split on whether `closed_at` was ever stamped.
    pub async fn findings_by_closure<'e, E>(
        executor: E,
        audit_id: Option<DbId>,
    ) -> Result<Vec<ClosureCount>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ClosureCount>(
            "SELECT status_id, closed_at IS NOT NULL AS was_closed, COUNT(*) AS count
             FROM findings
             WHERE ($1::BIGINT IS NULL OR audit_id = $1)
             GROUP BY status_id, was_closed",
        )
        .bind(audit_id)
        .fetch_all(executor)
        .await
    }

    pub async fn findings_by_severity<'e, E>(
        executor: E,
        audit_id: Option<DbId>,
    ) -> Result<Vec<LabelCount>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, LabelCount>(
            "SELECT severity AS label, COUNT(*) AS count FROM findings
             WHERE ($1::BIGINT IS NULL OR audit_id = $1)
             GROUP BY severity",
        )
        .bind(audit_id)
        .fetch_all(executor)
        .await
    }

    pub async fn actions_by_status<'e, E>(
        executor: E,
        audit_id: Option<DbId>,
    ) -> Result<Vec<StatusCount>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, StatusCount>(
            "SELECT a.status_id, COUNT(*) AS count FROM actions a
             JOIN findings f ON f.id = a.finding_id
             WHERE ($1::BIGINT IS NULL OR f.audit_id = $1)
             GROUP BY a.status_id",
        )
        .bind(audit_id)
        .fetch_all(executor)
        .await
    }

    /// Actions whose due date is before `today` and that are not approved.
    pub async fn count_overdue_actions<'e, E>(
        executor: E,
        audit_id: Option<DbId>,
        today: Date,
    ) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM actions a
             JOIN findings f ON f.id = a.finding_id
             WHERE ($1::BIGINT IS NULL OR f.audit_id = $1)
               AND a.due_date < $2
               AND a.status_id <> $3",
        )
        .bind(audit_id)
        .bind(today)
        .bind(ActionStatus::Approved.id())
        .fetch_one(executor)
        .await
    }
}
