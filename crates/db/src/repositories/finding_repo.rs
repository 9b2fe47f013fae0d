//! Repository for the `findings` table.
//!
//! Status changes are plain writes: the caller locks the row with
//! [`FindingRepo::lock`], checks the transition with `aqms_core::finding`,
//! then calls one of the `set_*` methods on the same transaction.

use aqms_core::status::FindingStatus;
use aqms_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::finding::{Finding, FindingFilter, NewFinding};

const COLUMNS: &str = "id, audit_id, title, description, severity, status_id, dept_id, \
                       created_by, deadline, witness_id, witness_reason, witnessed_at, \
                       reviewer_id, root_cause_id, source, external_auditor_name, \
                       return_reason, closed_at, created_at, updated_at";

pub struct FindingRepo;

impl FindingRepo {
    /// Insert a finding. `reviewer_id` and `root_cause_id` start out null.
    pub async fn create<'e, E>(executor: E, input: &NewFinding) -> Result<Finding, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO findings
                (audit_id, title, description, severity, status_id, dept_id, created_by,
                 deadline, witness_id, source, external_auditor_name)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Finding>(&query)
            .bind(input.audit_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.severity)
            .bind(input.status_id)
            .bind(input.dept_id)
            .bind(input.created_by)
            .bind(input.deadline)
            .bind(input.witness_id)
            .bind(&input.source)
            .bind(&input.external_auditor_name)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Finding>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM findings WHERE id = $1");
        sqlx::query_as::<_, Finding>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Load a finding and lock its row until the transaction ends.
    pub async fn lock<'e, E>(executor: E, id: DbId) -> Result<Option<Finding>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM findings WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Finding>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List findings matching `filter`. Limit and offset are expected to be
    /// clamped already.
    pub async fn list<'e, E>(executor: E, filter: &FindingFilter) -> Result<Vec<Finding>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let direction = if filter.descending { "DESC" } else { "ASC" };
        let query = format!(
            "SELECT {COLUMNS} FROM findings
             WHERE ($1::BIGINT IS NULL OR audit_id = $1)
               AND ($2::BIGINT IS NULL OR dept_id = $2)
               AND ($3::SMALLINT IS NULL OR status_id = $3)
               AND ($4::TEXT IS NULL OR severity = $4)
               AND ($5::BIGINT IS NULL OR witness_id = $5)
             ORDER BY {} {direction}, id {direction}
             LIMIT $6 OFFSET $7",
            filter.sort.sql()
        );
        sqlx::query_as::<_, Finding>(&query)
            .bind(filter.audit_id)
            .bind(filter.dept_id)
            .bind(filter.status_id)
            .bind(&filter.severity)
            .bind(filter.witness_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(executor)
            .await
    }

    /// Name a witness and move the finding to `PendingWitnessConfirmation`.
    pub async fn set_witness<'e, E>(
        executor: E,
        id: DbId,
        witness_id: DbId,
    ) -> Result<Finding, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE findings SET witness_id = $2, status_id = $3, witness_reason = NULL
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Finding>(&query)
            .bind(id)
            .bind(witness_id)
            .bind(FindingStatus::PendingWitnessConfirmation.id())
            .fetch_one(executor)
            .await
    }

    /// Record the witness's answer. `reason` is only stored on disagreement.
    pub async fn set_witness_response<'e, E>(
        executor: E,
        id: DbId,
        status: FindingStatus,
        reason: Option<&str>,
    ) -> Result<Finding, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE findings SET status_id = $2, witness_reason = $3, witnessed_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Finding>(&query)
            .bind(id)
            .bind(status.id())
            .bind(reason)
            .fetch_one(executor)
            .await
    }

    /// Mark received, recording who received it.
    pub async fn set_received<'e, E>(
        executor: E,
        id: DbId,
        reviewer_id: DbId,
    ) -> Result<Finding, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE findings SET status_id = $2, reviewer_id = COALESCE(reviewer_id, $3)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Finding>(&query)
            .bind(id)
            .bind(FindingStatus::Received.id())
            .bind(reviewer_id)
            .fetch_one(executor)
            .await
    }

    /// Send the finding back to the auditee with a reason.
    pub async fn set_returned<'e, E>(executor: E, id: DbId, reason: &str) -> Result<Finding, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE findings SET status_id = $2, return_reason = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Finding>(&query)
            .bind(id)
            .bind(FindingStatus::Return.id())
            .bind(reason)
            .fetch_one(executor)
            .await
    }

    /// Close the finding and stamp `closed_at`.
    pub async fn set_closed<'e, E>(executor: E, id: DbId) -> Result<Finding, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE findings SET status_id = $2, closed_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Finding>(&query)
            .bind(id)
            .bind(FindingStatus::Closed.id())
            .fetch_one(executor)
            .await
    }

    /// Plain status write for transitions with no side columns (archive).
    pub async fn set_status<'e, E>(
        executor: E,
        id: DbId,
        status: FindingStatus,
    ) -> Result<Finding, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("UPDATE findings SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Finding>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_one(executor)
            .await
    }
}
