//! Repository for the `root_causes` table.

use aqms_core::status::{RootCauseStatus, StatusId};
use aqms_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::root_cause::{CreateRootCause, ReproposeRootCause, RootCause};

const COLUMNS: &str = "id, finding_id, name, category, description, status_id, reason_reject, \
                       proposed_by, reviewed_by, reviewed_at, created_at, updated_at";

pub struct RootCauseRepo;

impl RootCauseRepo {
    /// Propose a root cause for a finding. New root causes are `Pending`.
    pub async fn create<'e, E>(
        executor: E,
        finding_id: DbId,
        input: &CreateRootCause,
        proposed_by: DbId,
    ) -> Result<RootCause, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO root_causes (finding_id, name, category, description, status_id, proposed_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RootCause>(&query)
            .bind(finding_id)
            .bind(input.name.trim())
            .bind(input.category.trim())
            .bind(&input.description)
            .bind(RootCauseStatus::Pending.id())
            .bind(proposed_by)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<RootCause>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM root_causes WHERE id = $1");
        sqlx::query_as::<_, RootCause>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Load a root cause and lock its row until the transaction ends.
    pub async fn lock<'e, E>(executor: E, id: DbId) -> Result<Option<RootCause>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM root_causes WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, RootCause>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// All root causes of a finding in proposal order.
    pub async fn list_by_finding<'e, E>(
        executor: E,
        finding_id: DbId,
    ) -> Result<Vec<RootCause>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM root_causes WHERE finding_id = $1 ORDER BY id");
        sqlx::query_as::<_, RootCause>(&query)
            .bind(finding_id)
            .fetch_all(executor)
            .await
    }

    /// Approved root causes of a finding, the ones offered for assignment.
    pub async fn list_approved<'e, E>(
        executor: E,
        finding_id: DbId,
    ) -> Result<Vec<RootCause>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM root_causes
             WHERE finding_id = $1 AND status_id = $2
             ORDER BY id"
        );
        sqlx::query_as::<_, RootCause>(&query)
            .bind(finding_id)
            .bind(RootCauseStatus::Approved.id())
            .fetch_all(executor)
            .await
    }

    /// Status ids of every root cause of a finding, for the readiness gate.
    pub async fn status_ids_for_finding<'e, E>(
        executor: E,
        finding_id: DbId,
    ) -> Result<Vec<StatusId>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT status_id FROM root_causes WHERE finding_id = $1 ORDER BY id")
            .bind(finding_id)
            .fetch_all(executor)
            .await
    }

    /// Record a review decision. `reason_reject` is cleared on approval.
    pub async fn set_review<'e, E>(
        executor: E,
        id: DbId,
        status: RootCauseStatus,
        reason_reject: Option<&str>,
        reviewed_by: DbId,
    ) -> Result<RootCause, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE root_causes SET
                status_id = $2,
                reason_reject = $3,
                reviewed_by = $4,
                reviewed_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RootCause>(&query)
            .bind(id)
            .bind(status.id())
            .bind(reason_reject)
            .bind(reviewed_by)
            .fetch_one(executor)
            .await
    }

    /// Put a rejected root cause back to `Pending`, applying any edits and
    /// clearing the previous review.
    pub async fn repropose<'e, E>(
        executor: E,
        id: DbId,
        input: &ReproposeRootCause,
    ) -> Result<RootCause, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE root_causes SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                description = COALESCE($4, description),
                status_id = $5,
                reason_reject = NULL,
                reviewed_by = NULL,
                reviewed_at = NULL
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RootCause>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.category.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(RootCauseStatus::Pending.id())
            .fetch_one(executor)
            .await
    }
}
