//! Repository for the `audits` table.

use aqms_core::status::{AuditStatus, StatusId};
use aqms_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::audit::{Audit, CreateAudit};

const COLUMNS: &str = "id, title, scope, dept_id, lead_auditor_id, start_date, end_date, \
                       status_id, created_by, created_at, updated_at";

pub struct AuditRepo;

impl AuditRepo {
    /// Insert a new audit plan in `Planned` status.
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateAudit,
        created_by: DbId,
    ) -> Result<Audit, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO audits
                (title, scope, dept_id, lead_auditor_id, start_date, end_date, status_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Audit>(&query)
            .bind(input.title.trim())
            .bind(&input.scope)
            .bind(input.dept_id)
            .bind(input.lead_auditor_id)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(AuditStatus::Planned.id())
            .bind(created_by)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Audit>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM audits WHERE id = $1");
        sqlx::query_as::<_, Audit>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Load an audit and lock its row until the transaction ends.
    pub async fn lock<'e, E>(executor: E, id: DbId) -> Result<Option<Audit>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM audits WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Audit>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List audits, newest start date first.
    pub async fn list<'e, E>(
        executor: E,
        dept_id: Option<DbId>,
        status_id: Option<StatusId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Audit>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM audits
             WHERE ($1::BIGINT IS NULL OR dept_id = $1)
               AND ($2::SMALLINT IS NULL OR status_id = $2)
             ORDER BY start_date DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Audit>(&query)
            .bind(dept_id)
            .bind(status_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    pub async fn update_status<'e, E>(
        executor: E,
        id: DbId,
        status: AuditStatus,
    ) -> Result<Audit, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("UPDATE audits SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Audit>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_one(executor)
            .await
    }
}
