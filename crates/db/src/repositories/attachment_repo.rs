//! Repository for the `attachments` table.

use aqms_core::attachment::ParentType;
use aqms_core::status::{AttachmentStatus, StatusId};
use aqms_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::attachment::{Attachment, NewAttachment};

const COLUMNS: &str = "id, parent_type, parent_id, file_name, file_path, file_size, \
                       content_type, status_id, uploaded_by, uploaded_at, created_at, updated_at";

pub struct AttachmentRepo;

impl AttachmentRepo {
    /// Record an uploaded file. New attachments are `Open`.
    pub async fn create<'e, E>(executor: E, input: &NewAttachment) -> Result<Attachment, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO attachments
                (parent_type, parent_id, file_name, file_path, file_size, content_type,
                 status_id, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(&input.parent_type)
            .bind(input.parent_id)
            .bind(&input.file_name)
            .bind(&input.file_path)
            .bind(input.file_size)
            .bind(&input.content_type)
            .bind(AttachmentStatus::Open.id())
            .bind(input.uploaded_by)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Attachment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM attachments WHERE id = $1");
        sqlx::query_as::<_, Attachment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Load an attachment and lock its row until the transaction ends.
    pub async fn lock<'e, E>(executor: E, id: DbId) -> Result<Option<Attachment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM attachments WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Attachment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Attachments of one parent, oldest first. Inactive rows are hidden
    /// unless `include_inactive` is set.
    pub async fn list_by_parent<'e, E>(
        executor: E,
        parent_type: ParentType,
        parent_id: DbId,
        include_inactive: bool,
    ) -> Result<Vec<Attachment>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM attachments
             WHERE parent_type = $1 AND parent_id = $2
               AND ($3 OR status_id <> $4)
             ORDER BY uploaded_at, id"
        );
        sqlx::query_as::<_, Attachment>(&query)
            .bind(parent_type.as_str())
            .bind(parent_id)
            .bind(include_inactive)
            .bind(AttachmentStatus::Inactive.id())
            .fetch_all(executor)
            .await
    }

    /// `(id, status_id)` of every attachment of a parent, row-locked, for
    /// choosing which ones a parent approval cascades to.
    pub async fn lock_statuses_for_parent<'e, E>(
        executor: E,
        parent_type: ParentType,
        parent_id: DbId,
    ) -> Result<Vec<(DbId, StatusId)>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as(
            "SELECT id, status_id FROM attachments
             WHERE parent_type = $1 AND parent_id = $2
             ORDER BY id
             FOR UPDATE",
        )
        .bind(parent_type.as_str())
        .bind(parent_id)
        .fetch_all(executor)
        .await
    }

    pub async fn set_status<'e, E>(
        executor: E,
        id: DbId,
        status: AttachmentStatus,
    ) -> Result<Attachment, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("UPDATE attachments SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Attachment>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_one(executor)
            .await
    }

    /// Approve the given attachments in one statement. Rows that are no
    /// longer `Open` are skipped. Returns the number approved.
    pub async fn approve_many<'e, E>(executor: E, ids: &[DbId]) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE attachments SET status_id = $2
             WHERE id = ANY($1) AND status_id = $3",
        )
        .bind(ids)
        .bind(AttachmentStatus::Approved.id())
        .bind(AttachmentStatus::Open.id())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
