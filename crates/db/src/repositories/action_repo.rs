//! Repository for the `actions` and `action_root_causes` tables.

use aqms_core::action::ActionState;
use aqms_core::status::{ActionStatus, StatusId};
use aqms_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::action::{Action, ActionDetail, NewAction};

const COLUMNS: &str = "id, finding_id, title, description, assigned_to, assigned_dept_id, \
                       due_date, progress_percent, status_id, review_feedback, reviewed_by, \
                       reviewed_at, created_by, created_at, updated_at";

pub struct ActionRepo;

impl ActionRepo {
    /// Insert an `Open` action at 0% and link its root causes.
    ///
    /// Runs several statements, so callers pass a transaction's connection
    /// and commit once every planned action is written.
    pub async fn create(conn: &mut PgConnection, input: &NewAction) -> Result<Action, sqlx::Error> {
        let query = format!(
            "INSERT INTO actions
                (finding_id, title, description, assigned_to, assigned_dept_id, due_date,
                 progress_percent, status_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8)
             RETURNING {COLUMNS}"
        );
        let action = sqlx::query_as::<_, Action>(&query)
            .bind(input.finding_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.assigned_to)
            .bind(input.assigned_dept_id)
            .bind(input.due_date)
            .bind(ActionStatus::Open.id())
            .bind(input.created_by)
            .fetch_one(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT INTO action_root_causes (action_id, root_cause_id)
             SELECT $1, UNNEST($2::BIGINT[])
             ON CONFLICT ON CONSTRAINT uq_action_root_causes DO NOTHING",
        )
        .bind(action.id)
        .bind(&input.root_cause_ids)
        .execute(&mut *conn)
        .await?;

        Ok(action)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Action>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM actions WHERE id = $1");
        sqlx::query_as::<_, Action>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Load an action and lock its row until the transaction ends.
    pub async fn lock<'e, E>(executor: E, id: DbId) -> Result<Option<Action>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM actions WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Action>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Load an action with its linked root cause ids.
    pub async fn find_detail(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ActionDetail>, sqlx::Error> {
        let Some(action) = Self::find_by_id(&mut *conn, id).await? else {
            return Ok(None);
        };
        let root_cause_ids = Self::root_cause_ids(&mut *conn, id).await?;
        Ok(Some(ActionDetail {
            action,
            root_cause_ids,
        }))
    }

    /// Root causes linked to one action.
    pub async fn root_cause_ids<'e, E>(executor: E, action_id: DbId) -> Result<Vec<DbId>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT root_cause_id FROM action_root_causes WHERE action_id = $1 ORDER BY root_cause_id",
        )
        .bind(action_id)
        .fetch_all(executor)
        .await
    }

    /// All actions of a finding in creation order.
    pub async fn list_by_finding<'e, E>(
        executor: E,
        finding_id: DbId,
    ) -> Result<Vec<Action>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM actions WHERE finding_id = $1 ORDER BY id");
        sqlx::query_as::<_, Action>(&query)
            .bind(finding_id)
            .fetch_all(executor)
            .await
    }

    /// Actions assigned to a user, soonest due first.
    pub async fn list_assigned_to<'e, E>(
        executor: E,
        user_id: DbId,
        status_id: Option<StatusId>,
    ) -> Result<Vec<Action>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM actions
             WHERE assigned_to = $1 AND ($2::SMALLINT IS NULL OR status_id = $2)
             ORDER BY due_date, id"
        );
        sqlx::query_as::<_, Action>(&query)
            .bind(user_id)
            .bind(status_id)
            .fetch_all(executor)
            .await
    }

    /// Status ids of every action of a finding, for the closure check.
    pub async fn status_ids_for_finding<'e, E>(
        executor: E,
        finding_id: DbId,
    ) -> Result<Vec<StatusId>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT status_id FROM actions WHERE finding_id = $1 ORDER BY id")
            .bind(finding_id)
            .fetch_all(executor)
            .await
    }

    /// Write a new progress value. The caller clamps it first.
    pub async fn set_progress<'e, E>(
        executor: E,
        id: DbId,
        progress_percent: i32,
    ) -> Result<Action, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE actions SET progress_percent = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Action>(&query)
            .bind(id)
            .bind(progress_percent)
            .fetch_one(executor)
            .await
    }

    /// Persist the outcome of a review: status, progress (reset to 0 on
    /// rejection by the core state machine), feedback and reviewer.
    pub async fn set_review<'e, E>(
        executor: E,
        id: DbId,
        state: ActionState,
        feedback: Option<&str>,
        reviewed_by: DbId,
    ) -> Result<Action, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE actions SET
                status_id = $2,
                progress_percent = $3,
                review_feedback = $4,
                reviewed_by = $5,
                reviewed_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Action>(&query)
            .bind(id)
            .bind(state.status.id())
            .bind(state.progress_percent)
            .bind(feedback)
            .bind(reviewed_by)
            .fetch_one(executor)
            .await
    }

    /// Reopen a returned or rejected action. The last feedback is kept so
    /// the assignee can still read it.
    pub async fn set_reopened<'e, E>(executor: E, id: DbId) -> Result<Action, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("UPDATE actions SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Action>(&query)
            .bind(id)
            .bind(ActionStatus::Open.id())
            .fetch_one(executor)
            .await
    }
}
