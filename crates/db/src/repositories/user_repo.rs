//! Repository for the `users` table.

use aqms_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::user::{CreateUser, User, UserResponse};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, full_name, password_hash, role_id, dept_id, is_active, \
                       last_login_at, created_at, updated_at";

/// Columns for [`UserResponse`], joined against `roles` as `r`.
const RESPONSE_COLUMNS: &str = "u.id, u.email, u.full_name, r.name AS role, u.dept_id, \
                                u.is_active, u.last_login_at, u.created_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row. Emails are stored lower-cased.
    pub async fn create<'e, E>(executor: E, input: &CreateUser) -> Result<User, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO users (email, full_name, password_hash, role_id, dept_id)
             VALUES (LOWER($1), $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.email.trim())
            .bind(input.full_name.trim())
            .bind(&input.password_hash)
            .bind(input.role_id)
            .bind(input.dept_id)
            .fetch_one(executor)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<User>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = LOWER($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email.trim())
            .fetch_optional(executor)
            .await
    }

    /// Public view of a single user with the role name resolved.
    pub async fn find_response_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<UserResponse>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {RESPONSE_COLUMNS} FROM users u
             JOIN roles r ON r.id = u.role_id
             WHERE u.id = $1"
        );
        sqlx::query_as::<_, UserResponse>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List users, optionally restricted to one department, by name.
    pub async fn list<'e, E>(
        executor: E,
        dept_id: Option<DbId>,
    ) -> Result<Vec<UserResponse>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {RESPONSE_COLUMNS} FROM users u
             JOIN roles r ON r.id = u.role_id
             WHERE ($1::BIGINT IS NULL OR u.dept_id = $1)
             ORDER BY u.full_name"
        );
        sqlx::query_as::<_, UserResponse>(&query)
            .bind(dept_id)
            .fetch_all(executor)
            .await
    }

    /// Whether an active user with this id exists.
    pub async fn is_active<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND is_active)")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Set `last_login_at` to now.
    pub async fn record_login<'e, E>(executor: E, id: DbId) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
