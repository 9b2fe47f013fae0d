//! Repository for the `roles` lookup table.

use aqms_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::role::Role;

const COLUMNS: &str = "id, name, description, created_at, updated_at";

/// Read-only access to the seeded roles.
pub struct RoleRepo;

impl RoleRepo {
    /// Find a role by its name (e.g. `"lead_auditor"`).
    pub async fn find_by_name<'e, E>(executor: E, name: &str) -> Result<Option<Role>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE name = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(name)
            .fetch_optional(executor)
            .await
    }

    /// Find a role by id.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Role>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE id = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List all roles by id.
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Role>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM roles ORDER BY id");
        sqlx::query_as::<_, Role>(&query).fetch_all(executor).await
    }
}
