//! Repository for the `departments` table.

use aqms_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::department::{CreateDepartment, Department};

const COLUMNS: &str = "id, name, code, created_at, updated_at";

pub struct DepartmentRepo;

impl DepartmentRepo {
    /// Insert a department. Codes are stored upper-cased.
    pub async fn create<'e, E>(
        executor: E,
        input: &CreateDepartment,
    ) -> Result<Department, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO departments (name, code)
             VALUES ($1, UPPER($2))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(input.name.trim())
            .bind(input.code.trim())
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Department>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM departments WHERE id = $1");
        sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List departments alphabetically.
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Department>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM departments ORDER BY name");
        sqlx::query_as::<_, Department>(&query)
            .fetch_all(executor)
            .await
    }
}
