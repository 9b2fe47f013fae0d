//! Repository for the `events` table.

use aqms_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::event::{Event, NewEvent};

const COLUMNS: &str =
    "id, event_type, entity_type, entity_id, actor_user_id, payload, occurred_at, created_at";

/// Append-only access to the domain event log.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event row, returning the generated ID.
    pub async fn insert<'e, E>(executor: E, event: &NewEvent) -> Result<DbId, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "INSERT INTO events \
                (event_type, entity_type, entity_id, actor_user_id, payload, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(&event.event_type)
        .bind(&event.entity_type)
        .bind(event.entity_id)
        .bind(event.actor_user_id)
        .bind(&event.payload)
        .bind(event.occurred_at)
        .fetch_one(executor)
        .await
    }

    /// Event history of one entity, oldest first.
    pub async fn list_for_entity<'e, E>(
        executor: E,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<Event>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE entity_type = $1 AND entity_id = $2
             ORDER BY occurred_at, id"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(executor)
            .await
    }
}
