use std::time::Duration;

use aqms_db::repositories::EventRepo;
use aqms_events::event_types;
use aqms_events::{DomainEvent, EventBus, EventPersistence};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_persist_writes_event_row(pool: PgPool) {
    let event = DomainEvent::new(event_types::ROOT_CAUSE_REJECTED)
        .with_entity(event_types::entity::ROOT_CAUSE, 11)
        .with_payload(serde_json::json!({"reason": "Too generic"}));

    let id = EventPersistence::persist(&pool, &event).await.unwrap();
    assert!(id > 0);

    let rows = EventRepo::list_for_entity(&pool, "root_cause", 11).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type, "root_cause.rejected");
    assert_eq!(rows[0].payload["reason"], "Too generic");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_run_drains_bus_and_stops_when_closed(pool: PgPool) {
    let bus = EventBus::default();
    let handle = tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));

    bus.publish(DomainEvent::new(event_types::FINDING_CREATED).with_entity("finding", 5));
    drop(bus);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("persistence should stop after the bus is dropped")
        .unwrap();

    let rows = EventRepo::list_for_entity(&pool, "finding", 5).await.unwrap();
    assert_eq!(rows.len(), 1);
}
