//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`DomainEvent`]s, shared
//! via `Arc<EventBus>` in the API state.

use aqms_core::types::{DbId, Timestamp};
use aqms_db::models::event::NewEvent;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Something that happened to a workflow entity.
///
/// Built with [`DomainEvent::new`] and the `with_*` builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, see [`crate::event_types`].
    pub event_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    /// The user whose request caused the event.
    pub actor_user_id: Option<DbId>,
    /// Event-specific data such as the new status or a rejection reason.
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl DomainEvent {
    /// Create an event with only the `event_type` set.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            entity_type: None,
            entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Row to insert into the `events` table.
    pub fn to_new_event(&self) -> NewEvent {
        NewEvent {
            event_type: self.event_type.clone(),
            entity_type: self.entity_type.clone(),
            entity_id: self.entity_id,
            actor_user_id: self.actor_user_id,
            payload: self.payload.clone(),
            occurred_at: self.occurred_at,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use aqms_events::bus::{DomainEvent, EventBus};
///
/// let bus = EventBus::default();
/// let _rx = bus.subscribe();
///
/// bus.publish(DomainEvent::new("finding.created"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. With no subscribers the
    /// event is dropped.
    pub fn publish(&self, event: DomainEvent) {
        tracing::debug!(event_type = %event.event_type, entity_id = ?event.entity_id, "Publishing event");
        // A send error only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
