use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::EvidenceStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference-counted and everything else sits
/// behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: aqms_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Publishes workflow events; persisted by a background task.
    pub event_bus: Arc<aqms_events::EventBus>,
    /// On-disk evidence files.
    pub storage: Arc<EvidenceStore>,
}

impl AppState {
    pub fn new(pool: aqms_db::DbPool, config: ServerConfig, event_bus: Arc<aqms_events::EventBus>) -> Self {
        let storage = Arc::new(EvidenceStore::new(config.storage_root.clone()));
        Self {
            pool,
            config: Arc::new(config),
            event_bus,
            storage,
        }
    }
}
