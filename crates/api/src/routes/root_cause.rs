use axum::routing::{get, post};
use axum::Router;

use crate::handlers::root_cause;
use crate::state::AppState;

/// Routes mounted at `/root-causes`.
///
/// ```text
/// GET  /{id}            -> get
/// POST /{id}/approve    -> approve (auditor, lead auditor)
/// POST /{id}/reject     -> reject (auditor, lead auditor)
/// POST /{id}/repropose  -> repropose (auditee owner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(root_cause::get))
        .route("/{id}/approve", post(root_cause::approve))
        .route("/{id}/reject", post(root_cause::reject))
        .route("/{id}/repropose", post(root_cause::repropose))
}
