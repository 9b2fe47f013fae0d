//! Route definitions for the `/audits` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

/// Routes mounted at `/audits`.
///
/// ```text
/// GET  /              -> list (?status=&dept_id=)
/// POST /              -> create (lead auditor)
/// GET  /{id}          -> get
/// PUT  /{id}/status   -> update_status (lead auditor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(audit::list).post(audit::create))
        .route("/{id}", get(audit::get))
        .route("/{id}/status", put(audit::update_status))
}
