//! Route definitions for corrective actions and their two-level review.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{action, action_review as review};
use crate::state::AppState;

/// Routes mounted at `/actions`.
///
/// ```text
/// GET  /mine             -> list_mine (?status=)
/// GET  /{id}             -> get
/// PUT  /{id}/progress    -> update_progress (assignee)
/// POST /{id}/resubmit    -> resubmit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(action::list_mine))
        .route("/{id}", get(action::get))
        .route("/{id}/progress", put(action::update_progress))
        .route("/{id}/resubmit", post(action::resubmit))
}

/// Routes mounted at `/action-reviews`.
///
/// ```text
/// POST /{id}/approve                -> approve (auditee owner)
/// POST /{id}/reject                 -> reject
/// POST /{id}/returned               -> return_action
/// POST /{id}/approve/higher-level   -> approve_higher (lead auditor)
/// POST /{id}/reject/higher-level    -> reject_higher
/// POST /{id}/returned/higher-level  -> return_higher
/// ```
pub fn review_router() -> Router<AppState> {
    Router::new()
        .route("/{id}/approve", post(review::approve))
        .route("/{id}/reject", post(review::reject))
        .route("/{id}/returned", post(review::return_action))
        .route("/{id}/approve/higher-level", post(review::approve_higher))
        .route("/{id}/reject/higher-level", post(review::reject_higher))
        .route("/{id}/returned/higher-level", post(review::return_higher))
}
