//! Route definitions for the `/findings` resource.
//!
//! Root causes and corrective actions are created under their finding, so
//! their collection routes are nested here.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{action, finding, root_cause};
use crate::state::AppState;

/// Routes mounted at `/findings`.
///
/// ```text
/// GET  /                              -> list (filters, sort, order)
/// POST /                              -> create
/// GET  /{id}                          -> get
/// GET  /{id}/events                   -> events (audit trail)
/// GET  /{id}/readiness                -> readiness (action assignment gate)
///
/// POST /{id}/witness                  -> assign_witness
/// POST /{id}/witness/confirm          -> confirm_witness
/// POST /{id}/witness/disagree         -> disagree_witness
/// POST /{id}/receive                  -> receive
/// POST /{id}/return                   -> return_finding
/// POST /{id}/close                    -> close
/// POST /{id}/archive                  -> archive
///
/// GET  /{id}/root-causes              -> root_cause::list_by_finding
/// POST /{id}/root-causes              -> root_cause::propose
/// GET  /{id}/root-causes/approved     -> root_cause::list_approved
///
/// GET  /{id}/actions                  -> action::list_by_finding
/// POST /{id}/actions                  -> action::assign
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(finding::list).post(finding::create))
        .route("/{id}", get(finding::get))
        .route("/{id}/events", get(finding::events))
        .route("/{id}/readiness", get(finding::readiness))
        .route("/{id}/witness", post(finding::assign_witness))
        .route("/{id}/witness/confirm", post(finding::confirm_witness))
        .route("/{id}/witness/disagree", post(finding::disagree_witness))
        .route("/{id}/receive", post(finding::receive))
        .route("/{id}/return", post(finding::return_finding))
        .route("/{id}/close", post(finding::close))
        .route("/{id}/archive", post(finding::archive))
        .route(
            "/{id}/root-causes",
            get(root_cause::list_by_finding).post(root_cause::propose),
        )
        .route("/{id}/root-causes/approved", get(root_cause::list_approved))
        .route(
            "/{id}/actions",
            get(action::list_by_finding).post(action::assign),
        )
}
