pub mod action;
pub mod admin;
pub mod attachment;
pub mod audit;
pub mod auth;
pub mod department;
pub mod finding;
pub mod health;
pub mod report;
pub mod root_cause;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                  login (public)
/// /auth/me                                     current user
///
/// /admin/users                                 list, create (admin only)
/// /departments                                 list, create
///
/// /audits                                      list, create
/// /audits/{id}                                 get
/// /audits/{id}/status                          update status (PUT)
///
/// /findings                                    list, create
/// /findings/{id}                               get
/// /findings/{id}/events                        audit trail
/// /findings/{id}/readiness                     action assignment gate
/// /findings/{id}/witness[/confirm|/disagree]   witness workflow
/// /findings/{id}/receive|return|close|archive  lifecycle commands
/// /findings/{id}/root-causes                   list, propose
/// /findings/{id}/root-causes/approved          approved only
/// /findings/{id}/actions                       list, assign
///
/// /root-causes/{id}                            get
/// /root-causes/{id}/approve|reject|repropose   review
///
/// /actions/mine                                assigned to caller
/// /actions/{id}                                get
/// /actions/{id}/progress                       update progress (PUT)
/// /actions/{id}/resubmit                       reopen after rejection
///
/// /action-reviews/{id}/approve|reject|returned             first level
/// /action-reviews/{id}/approve|reject|returned/higher-level second level
///
/// /attachments                                 upload (multipart), list
/// /attachments/{id}                            get, deactivate (DELETE)
/// /attachments/{id}/download                   stream file
/// /attachments/{id}/status                     review status (PUT)
///
/// /reports/summary                             director summary
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/departments", department::router())
        .nest("/audits", audit::router())
        // Findings also carry the root cause and action collections.
        .nest("/findings", finding::router())
        .nest("/root-causes", root_cause::router())
        .nest("/actions", action::router())
        .nest("/action-reviews", action::review_router())
        .nest("/attachments", attachment::router())
        .nest("/reports", report::router())
}
