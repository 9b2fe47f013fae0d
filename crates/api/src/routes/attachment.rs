//! Route definitions for the `/attachments` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use axum::Router;

use crate::handlers::attachment;
use crate::state::AppState;

/// Routes mounted at `/attachments`.
///
/// The upload route lifts axum's default body limit; the handler enforces
/// the configured maximum while reading the file.
///
/// ```text
/// POST   /                -> upload (multipart)
/// GET    /                -> list (?parent_type=&parent_id=&include_inactive=)
/// GET    /{id}            -> get
/// DELETE /{id}            -> deactivate
/// GET    /{id}/download   -> download (streamed)
/// PUT    /{id}/status     -> update_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(attachment::list)
                .post(attachment::upload)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/{id}",
            get(attachment::get).delete(attachment::deactivate),
        )
        .route("/{id}/download", get(attachment::download))
        .route("/{id}/status", put(attachment::update_status))
}
