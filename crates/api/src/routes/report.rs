use axum::routing::get;
use axum::Router;

use crate::handlers::report;
use crate::state::AppState;

/// Routes mounted at `/reports`.
///
/// ```text
/// GET /summary  -> summary (?audit_id=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/summary", get(report::summary))
}
