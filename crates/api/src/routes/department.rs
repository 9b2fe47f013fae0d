use axum::routing::get;
use axum::Router;

use crate::handlers::department;
use crate::state::AppState;

/// Routes mounted at `/departments`.
///
/// ```text
/// GET  /  -> list
/// POST /  -> create (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(department::list).post(department::create))
}
