//! Route definitions for the `/admin` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/admin`. Handlers require the `admin` role.
///
/// ```text
/// GET  /users  -> list (?dept_id=)
/// POST /users  -> create
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/users", get(user::list).post(user::create))
}
