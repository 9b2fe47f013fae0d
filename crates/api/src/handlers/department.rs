//! Handlers for the `/departments` resource.

use aqms_core::validation::validate_request;
use aqms_db::models::department::{CreateDepartment, Department};
use aqms_db::repositories::DepartmentRepo;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/departments
pub async fn list(
    RequireAuth(_user): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Department>>>> {
    let departments = DepartmentRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: departments }))
}

/// POST /api/v1/departments
///
/// Department codes are unique (`uq_departments_code`); duplicates are 409.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateDepartment>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    let department = DepartmentRepo::create(&state.pool, &input).await?;

    tracing::info!(
        user_id = admin.user_id,
        dept_id = department.id,
        code = %department.code,
        "Department created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: department })))
}
