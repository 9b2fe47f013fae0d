//! Admin handlers for the `/admin/users` resource.

use aqms_core::error::CoreError;
use aqms_core::types::DbId;
use aqms_core::validation::validate_request;
use aqms_db::models::user::{CreateUser, UserResponse};
use aqms_db::repositories::{RoleRepo, UserRepo};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::DeptFilterParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub full_name: String,
    pub password: String,
    /// Role name, e.g. `"auditee_owner"`.
    pub role: String,
    pub dept_id: Option<DbId>,
}

/// GET /api/v1/admin/users?dept_id=
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<DeptFilterParams>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool, params.dept_id).await?;
    Ok(Json(DataResponse { data: users }))
}

/// POST /api/v1/admin/users
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let role = RoleRepo::find_by_name(&state.pool, input.role.trim())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!("Unknown role '{}'", input.role)))
        })?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: input.email.trim().to_string(),
            full_name: input.full_name.trim().to_string(),
            password_hash,
            role_id: role.id,
            dept_id: input.dept_id,
        },
    )
    .await?;

    let response = UserRepo::find_response_by_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User", user.id))?;

    tracing::info!(
        user_id = admin.user_id,
        created_user_id = user.id,
        role = %role.name,
        "User created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}
