//! JWT-based authentication extractor for Axum handlers.

use aqms_core::error::CoreError;
use aqms_core::roles::{has_any_role, ROLE_ADMIN};
use aqms_core::types::DbId;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// Claims are decoded once per request; handlers read the role and
/// department from here instead of looking the user up again.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name (e.g. `"auditor"`, `"auditee_owner"`).
    pub role: String,
    /// The user's department, if any.
    pub dept_id: Option<DbId>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Reject with 403 unless the user holds one of `allowed`.
    pub fn require_any(&self, allowed: &[&str], message: &str) -> Result<(), AppError> {
        if has_any_role(&self.role, allowed) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(message.to_string())))
        }
    }

    /// Auditee owners act only on their own department; admins act anywhere.
    pub fn ensure_department(&self, dept_id: DbId) -> Result<(), AppError> {
        if self.is_admin() || self.dept_id == Some(dept_id) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(
                "Finding belongs to another department".into(),
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            dept_id: claims.dept_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use aqms_core::roles::{LEAD_ROLES, ROLE_AUDITEE_OWNER};

    use super::*;

    fn owner(dept_id: Option<DbId>) -> AuthUser {
        AuthUser {
            user_id: 7,
            role: ROLE_AUDITEE_OWNER.to_string(),
            dept_id,
        }
    }

    #[test]
    fn department_scope_applies_to_non_admins() {
        assert!(owner(Some(2)).ensure_department(2).is_ok());
        assert_matches!(
            owner(Some(2)).ensure_department(3),
            Err(AppError::Core(CoreError::Forbidden(_)))
        );
        assert!(owner(None).ensure_department(2).is_err());
    }

    #[test]
    fn admin_is_never_department_scoped() {
        let admin = AuthUser {
            user_id: 1,
            role: ROLE_ADMIN.to_string(),
            dept_id: None,
        };
        assert!(admin.ensure_department(99).is_ok());
    }

    #[test]
    fn require_any_rejects_missing_role() {
        assert_matches!(
            owner(None).require_any(LEAD_ROLES, "Lead Auditor role required"),
            Err(AppError::Core(CoreError::Forbidden(msg))) if msg == "Lead Auditor role required"
        );
    }
}
