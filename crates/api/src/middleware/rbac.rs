//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role is not
//! in the extractor's role group. Use these in route handlers to enforce
//! authorization at the type level.

use aqms_core::roles::{
    AUDITEE_ROLES, FINDING_AUTHORS, LEAD_ROLES, REPORT_READERS, ROLE_ADMIN, ROOT_CAUSE_REVIEWERS,
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident, $roles:expr, $message:literal) => {
        $(#[$meta])*
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let user = AuthUser::from_request_parts(parts, state).await?;
                user.require_any($roles, $message)?;
                Ok($name(user))
            }
        }
    };
}

role_extractor!(
    /// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
    ///
    /// ```ignore
    /// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
    ///     Ok(Json(()))
    /// }
    /// ```
    RequireAdmin,
    &[ROLE_ADMIN],
    "Admin role required"
);

role_extractor!(
    /// Auditors and lead auditors record findings and assign witnesses.
    RequireFindingAuthor,
    FINDING_AUTHORS,
    "Auditor role required"
);

role_extractor!(
    /// Auditee owners receive findings, assign actions and do first-level review.
    RequireAuditee,
    AUDITEE_ROLES,
    "Auditee Owner role required"
);

role_extractor!(
    /// Approves or rejects proposed root causes.
    RequireRootCauseReviewer,
    ROOT_CAUSE_REVIEWERS,
    "Auditor role required to review root causes"
);

role_extractor!(
    /// Lead auditors return and close findings, do higher-level action
    /// review, and plan audits.
    RequireLeadAuditor,
    LEAD_ROLES,
    "Lead Auditor role required"
);

role_extractor!(
    /// Directors and lead auditors read the summary reports.
    RequireReportReader,
    REPORT_READERS,
    "Director or Lead Auditor role required"
);

/// Requires any authenticated user (any valid role).
///
/// Functionally equivalent to [`AuthUser`] but named explicitly for use in
/// route definitions where the intent "this route requires authentication"
/// should be self-documenting.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
