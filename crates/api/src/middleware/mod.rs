//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac`] -- One extractor per role group (admin, finding author, auditee,
//!   root cause reviewer, lead auditor, report reader) plus [`rbac::RequireAuth`].

pub mod auth;
pub mod rbac;
