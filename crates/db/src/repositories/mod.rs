//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! any Postgres executor as the first argument: `&PgPool` for one-off reads
//! and writes, or `&mut *tx` when a workflow step has to commit together with
//! other writes. Methods named `lock` take a `FOR UPDATE` row lock and must
//! run inside a transaction.

pub mod action_repo;
pub mod attachment_repo;
pub mod audit_repo;
pub mod department_repo;
pub mod event_repo;
pub mod finding_repo;
pub mod report_repo;
pub mod role_repo;
pub mod root_cause_repo;
pub mod user_repo;

pub use action_repo::ActionRepo;
pub use attachment_repo::AttachmentRepo;
pub use audit_repo::AuditRepo;
pub use department_repo::DepartmentRepo;
pub use event_repo::EventRepo;
pub use finding_repo::FindingRepo;
pub use report_repo::ReportRepo;
pub use role_repo::RoleRepo;
pub use root_cause_repo::RootCauseRepo;
pub use user_repo::UserRepo;
