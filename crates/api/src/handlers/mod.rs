//! HTTP handlers, one module per resource.
//!
//! Workflow commands follow the same shape: open a transaction, lock the
//! row, ask `aqms_core` for the transition, write, commit, then publish a
//! [`DomainEvent`](aqms_events::DomainEvent) and log.

pub mod action;
pub mod action_review;
pub mod attachment;
pub mod audit;
pub mod auth;
pub mod department;
pub mod finding;
pub mod report;
pub mod root_cause;
pub mod user;

use aqms_core::types::Date;

/// Today's date in UTC, used for deadline and due-date checks.
pub(crate) fn today() -> Date {
    chrono::Utc::now().date_naive()
}

/// Trim optional free text, treating blank input as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
