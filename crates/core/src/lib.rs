//! Domain rules for the aviation quality-audit workflow.
//!
//! This crate is pure: no I/O, no database access. It owns the canonical
//! status enums and every transition rule so the DB and API layers never
//! compare status strings themselves.

pub mod action;
pub mod attachment;
pub mod audit;
pub mod error;
pub mod finding;
pub mod reporting;
pub mod roles;
pub mod root_cause;
pub mod status;
pub mod types;
pub mod validation;
