//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO, validated with `validator` where it comes
//!   straight from a request body
//! - Request bodies for the workflow commands on that entity

pub mod action;
pub mod attachment;
pub mod audit;
pub mod department;
pub mod event;
pub mod finding;
pub mod report;
pub mod role;
pub mod root_cause;
pub mod user;
