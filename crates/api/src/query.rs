//! Shared query parameter types for API handlers.

use std::str::FromStr;

use aqms_core::error::CoreError;
use aqms_core::types::DbId;
use serde::Deserialize;

/// Optional status filter (`?status=`), parsed into the matching core enum
/// by each handler.
#[derive(Debug, Default, Deserialize)]
pub struct StatusFilterParams {
    pub status: Option<String>,
}

/// Optional department filter (`?dept_id=`).
#[derive(Debug, Default, Deserialize)]
pub struct DeptFilterParams {
    pub dept_id: Option<DbId>,
}

/// Parse an optional, possibly blank query value with the type's `FromStr`.
pub fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, CoreError>
where
    T: FromStr<Err = CoreError>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some),
    }
}
