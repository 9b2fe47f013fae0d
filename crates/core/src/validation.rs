//! Request validation helpers built on the `validator` crate.
//!
//! Field-level errors are flattened into a single `field: message; ...`
//! string so every endpoint reports validation failures the same way.

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::CoreError;

/// Maximum length for free-text reasons and review feedback.
pub const MAX_REASON_LENGTH: usize = 2_000;

/// Validate a DTO, mapping failures to [`CoreError::Validation`].
pub fn validate_request<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|errors| CoreError::Validation(flatten_errors(&errors)))
}

/// Flatten nested validation errors into `field: message` pairs joined by `; `.
///
/// Pairs are sorted by field path so the output is stable.
pub fn flatten_errors(errors: &ValidationErrors) -> String {
    let mut pairs = Vec::new();
    collect(errors, "", &mut pairs);
    pairs.sort();
    pairs.join("; ")
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    out.push(format!("{path}: {message}"));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

/// Require a non-blank reason of bounded length, returning it trimmed.
///
/// `what` names the field in the error message, e.g. `"Disagreement reason"`.
pub fn require_reason(reason: Option<&str>, what: &str) -> Result<String, CoreError> {
    let trimmed = reason.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{what} is required")));
    }
    if trimmed.chars().count() > MAX_REASON_LENGTH {
        return Err(CoreError::Validation(format!(
            "{what} exceeds maximum length of {MAX_REASON_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}
