//! Audit plan rules.

use crate::error::CoreError;
use crate::status::AuditStatus;
use crate::types::Date;

/// Validate an audit window.
pub fn validate_window(start_date: Date, end_date: Date) -> Result<(), CoreError> {
    if end_date < start_date {
        return Err(CoreError::Validation(format!(
            "Audit end date {end_date} is before start date {start_date}"
        )));
    }
    Ok(())
}

/// Check whether an audit may move from `current` to `target`.
///
/// `Planned → InProgress → Completed`; planned or running audits may be
/// cancelled. Completed and cancelled audits are final.
pub fn ensure_transition(current: AuditStatus, target: AuditStatus) -> Result<(), CoreError> {
    use AuditStatus as S;

    let allowed = matches!(
        (current, target),
        (S::Planned, S::InProgress)
            | (S::InProgress, S::Completed)
            | (S::Planned | S::InProgress, S::Cancelled)
    );
    if allowed {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot move an audit from {current} to {target}"
        )))
    }
}

/// Findings can only be recorded against an audit that is still running.
pub fn accepts_findings(status: AuditStatus) -> bool {
    matches!(status, AuditStatus::Planned | AuditStatus::InProgress)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn single_day_audit_is_valid() {
        let day = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();
        assert!(validate_window(day, day).is_ok());
        assert!(validate_window(day, day.pred_opt().unwrap()).is_err());
    }

    #[test]
    fn audit_progresses_forward_only() {
        assert!(ensure_transition(AuditStatus::Planned, AuditStatus::InProgress).is_ok());
        assert!(ensure_transition(AuditStatus::InProgress, AuditStatus::Completed).is_ok());
        assert!(ensure_transition(AuditStatus::Completed, AuditStatus::InProgress).is_err());
        assert!(ensure_transition(AuditStatus::Planned, AuditStatus::Completed).is_err());
    }

    #[test]
    fn finished_audits_cannot_be_cancelled() {
        assert!(ensure_transition(AuditStatus::InProgress, AuditStatus::Cancelled).is_ok());
        assert!(ensure_transition(AuditStatus::Completed, AuditStatus::Cancelled).is_err());
        assert!(ensure_transition(AuditStatus::Cancelled, AuditStatus::Cancelled).is_err());
    }

    #[test]
    fn only_open_audits_accept_findings() {
        assert!(accepts_findings(AuditStatus::InProgress));
        assert!(!accepts_findings(AuditStatus::Completed));
        assert!(!accepts_findings(AuditStatus::Cancelled));
    }
}
