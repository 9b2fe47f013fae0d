//! Root cause review rules and the action-assignment gate.

use serde::Serialize;

use crate::error::CoreError;
use crate::status::RootCauseStatus;

/// A command that changes a root cause's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootCauseEvent {
    Approve,
    Reject,
    Repropose,
}

/// Compute the status after applying `event`.
///
/// ```text
/// Pending ──approve──▶ Approved
///    │  ▲
/// reject│  │repropose
///    ▼  │
/// Rejected
/// ```
pub fn next_status(
    current: RootCauseStatus,
    event: RootCauseEvent,
) -> Result<RootCauseStatus, CoreError> {
    use RootCauseEvent as E;
    use RootCauseStatus as S;

    match (current, event) {
        (S::Pending, E::Approve) => Ok(S::Approved),
        (S::Pending, E::Reject) => Ok(S::Rejected),
        (S::Rejected, E::Repropose) => Ok(S::Pending),
        (status, event) => Err(CoreError::Conflict(format!(
            "Cannot {} a root cause in status {status}",
            match event {
                E::Approve => "approve",
                E::Reject => "reject",
                E::Repropose => "re-propose",
            }
        ))),
    }
}

/// Whether a finding's root causes allow corrective actions to be assigned.
///
/// A finding with no root causes is blocked, which is distinct from having
/// root causes that are still pending or were rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentReadiness {
    /// No root cause has been proposed yet.
    NoRootCauses,
    /// At least one root cause was rejected and must be re-proposed.
    HasRejected,
    /// At least one root cause is still awaiting review.
    PendingReview,
    /// Every root cause is approved.
    Ready,
}

impl AssignmentReadiness {
    pub fn is_ready(self) -> bool {
        self == AssignmentReadiness::Ready
    }

    /// Turn a blocked state into the error returned by assignment endpoints.
    pub fn ensure_ready(self) -> Result<(), CoreError> {
        match self {
            AssignmentReadiness::Ready => Ok(()),
            AssignmentReadiness::NoRootCauses => Err(CoreError::Conflict(
                "Finding has no root causes; propose and approve at least one first".to_string(),
            )),
            AssignmentReadiness::HasRejected => Err(CoreError::Conflict(
                "Finding has rejected root causes that must be re-proposed".to_string(),
            )),
            AssignmentReadiness::PendingReview => Err(CoreError::Conflict(
                "Finding has root causes pending review".to_string(),
            )),
        }
    }
}

/// Derive the assignment gate from the statuses of all of a finding's root causes.
pub fn assignment_readiness(statuses: &[RootCauseStatus]) -> AssignmentReadiness {
    if statuses.is_empty() {
        AssignmentReadiness::NoRootCauses
    } else if statuses.contains(&RootCauseStatus::Rejected) {
        AssignmentReadiness::HasRejected
    } else if statuses.contains(&RootCauseStatus::Pending) {
        AssignmentReadiness::PendingReview
    } else {
        AssignmentReadiness::Ready
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::status::RootCauseStatus::{Approved, Pending, Rejected};

    #[test]
    fn pending_root_cause_can_be_approved_or_rejected() {
        assert_eq!(next_status(Pending, RootCauseEvent::Approve).unwrap(), Approved);
        assert_eq!(next_status(Pending, RootCauseEvent::Reject).unwrap(), Rejected);
    }

    #[test]
    fn approved_root_cause_is_final() {
        assert_matches!(
            next_status(Approved, RootCauseEvent::Reject),
            Err(CoreError::Conflict(msg)) if msg.contains("Approved")
        );
        assert!(next_status(Approved, RootCauseEvent::Repropose).is_err());
    }

    #[test]
    fn rejected_root_cause_can_be_reproposed() {
        assert_eq!(next_status(Rejected, RootCauseEvent::Repropose).unwrap(), Pending);
        assert!(next_status(Rejected, RootCauseEvent::Approve).is_err());
    }

    #[test]
    fn zero_root_causes_blocks_assignment() {
        let readiness = assignment_readiness(&[]);
        assert_eq!(readiness, AssignmentReadiness::NoRootCauses);
        assert!(readiness.ensure_ready().is_err());
    }

    #[test]
    fn one_pending_blocks_assignment() {
        assert_eq!(
            assignment_readiness(&[Approved, Pending]),
            AssignmentReadiness::PendingReview
        );
    }

    #[test]
    fn rejected_takes_precedence_over_pending() {
        assert_eq!(
            assignment_readiness(&[Pending, Rejected, Approved]),
            AssignmentReadiness::HasRejected
        );
    }

    #[test]
    fn all_approved_is_ready() {
        let readiness = assignment_readiness(&[Approved, Approved]);
        assert!(readiness.is_ready());
        assert!(readiness.ensure_ready().is_ok());
    }
}
