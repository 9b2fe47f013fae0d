//! Finding lifecycle rules.
//!
//! A finding moves through the witness stage (optional), is received by the
//! auditee owner, may be returned by the lead auditor, and is closed once all
//! of its corrective actions are approved.
//!
//! ```text
//! Open ──assign witness──▶ PendingWitnessConfirmation ──confirm──▶ Confirmed
//!   │                              └──disagree──▶ WitnessDisagreed ──archive──▶ Archived
//!   │                                                                    ▲
//!   └──mark received──▶ Received ◀──mark received── Confirmed            │
//!                        │  ▲                                            │
//!                 return │  │ mark received                              │
//!                        ▼  │                                            │
//!                       Return          Received ──close──▶ Closed ──────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::FindingStatus;
use crate::types::{Date, DbId};

/* --------------------------------------------------------------------------
Severity and source
-------------------------------------------------------------------------- */

/// Finding severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: &'static [Severity] = &[
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    /// Sort rank; lower is more severe.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid severity '{value}'. Must be one of: Critical, High, Medium, Low"
                ))
            })
    }
}

/// Who raised the finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingSource {
    Internal,
    External,
}

impl FindingSource {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingSource::Internal => "Internal",
            FindingSource::External => "External",
        }
    }
}

impl FromStr for FindingSource {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(FindingSource::Internal),
            "external" => Ok(FindingSource::External),
            _ => Err(CoreError::Validation(format!(
                "Invalid source '{value}'. Must be one of: Internal, External"
            ))),
        }
    }
}

/// External findings must name the external auditor; internal ones must not.
///
/// Returns the normalized auditor name to store.
pub fn validate_source(
    source: FindingSource,
    external_auditor_name: Option<&str>,
) -> Result<Option<String>, CoreError> {
    let name = external_auditor_name
        .map(str::trim)
        .filter(|n| !n.is_empty());
    match (source, name) {
        (FindingSource::External, None) => Err(CoreError::Validation(
            "external_auditor_name is required for External findings".to_string(),
        )),
        (FindingSource::External, Some(n)) => Ok(Some(n.to_string())),
        (FindingSource::Internal, _) => Ok(None),
    }
}

/// A finding deadline may not already have passed when it is recorded.
pub fn validate_deadline(deadline: Date, today: Date) -> Result<(), CoreError> {
    if deadline < today {
        return Err(CoreError::Validation(format!(
            "Deadline {deadline} is in the past"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Transitions
-------------------------------------------------------------------------- */

/// A command that changes a finding's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingEvent {
    AssignWitness,
    WitnessConfirm,
    WitnessDisagree,
    MarkReceived,
    Return,
    Close,
    Archive,
}

impl FindingEvent {
    fn verb(self) -> &'static str {
        match self {
            FindingEvent::AssignWitness => "assign a witness to",
            FindingEvent::WitnessConfirm => "confirm",
            FindingEvent::WitnessDisagree => "disagree with",
            FindingEvent::MarkReceived => "mark as received",
            FindingEvent::Return => "return",
            FindingEvent::Close => "close",
            FindingEvent::Archive => "archive",
        }
    }
}

/// Status a newly recorded finding starts in.
pub fn initial_status(has_witness: bool) -> FindingStatus {
    if has_witness {
        FindingStatus::PendingWitnessConfirmation
    } else {
        FindingStatus::Open
    }
}

/// Compute the status after applying `event`, or a `Conflict` if the event
/// is not allowed from `current`.
pub fn next_status(current: FindingStatus, event: FindingEvent) -> Result<FindingStatus, CoreError> {
    use FindingEvent as E;
    use FindingStatus as S;

    let next = match (current, event) {
        (S::Open, E::AssignWitness) => Some(S::PendingWitnessConfirmation),
        (S::PendingWitnessConfirmation, E::WitnessConfirm) => Some(S::Confirmed),
        (S::PendingWitnessConfirmation, E::WitnessDisagree) => Some(S::WitnessDisagreed),
        (S::Open | S::Confirmed | S::Return | S::Received, E::MarkReceived) => Some(S::Received),
        (S::Received, E::Return) => Some(S::Return),
        (S::Received, E::Close) => Some(S::Closed),
        (S::Closed | S::WitnessDisagreed, E::Archive) => Some(S::Archived),
        _ => None,
    };

    next.ok_or_else(|| {
        CoreError::Conflict(format!(
            "Cannot {} a finding in status {current}",
            event.verb()
        ))
    })
}

/// Only the named witness may confirm or disagree, and only once.
pub fn ensure_witness(
    status: FindingStatus,
    witness_id: Option<DbId>,
    user_id: DbId,
) -> Result<(), CoreError> {
    if status != FindingStatus::PendingWitnessConfirmation {
        return Err(CoreError::Conflict(format!(
            "Finding is not awaiting witness confirmation (status {status})"
        )));
    }
    match witness_id {
        Some(id) if id == user_id => Ok(()),
        Some(_) => Err(CoreError::Forbidden(
            "Only the assigned witness may respond to this finding".to_string(),
        )),
        None => Err(CoreError::Conflict(
            "Finding has no assigned witness".to_string(),
        )),
    }
}

/// A witness can only be assigned while none is active.
pub fn ensure_can_assign_witness(
    status: FindingStatus,
    current_witness: Option<DbId>,
    created_by: DbId,
    witness_id: DbId,
) -> Result<(), CoreError> {
    if current_witness.is_some() {
        return Err(CoreError::Conflict(
            "Finding already has an active witness".to_string(),
        ));
    }
    if witness_id == created_by {
        return Err(CoreError::Validation(
            "The finding author cannot witness their own finding".to_string(),
        ));
    }
    next_status(status, FindingEvent::AssignWitness).map(|_| ())
}

/// Root causes may be proposed once the finding is accepted and until it closes.
pub fn accepts_root_causes(status: FindingStatus) -> Result<(), CoreError> {
    use FindingStatus as S;

    if matches!(status, S::Open | S::Confirmed | S::Received | S::Return) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Cannot propose root causes for a finding in status {status}"
        )))
    }
}

/// Actions of a closed or archived finding are frozen: no progress, review
/// or resubmission.
pub fn accepts_action_changes(status: FindingStatus) -> Result<(), CoreError> {
    if matches!(status, FindingStatus::Closed | FindingStatus::Archived) {
        Err(CoreError::Conflict(format!(
            "Actions of a finding in status {status} can no longer change"
        )))
    } else {
        Ok(())
    }
}
