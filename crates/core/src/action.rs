//! Corrective action (CAPA) rules: due-date window, progress, two-level
//! review, and planning one action per assigned staff member.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::root_cause::assignment_readiness;
use crate::status::{ActionStatus, RootCauseStatus};
use crate::types::{Date, DbId};

pub const MIN_PROGRESS: i32 = 0;
pub const MAX_PROGRESS: i32 = 100;

/* --------------------------------------------------------------------------
Validation
-------------------------------------------------------------------------- */

/// Clamp a reported progress value into `0..=100`.
pub fn clamp_progress(percent: i32) -> i32 {
    percent.clamp(MIN_PROGRESS, MAX_PROGRESS)
}

/// An action's due date must fall within `today..=finding_deadline`.
pub fn validate_due_date(due_date: Date, today: Date, finding_deadline: Date) -> Result<(), CoreError> {
    if due_date < today {
        return Err(CoreError::Validation(format!(
            "Due date {due_date} is before today ({today})"
        )));
    }
    if due_date > finding_deadline {
        return Err(CoreError::Validation(format!(
            "Due date {due_date} is after the finding deadline ({finding_deadline})"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Review state machine
-------------------------------------------------------------------------- */

/// Which reviewer is acting: the auditee owner (first level) or the lead
/// auditor (higher level).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewLevel {
    First,
    Higher,
}

/// A command applied to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEvent {
    UpdateProgress(i32),
    Approve(ReviewLevel),
    Reject(ReviewLevel),
    Return(ReviewLevel),
    Resubmit,
}

/// The mutable part of an action that review commands touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionState {
    pub status: ActionStatus,
    pub progress_percent: i32,
}

impl ActionState {
    pub fn new(status: ActionStatus, progress_percent: i32) -> Self {
        Self {
            status,
            progress_percent,
        }
    }
}

/// Apply `event` to `state`.
///
/// Every rejection leaves `progress_percent` at 0 so the assignee restarts
/// the work; every other transition keeps the reported progress.
///
/// ```text
/// Open ──first approve──▶ Reviewed ──higher approve──▶ Approved
///  │ ▲                      │  │                         │
///  │ └────resubmit────┐     │  └──higher return──▶ Returned
///  │                  │     │
///  └──first reject──▶ Rejected ◀──higher reject── (Reviewed | Approved)
/// ```
pub fn apply(state: ActionState, event: ActionEvent) -> Result<ActionState, CoreError> {
    use ActionEvent as E;
    use ActionStatus as S;
    use ReviewLevel::{First, Higher};

    let next = match (state.status, event) {
        (S::Open, E::UpdateProgress(percent)) => ActionState::new(S::Open, clamp_progress(percent)),

        (S::Open, E::Approve(First)) => ActionState::new(S::Reviewed, state.progress_percent),
        (S::Open, E::Reject(First)) => ActionState::new(S::Rejected, MIN_PROGRESS),
        (S::Open, E::Return(First)) => ActionState::new(S::Returned, state.progress_percent),

        (S::Reviewed, E::Approve(Higher)) => ActionState::new(S::Approved, state.progress_percent),
        (S::Reviewed | S::Approved, E::Reject(Higher)) => ActionState::new(S::Rejected, MIN_PROGRESS),
        (S::Reviewed, E::Return(Higher)) => ActionState::new(S::Returned, state.progress_percent),

        (S::Returned | S::Rejected, E::Resubmit) => ActionState::new(S::Open, state.progress_percent),

        (status, event) => {
            return Err(CoreError::Conflict(format!(
                "Cannot {} an action in status {status}",
                describe(event)
            )))
        }
    };
    Ok(next)
}

fn describe(event: ActionEvent) -> &'static str {
    match event {
        ActionEvent::UpdateProgress(_) => "update progress on",
        ActionEvent::Approve(ReviewLevel::First) => "review",
        ActionEvent::Approve(ReviewLevel::Higher) => "approve",
        ActionEvent::Reject(_) => "reject",
        ActionEvent::Return(_) => "return",
        ActionEvent::Resubmit => "resubmit",
    }
}

/// A finding can close once it has actions and every one is approved.
pub fn all_actions_approved(statuses: &[ActionStatus]) -> bool {
    !statuses.is_empty() && statuses.iter().all(|s| *s == ActionStatus::Approved)
}

/* --------------------------------------------------------------------------
Assignment planning
-------------------------------------------------------------------------- */

/// The parts of a root cause needed to plan actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCauseSummary {
    pub id: DbId,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub status: RootCauseStatus,
}

/// One row of the assignment form: a root cause handed to a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffAssignment {
    pub root_cause_id: DbId,
    pub staff_id: DbId,
}

/// An action to create, one per distinct staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub assigned_to: DbId,
    pub root_cause_ids: Vec<DbId>,
    pub description: String,
}

/// Group the requested assignments by staff member.
///
/// `root_causes` must be *all* root causes of the finding; assignment is
/// refused unless every one of them is approved. Staff members appear in the
/// order they were first selected, and each action's description lists only
/// the root causes handed to that member.
pub fn plan_actions(
    root_causes: &[RootCauseSummary],
    assignments: &[StaffAssignment],
) -> Result<Vec<PlannedAction>, CoreError> {
    let statuses: Vec<RootCauseStatus> = root_causes.iter().map(|rc| rc.status).collect();
    assignment_readiness(&statuses).ensure_ready()?;

    if assignments.is_empty() {
        return Err(CoreError::Validation(
            "At least one root cause must be assigned to a staff member".to_string(),
        ));
    }

    let mut grouped: Vec<(DbId, Vec<&RootCauseSummary>)> = Vec::new();
    for assignment in assignments {
        let root_cause = root_causes
            .iter()
            .find(|rc| rc.id == assignment.root_cause_id)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Root cause {} does not belong to this finding",
                    assignment.root_cause_id
                ))
            })?;

        match grouped.iter_mut().find(|(staff, _)| *staff == assignment.staff_id) {
            Some((_, causes)) => {
                if !causes.iter().any(|rc| rc.id == root_cause.id) {
                    causes.push(root_cause);
                }
            }
            None => grouped.push((assignment.staff_id, vec![root_cause])),
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(assigned_to, causes)| PlannedAction {
            assigned_to,
            root_cause_ids: causes.iter().map(|rc| rc.id).collect(),
            description: compose_description(&causes),
        })
        .collect())
}

fn compose_description(causes: &[&RootCauseSummary]) -> String {
    causes
        .iter()
        .map(|rc| {
            let mut block = format!("Root cause: {} ({})", rc.name, rc.category);
            if let Some(desc) = rc.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                block.push('\n');
                block.push_str(desc);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn root_cause(id: DbId, name: &str, status: RootCauseStatus) -> RootCauseSummary {
        RootCauseSummary {
            id,
            name: name.to_string(),
            category: "Procedure".to_string(),
            description: Some(format!("{name} details")),
            status,
        }
    }

    fn assign(root_cause_id: DbId, staff_id: DbId) -> StaffAssignment {
        StaffAssignment {
            root_cause_id,
            staff_id,
        }
    }

    // -- due date --

    #[test]
    fn due_date_window_is_inclusive() {
        let today = date(2026, 5, 1);
        let deadline = date(2026, 5, 31);
        assert!(validate_due_date(today, today, deadline).is_ok());
        assert!(validate_due_date(deadline, today, deadline).is_ok());
    }

    #[test]
    fn due_date_after_deadline_is_rejected() {
        let err = validate_due_date(date(2026, 6, 1), date(2026, 5, 1), date(2026, 5, 31)).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("after the finding deadline"));
    }

    #[test]
    fn due_date_in_past_is_rejected() {
        let err = validate_due_date(date(2026, 4, 30), date(2026, 5, 1), date(2026, 5, 31)).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("before today"));
    }

    // -- progress --

    #[test]
    fn progress_is_clamped() {
        assert_eq!(clamp_progress(-5), 0);
        assert_eq!(clamp_progress(55), 55);
        assert_eq!(clamp_progress(250), 100);
    }

    #[test]
    fn progress_updates_only_while_open() {
        let open = ActionState::new(ActionStatus::Open, 10);
        assert_eq!(
            apply(open, ActionEvent::UpdateProgress(140)).unwrap(),
            ActionState::new(ActionStatus::Open, 100)
        );
        let reviewed = ActionState::new(ActionStatus::Reviewed, 100);
        assert_matches!(
            apply(reviewed, ActionEvent::UpdateProgress(50)),
            Err(CoreError::Conflict(_))
        );
    }

    // -- review --

    #[test]
    fn two_level_approval_reaches_approved() {
        let open = ActionState::new(ActionStatus::Open, 100);
        let reviewed = apply(open, ActionEvent::Approve(ReviewLevel::First)).unwrap();
        assert_eq!(reviewed.status, ActionStatus::Reviewed);
        let approved = apply(reviewed, ActionEvent::Approve(ReviewLevel::Higher)).unwrap();
        assert_eq!(approved, ActionState::new(ActionStatus::Approved, 100));
    }

    #[test]
    fn higher_approval_requires_first_review() {
        let open = ActionState::new(ActionStatus::Open, 100);
        assert_matches!(
            apply(open, ActionEvent::Approve(ReviewLevel::Higher)),
            Err(CoreError::Conflict(msg)) if msg.contains("status Open")
        );
    }

    #[test]
    fn every_rejection_resets_progress() {
        let cases = [
            (ActionStatus::Open, ReviewLevel::First),
            (ActionStatus::Reviewed, ReviewLevel::Higher),
            (ActionStatus::Approved, ReviewLevel::Higher),
        ];
        for (status, level) in cases {
            let next = apply(ActionState::new(status, 80), ActionEvent::Reject(level)).unwrap();
            assert_eq!(next, ActionState::new(ActionStatus::Rejected, 0), "from {status}");
        }
    }

    #[test]
    fn return_keeps_progress() {
        let reviewed = ActionState::new(ActionStatus::Reviewed, 90);
        let returned = apply(reviewed, ActionEvent::Return(ReviewLevel::Higher)).unwrap();
        assert_eq!(returned, ActionState::new(ActionStatus::Returned, 90));
    }

    #[test]
    fn resubmit_reopens_returned_and_rejected() {
        for status in [ActionStatus::Returned, ActionStatus::Rejected] {
            let next = apply(ActionState::new(status, 0), ActionEvent::Resubmit).unwrap();
            assert_eq!(next.status, ActionStatus::Open);
        }
        assert!(apply(ActionState::new(ActionStatus::Approved, 100), ActionEvent::Resubmit).is_err());
    }

    #[test]
    fn all_actions_approved_needs_at_least_one() {
        assert!(!all_actions_approved(&[]));
        assert!(!all_actions_approved(&[ActionStatus::Approved, ActionStatus::Reviewed]));
        assert!(all_actions_approved(&[ActionStatus::Approved, ActionStatus::Approved]));
    }

    // -- planning --

    #[test]
    fn pending_root_cause_blocks_planning() {
        let causes = [
            root_cause(1, "Fatigue", RootCauseStatus::Approved),
            root_cause(2, "Checklist gap", RootCauseStatus::Pending),
        ];
        let err = plan_actions(&causes, &[assign(1, 10)]).unwrap_err();
        assert_matches!(err, CoreError::Conflict(msg) if msg.contains("pending review"));
    }

    #[test]
    fn finding_without_root_causes_cannot_be_planned() {
        assert_matches!(plan_actions(&[], &[assign(1, 10)]), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn two_staff_get_two_actions_with_their_own_causes() {
        let causes = [
            root_cause(1, "Fatigue", RootCauseStatus::Approved),
            root_cause(2, "Checklist gap", RootCauseStatus::Approved),
        ];
        let planned = plan_actions(&causes, &[assign(1, 10), assign(2, 20)]).unwrap();

        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].assigned_to, 10);
        assert_eq!(planned[0].root_cause_ids, vec![1]);
        assert!(planned[0].description.contains("Fatigue"));
        assert!(!planned[0].description.contains("Checklist gap"));

        assert_eq!(planned[1].assigned_to, 20);
        assert_eq!(planned[1].root_cause_ids, vec![2]);
        assert!(planned[1].description.contains("Checklist gap"));
        assert!(!planned[1].description.contains("Fatigue"));
    }

    #[test]
    fn one_staff_member_gets_one_aggregated_action() {
        let causes = [
            root_cause(1, "Fatigue", RootCauseStatus::Approved),
            root_cause(2, "Checklist gap", RootCauseStatus::Approved),
        ];
        let planned =
            plan_actions(&causes, &[assign(1, 10), assign(2, 10), assign(1, 10)]).unwrap();

        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].root_cause_ids, vec![1, 2]);
        assert_eq!(
            planned[0].description,
            "Root cause: Fatigue (Procedure)\nFatigue details\n\n\
             Root cause: Checklist gap (Procedure)\nChecklist gap details"
        );
    }

    #[test]
    fn foreign_root_cause_is_rejected() {
        let causes = [root_cause(1, "Fatigue", RootCauseStatus::Approved)];
        assert_matches!(
            plan_actions(&causes, &[assign(99, 10)]),
            Err(CoreError::Validation(msg)) if msg.contains("99")
        );
    }

    #[test]
    fn empty_assignment_list_is_rejected() {
        let causes = [root_cause(1, "Fatigue", RootCauseStatus::Approved)];
        assert_matches!(plan_actions(&causes, &[]), Err(CoreError::Validation(_)));
    }
}
