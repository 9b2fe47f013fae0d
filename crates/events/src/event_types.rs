//! Event names published by the workflow commands.
//!
//! Names are `<entity>.<past-tense verb>` and double as the `event_type`
//! column value in the `events` table.

pub const AUDIT_CREATED: &str = "audit.created";
pub const AUDIT_STATUS_CHANGED: &str = "audit.status_changed";

pub const FINDING_CREATED: &str = "finding.created";
pub const FINDING_WITNESS_ASSIGNED: &str = "finding.witness_assigned";
pub const FINDING_WITNESS_CONFIRMED: &str = "finding.witness_confirmed";
/// Carries the witness's reason; the finding's author is notified.
pub const FINDING_WITNESS_DISAGREED: &str = "finding.witness_disagreed";
pub const FINDING_RECEIVED: &str = "finding.received";
pub const FINDING_RETURNED: &str = "finding.returned";
pub const FINDING_CLOSED: &str = "finding.closed";
pub const FINDING_ARCHIVED: &str = "finding.archived";

pub const ROOT_CAUSE_PROPOSED: &str = "root_cause.proposed";
pub const ROOT_CAUSE_APPROVED: &str = "root_cause.approved";
pub const ROOT_CAUSE_REJECTED: &str = "root_cause.rejected";
pub const ROOT_CAUSE_REPROPOSED: &str = "root_cause.reproposed";

pub const ACTION_ASSIGNED: &str = "action.assigned";
pub const ACTION_PROGRESS_UPDATED: &str = "action.progress_updated";
pub const ACTION_REVIEWED: &str = "action.reviewed";
pub const ACTION_APPROVED: &str = "action.approved";
pub const ACTION_REJECTED: &str = "action.rejected";
pub const ACTION_RETURNED: &str = "action.returned";
pub const ACTION_RESUBMITTED: &str = "action.resubmitted";

pub const ATTACHMENT_UPLOADED: &str = "attachment.uploaded";
pub const ATTACHMENT_STATUS_CHANGED: &str = "attachment.status_changed";

/// Entity kinds used as `entity_type`.
pub mod entity {
    pub const AUDIT: &str = "audit";
    pub const FINDING: &str = "finding";
    pub const ROOT_CAUSE: &str = "root_cause";
    pub const ACTION: &str = "action";
    pub const ATTACHMENT: &str = "attachment";
}
