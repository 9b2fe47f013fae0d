//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000002_create_roles_table.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_AUDITOR: &str = "auditor";
pub const ROLE_LEAD_AUDITOR: &str = "lead_auditor";
pub const ROLE_AUDITEE_OWNER: &str = "auditee_owner";
pub const ROLE_CAPA_OWNER: &str = "capa_owner";
pub const ROLE_DIRECTOR: &str = "director";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[
    ROLE_ADMIN,
    ROLE_AUDITOR,
    ROLE_LEAD_AUDITOR,
    ROLE_AUDITEE_OWNER,
    ROLE_CAPA_OWNER,
    ROLE_DIRECTOR,
];

/// Roles allowed to record findings.
pub const FINDING_AUTHORS: &[&str] = &[ROLE_ADMIN, ROLE_AUDITOR, ROLE_LEAD_AUDITOR];

/// Roles allowed to approve or reject proposed root causes.
pub const ROOT_CAUSE_REVIEWERS: &[&str] = &[ROLE_ADMIN, ROLE_AUDITOR, ROLE_LEAD_AUDITOR];

/// Roles allowed to receive findings, propose root causes and assign actions.
pub const AUDITEE_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_AUDITEE_OWNER];

/// Roles allowed to plan audits and perform higher-level action review.
pub const LEAD_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_LEAD_AUDITOR];

/// Roles allowed to read the director-level reports.
pub const REPORT_READERS: &[&str] = &[ROLE_ADMIN, ROLE_DIRECTOR, ROLE_LEAD_AUDITOR];

/// Whether `role` is one of `allowed`.
pub fn has_any_role(role: &str, allowed: &[&str]) -> bool {
    allowed.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_every_gate() {
        for gate in [FINDING_AUTHORS, ROOT_CAUSE_REVIEWERS, AUDITEE_ROLES, LEAD_ROLES, REPORT_READERS] {
            assert!(has_any_role(ROLE_ADMIN, gate));
        }
    }

    #[test]
    fn capa_owner_cannot_review_root_causes() {
        assert!(!has_any_role(ROLE_CAPA_OWNER, ROOT_CAUSE_REVIEWERS));
    }

    #[test]
    fn auditee_owner_is_not_a_lead() {
        assert!(has_any_role(ROLE_AUDITEE_OWNER, AUDITEE_ROLES));
        assert!(!has_any_role(ROLE_AUDITEE_OWNER, LEAD_ROLES));
    }

    #[test]
    fn role_names_are_unique() {
        let mut names = VALID_ROLES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), VALID_ROLES.len());
    }
}
