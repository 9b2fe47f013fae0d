//! End-to-end HTTP tests for the finding lifecycle: record, root cause
//! review, action assignment, two-level review, evidence and auto-close.

mod common;

use aqms_core::status::{ActionStatus, AttachmentStatus, FindingStatus, RootCauseStatus};
use aqms_core::types::DbId;
use axum::http::StatusCode;
use axum::Router;
use chrono::{Duration, Utc};
use common::{body_bytes, body_json, get_auth, post_json_auth, put_json_auth, upload_file};
use serde_json::{json, Value};
use sqlx::PgPool;

struct Actors {
    dept_id: DbId,
    lead: String,
    auditor_id: DbId,
    auditor: String,
    owner: String,
    staff_id: DbId,
    staff: String,
    witness_id: DbId,
    witness: String,
    other_owner: String,
}

async fn actors(pool: &PgPool) -> Actors {
    let dept_id = common::create_department(pool, "HGR").await;
    let other_dept = common::create_department(pool, "CAB").await;
    let (_, lead) = common::create_user(pool, "lead@example.com", "lead_auditor", Some(dept_id)).await;
    let (auditor_id, auditor) = common::create_user(pool, "auditor@example.com", "auditor", Some(dept_id)).await;
    let (_, owner) = common::create_user(pool, "owner@example.com", "auditee_owner", Some(dept_id)).await;
    let (staff_id, staff) = common::create_user(pool, "staff@example.com", "capa_owner", Some(dept_id)).await;
    let (witness_id, witness) = common::create_user(pool, "witness@example.com", "auditor", Some(dept_id)).await;
    let (_, other_owner) =
        common::create_user(pool, "other@example.com", "auditee_owner", Some(other_dept)).await;
    Actors {
        dept_id,
        lead,
        auditor_id,
        auditor,
        owner,
        staff_id,
        staff,
        witness_id,
        witness,
        other_owner,
    }
}

fn days_from_now(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).to_string()
}

async fn data(response: axum::http::Response<axum::body::Body>, expected: StatusCode) -> Value {
    let status = response.status();
    let json = body_json(response).await;
    assert_eq!(status, expected, "unexpected response body: {json}");
    json["data"].clone()
}

async fn create_audit(app: &Router, a: &Actors) -> DbId {
    let audit = data(
        post_json_auth(
            app.clone(),
            "/api/v1/audits",
            json!({
                "title": "Hangar 2 line maintenance audit",
                "dept_id": a.dept_id,
                "start_date": days_from_now(0),
                "end_date": days_from_now(5),
            }),
            &a.lead,
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    audit["id"].as_i64().unwrap()
}

async fn create_finding(app: &Router, a: &Actors, audit_id: DbId, witness_id: Option<DbId>) -> Value {
    data(
        post_json_auth(
            app.clone(),
            "/api/v1/findings",
            json!({
                "audit_id": audit_id,
                "title": "Torque wrench past calibration date",
                "severity": "High",
                "dept_id": a.dept_id,
                "deadline": days_from_now(30),
                "witness_id": witness_id,
            }),
            &a.auditor,
        )
        .await,
        StatusCode::CREATED,
    )
    .await
}

async fn propose_root_cause(app: &Router, a: &Actors, finding_id: DbId) -> DbId {
    let rc = data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/findings/{finding_id}/root-causes"),
            json!({ "name": "Calibration tracking gap", "category": "Procedure" }),
            &a.owner,
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(rc["status_id"], RootCauseStatus::Pending.id());
    rc["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Full lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn finding_closes_when_its_only_action_is_approved(pool: PgPool) {
    let a = actors(&pool).await;
    let app = common::build_test_app(pool);

    let audit_id = create_audit(&app, &a).await;
    let finding = create_finding(&app, &a, audit_id, None).await;
    assert_eq!(finding["status_id"], FindingStatus::Open.id());
    let finding_id = finding["id"].as_i64().unwrap();

    // Assignment is blocked until a root cause exists and is approved.
    let readiness = data(
        get_auth(app.clone(), &format!("/api/v1/findings/{finding_id}/readiness"), &a.owner).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(readiness["readiness"], "NoRootCauses");
    assert_eq!(readiness["ready"], false);

    let rc_id = propose_root_cause(&app, &a, finding_id).await;

    let blocked = post_json_auth(
        app.clone(),
        &format!("/api/v1/findings/{finding_id}/actions"),
        json!({
            "assignments": [{ "root_cause_id": rc_id, "staff_id": a.staff_id }],
            "due_date": days_from_now(10),
        }),
        &a.owner,
    )
    .await;
    assert_eq!(blocked.status(), StatusCode::CONFLICT);

    let rc = data(
        post_json_auth(app.clone(), &format!("/api/v1/root-causes/{rc_id}/approve"), json!({}), &a.auditor).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(rc["status_id"], RootCauseStatus::Approved.id());

    // Assigning receives the finding and creates one action per staff member.
    let actions = data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/findings/{finding_id}/actions"),
            json!({
                "assignments": [{ "root_cause_id": rc_id, "staff_id": a.staff_id }],
                "due_date": days_from_now(10),
            }),
            &a.owner,
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let actions = actions.as_array().unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["assigned_to"], a.staff_id);
    assert_eq!(actions[0]["root_cause_ids"], json!([rc_id]));
    let action_id = actions[0]["id"].as_i64().unwrap();

    let finding = data(
        get_auth(app.clone(), &format!("/api/v1/findings/{finding_id}"), &a.owner).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(finding["status_id"], FindingStatus::Received.id());

    // The assignee sees the action, reports progress and attaches evidence.
    let mine = data(get_auth(app.clone(), "/api/v1/actions/mine", &a.staff).await, StatusCode::OK).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let progressed = data(
        put_json_auth(
            app.clone(),
            &format!("/api/v1/actions/{action_id}/progress"),
            json!({ "progress_percent": 150 }),
            &a.staff,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(progressed["progress_percent"], 100);

    let evidence = data(
        upload_file(app.clone(), &a.staff, "Action", action_id, "calibration cert.pdf", b"%PDF-1.4 cert").await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(evidence["file_name"], "calibration_cert.pdf");
    assert_eq!(evidence["content_type"], "application/pdf");
    assert_eq!(evidence["status_id"], AttachmentStatus::Open.id());
    assert!(evidence.get("file_path").is_none());
    let attachment_id = evidence["id"].as_i64().unwrap();

    // First-level review by the auditee owner, then higher-level approval.
    let reviewed = data(
        post_json_auth(app.clone(), &format!("/api/v1/action-reviews/{action_id}/approve"), json!({}), &a.owner).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(reviewed["action"]["status_id"], ActionStatus::Reviewed.id());
    assert_eq!(reviewed["finding_closed"], false);

    let approved = data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/action-reviews/{action_id}/approve/higher-level"),
            json!({ "feedback": "Certificate verified" }),
            &a.lead,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(approved["action"]["status_id"], ActionStatus::Approved.id());
    assert_eq!(approved["approved_attachment_ids"], json!([attachment_id]));
    assert_eq!(approved["finding_closed"], true);

    let finding = data(
        get_auth(app.clone(), &format!("/api/v1/findings/{finding_id}"), &a.lead).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(finding["status_id"], FindingStatus::Closed.id());
    assert!(!finding["closed_at"].is_null());

    let attachment = data(
        get_auth(app.clone(), &format!("/api/v1/attachments/{attachment_id}"), &a.staff).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(attachment["status_id"], AttachmentStatus::Approved.id());

    // The director summary sees one closed finding.
    let report = data(
        get_auth(app, &format!("/api/v1/reports/summary?audit_id={audit_id}"), &a.lead).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(report["total_findings"], 1);
    assert_eq!(report["closure_rate"], 100.0);
    assert_eq!(report["overdue_actions"], 0);
    assert_eq!(report["findings_by_severity"][1], json!({ "label": "High", "count": 1 }));
}

// ---------------------------------------------------------------------------
// Witness and root cause branches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn witness_confirms_or_disagrees(pool: PgPool) {
    let a = actors(&pool).await;
    let app = common::build_test_app(pool);
    let audit_id = create_audit(&app, &a).await;

    let finding = create_finding(&app, &a, audit_id, Some(a.witness_id)).await;
    assert_eq!(finding["status_id"], FindingStatus::PendingWitnessConfirmation.id());
    let finding_id = finding["id"].as_i64().unwrap();

    // Only the named witness may respond.
    let not_witness = post_json_auth(
        app.clone(),
        &format!("/api/v1/findings/{finding_id}/witness/confirm"),
        json!({}),
        &a.owner,
    )
    .await;
    assert_eq!(not_witness.status(), StatusCode::FORBIDDEN);

    let confirmed = data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/findings/{finding_id}/witness/confirm"),
            json!({}),
            &a.witness,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(confirmed["status_id"], FindingStatus::Confirmed.id());

    let second = create_finding(&app, &a, audit_id, Some(a.witness_id)).await;
    let second_id = second["id"].as_i64().unwrap();

    let no_reason = post_json_auth(
        app.clone(),
        &format!("/api/v1/findings/{second_id}/witness/disagree"),
        json!({ "reason": "  " }),
        &a.witness,
    )
    .await;
    assert_eq!(no_reason.status(), StatusCode::BAD_REQUEST);

    let disagreed = data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/findings/{second_id}/witness/disagree"),
            json!({ "reason": "Wrench was tagged out of service" }),
            &a.witness,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(disagreed["status_id"], FindingStatus::WitnessDisagreed.id());
    assert_eq!(disagreed["witness_reason"], "Wrench was tagged out of service");

    // The trail endpoint answers even before the background writer has
    // persisted anything; the test app does not run it.
    let events = data(
        get_auth(app, &format!("/api/v1/findings/{second_id}/events"), &a.lead).await,
        StatusCode::OK,
    )
    .await;
    assert!(events.is_array());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn author_cannot_witness_own_finding(pool: PgPool) {
    let a = actors(&pool).await;
    let app = common::build_test_app(pool);
    let audit_id = create_audit(&app, &a).await;

    let response = post_json_auth(
        app,
        "/api/v1/findings",
        json!({
            "audit_id": audit_id,
            "title": "Self witnessed",
            "severity": "Low",
            "dept_id": a.dept_id,
            "deadline": days_from_now(10),
            "witness_id": a.auditor_id,
        }),
        &a.auditor,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn past_deadline_is_rejected(pool: PgPool) {
    let a = actors(&pool).await;
    let app = common::build_test_app(pool);
    let audit_id = create_audit(&app, &a).await;

    let response = post_json_auth(
        app,
        "/api/v1/findings",
        json!({
            "audit_id": audit_id,
            "title": "Late",
            "severity": "Medium",
            "dept_id": a.dept_id,
            "deadline": days_from_now(-1),
        }),
        &a.auditor,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rejected_root_cause_needs_reason_and_can_be_reproposed(pool: PgPool) {
    let a = actors(&pool).await;
    let app = common::build_test_app(pool);
    let audit_id = create_audit(&app, &a).await;
    let finding_id = create_finding(&app, &a, audit_id, None).await["id"].as_i64().unwrap();
    let rc_id = propose_root_cause(&app, &a, finding_id).await;

    let missing_reason = post_json_auth(
        app.clone(),
        &format!("/api/v1/root-causes/{rc_id}/reject"),
        json!({}),
        &a.auditor,
    )
    .await;
    assert_eq!(missing_reason.status(), StatusCode::BAD_REQUEST);

    let rejected = data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/root-causes/{rc_id}/reject"),
            json!({ "reason_reject": "Too generic" }),
            &a.auditor,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(rejected["status_id"], RootCauseStatus::Rejected.id());

    let readiness = data(
        get_auth(app.clone(), &format!("/api/v1/findings/{finding_id}/readiness"), &a.owner).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(readiness["readiness"], "HasRejected");

    // Another department's owner cannot touch it.
    let foreign = post_json_auth(
        app.clone(),
        &format!("/api/v1/root-causes/{rc_id}/repropose"),
        json!({ "name": "Expired cal sticker not caught at shift handover" }),
        &a.other_owner,
    )
    .await;
    assert_eq!(foreign.status(), StatusCode::FORBIDDEN);

    let reproposed = data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/root-causes/{rc_id}/repropose"),
            json!({ "name": "Expired cal sticker not caught at shift handover" }),
            &a.owner,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(reproposed["status_id"], RootCauseStatus::Pending.id());
    assert_eq!(reproposed["name"], "Expired cal sticker not caught at shift handover");
    assert!(reproposed["reason_reject"].is_null());

    // Approving an already-approved root cause is an illegal transition.
    post_json_auth(app.clone(), &format!("/api/v1/root-causes/{rc_id}/approve"), json!({}), &a.auditor).await;
    let again = post_json_auth(app, &format!("/api/v1/root-causes/{rc_id}/approve"), json!({}), &a.auditor).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Action review branches
// ---------------------------------------------------------------------------

async fn assigned_action(app: &Router, a: &Actors) -> (DbId, DbId) {
    let audit_id = create_audit(app, a).await;
    let finding_id = create_finding(app, a, audit_id, None).await["id"].as_i64().unwrap();
    let rc_id = propose_root_cause(app, a, finding_id).await;
    post_json_auth(app.clone(), &format!("/api/v1/root-causes/{rc_id}/approve"), json!({}), &a.auditor).await;
    let actions = data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/findings/{finding_id}/actions"),
            json!({
                "assignments": [{ "root_cause_id": rc_id, "staff_id": a.staff_id }],
                "due_date": days_from_now(7),
                "title": "Recalibrate and tag all torque wrenches",
            }),
            &a.owner,
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(actions[0]["title"], "Recalibrate and tag all torque wrenches");
    (finding_id, actions[0]["id"].as_i64().unwrap())
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn rejection_resets_progress_and_resubmit_reopens(pool: PgPool) {
    let a = actors(&pool).await;
    let app = common::build_test_app(pool);
    let (_, action_id) = assigned_action(&app, &a).await;

    put_json_auth(
        app.clone(),
        &format!("/api/v1/actions/{action_id}/progress"),
        json!({ "progress_percent": 60 }),
        &a.staff,
    )
    .await;

    let no_feedback = post_json_auth(
        app.clone(),
        &format!("/api/v1/action-reviews/{action_id}/reject"),
        json!({}),
        &a.owner,
    )
    .await;
    assert_eq!(no_feedback.status(), StatusCode::BAD_REQUEST);

    let rejected = data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/action-reviews/{action_id}/reject"),
            json!({ "feedback": "No evidence of recalibration" }),
            &a.owner,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(rejected["action"]["status_id"], ActionStatus::Rejected.id());
    assert_eq!(rejected["action"]["progress_percent"], 0);
    assert_eq!(rejected["action"]["review_feedback"], "No evidence of recalibration");

    // Progress cannot be reported on a rejected action until it is resubmitted.
    let blocked = put_json_auth(
        app.clone(),
        &format!("/api/v1/actions/{action_id}/progress"),
        json!({ "progress_percent": 10 }),
        &a.staff,
    )
    .await;
    assert_eq!(blocked.status(), StatusCode::CONFLICT);

    let reopened = data(
        post_json_auth(app.clone(), &format!("/api/v1/actions/{action_id}/resubmit"), json!({}), &a.staff).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(reopened["status_id"], ActionStatus::Open.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn higher_level_requires_first_level_review(pool: PgPool) {
    let a = actors(&pool).await;
    let app = common::build_test_app(pool);
    let (finding_id, action_id) = assigned_action(&app, &a).await;

    let early = post_json_auth(
        app.clone(),
        &format!("/api/v1/action-reviews/{action_id}/approve/higher-level"),
        json!({}),
        &a.lead,
    )
    .await;
    assert_eq!(early.status(), StatusCode::CONFLICT);

    // Auditee owners cannot act at the higher level.
    let wrong_role = post_json_auth(
        app.clone(),
        &format!("/api/v1/action-reviews/{action_id}/approve/higher-level"),
        json!({}),
        &a.owner,
    )
    .await;
    assert_eq!(wrong_role.status(), StatusCode::FORBIDDEN);

    post_json_auth(app.clone(), &format!("/api/v1/action-reviews/{action_id}/approve"), json!({}), &a.owner).await;
    let returned = data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/action-reviews/{action_id}/returned/higher-level"),
            json!({ "feedback": "Attach the calibration certificate" }),
            &a.lead,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(returned["action"]["status_id"], ActionStatus::Returned.id());
    assert_eq!(returned["finding_closed"], false);

    // The finding stays open for work and cannot be closed by hand yet.
    let close = post_json_auth(app, &format!("/api/v1/findings/{finding_id}/close"), json!({}), &a.lead).await;
    assert_eq!(close.status(), StatusCode::CONFLICT);
}

/// Take an assigned action through both review levels.
async fn approve_both_levels(app: &Router, a: &Actors, action_id: DbId) -> Value {
    data(
        post_json_auth(app.clone(), &format!("/api/v1/action-reviews/{action_id}/approve"), json!({}), &a.owner).await,
        StatusCode::OK,
    )
    .await;
    data(
        post_json_auth(
            app.clone(),
            &format!("/api/v1/action-reviews/{action_id}/approve/higher-level"),
            json!({}),
            &a.lead,
        )
        .await,
        StatusCode::OK,
    )
    .await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn closed_finding_refuses_action_rejection(pool: PgPool) {
    let a = actors(&pool).await;
    let app = common::build_test_app(pool);
    let (finding_id, action_id) = assigned_action(&app, &a).await;

    let approved = approve_both_levels(&app, &a, action_id).await;
    assert_eq!(approved["finding_closed"], true);

    let reject = post_json_auth(
        app.clone(),
        &format!("/api/v1/action-reviews/{action_id}/reject/higher-level"),
        json!({ "feedback": "Certificate belongs to another wrench" }),
        &a.lead,
    )
    .await;
    assert_eq!(reject.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(reject).await["code"], "CONFLICT");

    // Nothing moved: the action stays approved and the finding closed.
    let action = data(
        get_auth(app.clone(), &format!("/api/v1/actions/{action_id}"), &a.staff).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(action["status_id"], ActionStatus::Approved.id());
    let finding = data(
        get_auth(app.clone(), &format!("/api/v1/findings/{finding_id}"), &a.lead).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(finding["status_id"], FindingStatus::Closed.id());

    let resubmit =
        post_json_auth(app, &format!("/api/v1/actions/{action_id}/resubmit"), json!({}), &a.staff).await;
    assert_eq!(resubmit.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn late_root_cause_keeps_finding_open(pool: PgPool) {
    let a = actors(&pool).await;
    let app = common::build_test_app(pool);
    let (finding_id, action_id) = assigned_action(&app, &a).await;

    // A second root cause arrives while the action is under review.
    let late_rc = propose_root_cause(&app, &a, finding_id).await;

    let approved = approve_both_levels(&app, &a, action_id).await;
    assert_eq!(approved["action"]["status_id"], ActionStatus::Approved.id());
    assert_eq!(approved["finding_closed"], false);

    let readiness = data(
        get_auth(app.clone(), &format!("/api/v1/findings/{finding_id}/readiness"), &a.lead).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(readiness["readiness"], "PendingReview");

    let early = post_json_auth(app.clone(), &format!("/api/v1/findings/{finding_id}/close"), json!({}), &a.lead).await;
    assert_eq!(early.status(), StatusCode::CONFLICT);

    post_json_auth(app.clone(), &format!("/api/v1/root-causes/{late_rc}/approve"), json!({}), &a.auditor).await;
    let closed = data(
        post_json_auth(app, &format!("/api/v1/findings/{finding_id}/close"), json!({}), &a.lead).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(closed["status_id"], FindingStatus::Closed.id());
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn evidence_upload_download_and_deactivate(pool: PgPool) {
    let a = actors(&pool).await;
    let app = common::build_test_app(pool);
    let audit_id = create_audit(&app, &a).await;
    let finding_id = create_finding(&app, &a, audit_id, None).await["id"].as_i64().unwrap();

    let rejected_type = upload_file(app.clone(), &a.auditor, "Finding", finding_id, "payload.exe", b"MZ").await;
    assert_eq!(rejected_type.status(), StatusCode::BAD_REQUEST);

    let missing_parent = upload_file(app.clone(), &a.auditor, "Finding", 999_999, "photo.png", b"png").await;
    assert_eq!(missing_parent.status(), StatusCode::NOT_FOUND);

    let too_big = vec![b'x'; 1024 * 1024 + 1];
    let oversized = upload_file(app.clone(), &a.auditor, "Finding", finding_id, "big.txt", &too_big).await;
    assert_eq!(oversized.status(), StatusCode::BAD_REQUEST);

    let uploaded = data(
        upload_file(app.clone(), &a.auditor, "Finding", finding_id, "../notes.txt", b"wrench #4471").await,
        StatusCode::CREATED,
    )
    .await;
    assert_eq!(uploaded["file_name"], "notes.txt");
    assert_eq!(uploaded["file_size"], 12);
    let id = uploaded["id"].as_i64().unwrap();

    let download = get_auth(app.clone(), &format!("/api/v1/attachments/{id}/download"), &a.owner).await;
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(download.headers()["content-type"], "text/plain");
    assert!(download.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("notes.txt"));
    assert_eq!(body_bytes(download).await, b"wrench #4471");

    // Only the uploader or an admin may deactivate.
    let forbidden = common::delete_auth(app.clone(), &format!("/api/v1/attachments/{id}"), &a.owner).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    let removed = common::delete_auth(app.clone(), &format!("/api/v1/attachments/{id}"), &a.auditor).await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let listed = data(
        get_auth(
            app.clone(),
            &format!("/api/v1/attachments?parent_type=Finding&parent_id={finding_id}"),
            &a.owner,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert!(listed.as_array().unwrap().is_empty());

    let with_inactive = data(
        get_auth(
            app,
            &format!("/api/v1/attachments?parent_type=Finding&parent_id={finding_id}&include_inactive=true"),
            &a.owner,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(with_inactive[0]["status_id"], AttachmentStatus::Inactive.id());
}
