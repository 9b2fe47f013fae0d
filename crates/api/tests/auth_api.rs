//! HTTP-level integration tests for login, the current-user endpoint,
//! role enforcement and admin user management.

mod common;

use aqms_api::auth::password::hash_password;
use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json, post_json_auth};
use serde_json::json;
use sqlx::PgPool;

const PASSWORD: &str = "correct-horse-battery";

async fn create_login_user(pool: &PgPool, email: &str, role: &str) -> i64 {
    let dept_id = common::create_department(pool, "QA").await;
    let hash = hash_password(PASSWORD).expect("hashing should succeed");
    common::create_user_with_hash(pool, email, role, Some(dept_id), hash).await
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_returns_token_and_profile(pool: PgPool) {
    let user_id = create_login_user(&pool, "lead@example.com", "lead_auditor").await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/auth/login",
        json!({ "email": "lead@example.com", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["expires_in"], 3600);
    assert_eq!(json["user"]["id"], user_id);
    assert_eq!(json["user"]["role"], "lead_auditor");

    // The issued token works against an authenticated endpoint.
    let token = json["access_token"].as_str().unwrap();
    let me = get_auth(app, "/api/v1/auth/me", token).await;
    assert_eq!(me.status(), StatusCode::OK);
    let me = body_json(me).await;
    assert_eq!(me["data"]["email"], "lead@example.com");
    assert!(!me["data"]["last_login_at"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_with_wrong_password_returns_401(pool: PgPool) {
    create_login_user(&pool, "auditor@example.com", "auditor").await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": "auditor@example.com", "password": "not-the-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_with_unknown_email_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": "nobody@example.com", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inactive_user_cannot_log_in(pool: PgPool) {
    let user_id = create_login_user(&pool, "gone@example.com", "auditor").await;
    sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "email": "gone@example.com", "password": PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Token and role enforcement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_returns_401() {
    let app = common::build_lazy_app();

    let response = get(app, "/api/v1/findings").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_returns_401() {
    let app = common::build_lazy_app();

    let response = get_auth(app, "/api/v1/audits", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_secret_returns_401() {
    let app = common::build_lazy_app();
    let foreign = aqms_api::auth::jwt::generate_access_token(
        1,
        "admin",
        None,
        &aqms_api::auth::jwt::JwtConfig {
            secret: "some-other-secret".to_string(),
            access_token_expiry_mins: 60,
        },
    )
    .unwrap();

    let response = get_auth(app, "/api/v1/admin/users", &foreign).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_role_returns_403() {
    let app = common::build_lazy_app();
    let staff_token = common::token_for(7, "capa_owner", Some(1));

    // Only admins manage users.
    let response = get_auth(app.clone(), "/api/v1/admin/users", &staff_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");

    // Only directors, lead auditors and admins read reports.
    let response = get_auth(app.clone(), "/api/v1/reports/summary", &staff_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Only lead auditors act at the higher review level.
    let owner_token = common::token_for(8, "auditee_owner", Some(1));
    let response = post_json_auth(
        app,
        "/api/v1/action-reviews/1/approve/higher-level",
        json!({}),
        &owner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Admin user management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_creates_user_who_can_log_in(pool: PgPool) {
    let dept_id = common::create_department(&pool, "OPS").await;
    let (_, admin_token) = common::create_user(&pool, "admin@example.com", "admin", None).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/admin/users",
        json!({
            "email": "owner@example.com",
            "full_name": "Ops Owner",
            "password": PASSWORD,
            "role": "auditee_owner",
            "dept_id": dept_id,
        }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["role"], "auditee_owner");
    assert_eq!(created["data"]["dept_id"], dept_id);
    assert!(created["data"].get("password_hash").is_none());

    let login = post_json(
        app.clone(),
        "/api/v1/auth/login",
        json!({ "email": "owner@example.com", "password": PASSWORD }),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);

    // Same email again violates uq_users_email.
    let duplicate = post_json_auth(
        app,
        "/api/v1/admin/users",
        json!({
            "email": "owner@example.com",
            "full_name": "Someone Else",
            "password": PASSWORD,
            "role": "capa_owner",
            "dept_id": dept_id,
        }),
        &admin_token,
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn weak_password_and_unknown_role_are_rejected(pool: PgPool) {
    let (_, admin_token) = common::create_user(&pool, "admin@example.com", "admin", None).await;
    let app = common::build_test_app(pool);

    let weak = post_json_auth(
        app.clone(),
        "/api/v1/admin/users",
        json!({ "email": "a@example.com", "full_name": "A", "password": "short", "role": "auditor" }),
        &admin_token,
    )
    .await;
    assert_eq!(weak.status(), StatusCode::BAD_REQUEST);

    let unknown_role = post_json_auth(
        app,
        "/api/v1/admin/users",
        json!({ "email": "b@example.com", "full_name": "B", "password": PASSWORD, "role": "pilot" }),
        &admin_token,
    )
    .await;
    assert_eq!(unknown_role.status(), StatusCode::BAD_REQUEST);
}
