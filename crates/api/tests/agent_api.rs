//! HTTP-level tests for agent onboarding and review.
//!
//! The test config disables the captcha provider, so submissions go
//! straight to validation.

mod common;

use axum::http::StatusCode;
use axum::Router;
use sqlx::PgPool;

use common::{
    admin_token, body_json, build_test_app, build_test_app_with_uploads, count_files, get_auth,
    patch_json_auth, post_multipart, MultipartForm,
};

fn valid_form(agent_id: &str) -> MultipartForm {
    MultipartForm::new()
        .text("agentId", agent_id)
        .text("applicantRole", "FO")
        .text("fullName", "Karim Ahmed")
        .text("email", "karim@example.com")
        .text("phone", "+8801712345678")
        .text("presentAddress", "House 12, Road 5, Dhaka")
        .text("permanentAddress", "Village Rampur, Comilla")
        .text("dob", "1992-08-20")
        .text("nidNumber", "1992123456789")
        .text("password", "correct-horse-battery")
        .text("confirmPassword", "correct-horse-battery")
        .text("agreeTerms", "true")
        .file("applicantPhoto", "karim.jpg", "image/jpeg", b"photo bytes")
        .file("nidDocument", "nid.pdf", "application/pdf", b"nid bytes")
        .file(
            "educationCertificate",
            "hsc.pdf",
            "application/pdf",
            b"certificate bytes",
        )
}

async fn submit(app: &Router, form: MultipartForm) -> serde_json::Value {
    let response = post_multipart(app.clone(), "/api/v1/agents/applications", form).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_returns_pending_receipt(pool: PgPool) {
    let app = build_test_app(pool);

    let body = submit(&app, valid_form("AG-1001")).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["agent_id"], "AG-1001");
    assert_eq!(body["data"]["status"], "pending");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_agent_id_is_a_conflict(pool: PgPool) {
    let app = build_test_app(pool);

    submit(&app, valid_form("AG-1001")).await;
    let response = post_multipart(
        app,
        "/api/v1/agents/applications",
        valid_form("AG-1001").text("email", "other@example.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rejected_duplicate_leaves_no_files_behind(pool: PgPool) {
    let (app, upload_dir) = build_test_app_with_uploads(pool);

    submit(&app, valid_form("AG-1001")).await;
    assert_eq!(count_files(&upload_dir), 3);

    let response = post_multipart(
        app,
        "/api/v1/agents/applications",
        valid_form("AG-1001").text("email", "other@example.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Only the first submission's photo, NID, and certificate remain.
    assert_eq!(count_files(&upload_dir), 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_documents_and_weak_password_reported_together(pool: PgPool) {
    let app = build_test_app(pool);

    let form = MultipartForm::new()
        .text("agentId", "AG-1001")
        .text("fullName", "Karim Ahmed")
        .text("password", "short")
        .text("confirmPassword", "different");
    let response = post_multipart(app, "/api/v1/agents/applications", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let errors = body["errors"].as_object().unwrap();
    assert!(errors.contains_key("applicant_role"));
    assert!(errors.contains_key("applicantPhoto"));
    assert!(errors.contains_key("nidDocument"));
    assert!(errors.contains_key("educationCertificate"));
    assert!(errors.contains_key("password"));
    assert!(errors.contains_key("confirmPassword"));
    assert!(errors.contains_key("agreeTerms"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn password_hash_never_leaves_the_api(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let token = admin_token(&pool).await;

    let body = submit(&app, valid_form("AG-1001")).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = get_auth(app, &format!("/api/v1/agents/applications/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["full_name"], "Karim Ahmed");
    assert!(body["data"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn review_records_decision_and_reviewer(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let token = admin_token(&pool).await;

    let body = submit(&app, valid_form("AG-1001")).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = patch_json_auth(
        app,
        &format!("/api/v1/agents/applications/{id}/review"),
        &token,
        serde_json::json!({ "status": "approved", "notes": "References checked" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["notes"], "References checked");
    assert!(body["data"]["reviewed_by"]
        .as_str()
        .unwrap()
        .starts_with("user:"));
    assert!(body["data"]["reviewed_at"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rejected_applications_are_terminal(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let token = admin_token(&pool).await;

    let body = submit(&app, valid_form("AG-1001")).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let review_uri = format!("/api/v1/agents/applications/{id}/review");

    let response = patch_json_auth(
        app.clone(),
        &review_uri,
        &token,
        serde_json::json!({ "status": "rejected", "notes": "Incomplete documents" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = patch_json_auth(
        app,
        &review_uri,
        &token,
        serde_json::json!({ "status": "approved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_filters_by_status(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let token = admin_token(&pool).await;

    submit(&app, valid_form("AG-1001")).await;
    submit(
        &app,
        valid_form("AG-1002").text("email", "second@example.com"),
    )
    .await;

    let response = get_auth(app.clone(), "/api/v1/agents/applications", &token).await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let response = get_auth(app, "/api/v1/agents/applications?status=approved", &token).await;
    let body = body_json(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}
