//! HTTP-level tests for payment proof submission and verification.

mod common;

use axum::http::StatusCode;
use axum::Router;
use sqlx::PgPool;

use common::{
    admin_token, body_json, build_test_app, get, get_auth, post_auth, post_json_auth,
    post_multipart, MultipartForm,
};

fn proof_form(transaction_id: &str) -> MultipartForm {
    MultipartForm::new()
        .text("transactionId", transaction_id)
        .text("paymentMethod", "bkash")
        .text("amount", "1500.00")
        .text("payerName", "Rahim Uddin")
        .text("payerContact", "+8801712345678")
}

async fn submit(app: &Router, form: MultipartForm) -> serde_json::Value {
    let response = post_multipart(app.clone(), "/api/v1/payments/proofs", form).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submit_returns_pending_receipt(pool: PgPool) {
    let app = build_test_app(pool);

    let body = submit(&app, proof_form("TXN-1001")).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["transaction_id"], "TXN-1001");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["amount"], "1500.00");
    // Undecided proofs carry neither a verification time nor a reason.
    assert!(body["data"].get("verified_at").is_none());
    assert!(body["data"].get("rejection_reason").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_transaction_id_is_a_conflict(pool: PgPool) {
    let app = build_test_app(pool);

    submit(&app, proof_form("TXN-1001")).await;
    let response = post_multipart(app, "/api/v1/payments/proofs", proof_form("TXN-1001")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_fields_reported_together(pool: PgPool) {
    let app = build_test_app(pool);

    let form = MultipartForm::new()
        .text("paymentMethod", "cash")
        .text("amount", "-5")
        .text("payerContact", "123");
    let response = post_multipart(app, "/api/v1/payments/proofs", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let errors = body["errors"].as_object().unwrap();
    assert!(errors.contains_key("transactionId"));
    assert!(errors.contains_key("paymentMethod"));
    assert!(errors.contains_key("amount"));
    assert!(errors.contains_key("payerName"));
    assert!(errors.contains_key("payerContact"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn screenshot_is_stored_under_payments_category(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let token = admin_token(&pool).await;

    let form = proof_form("TXN-1001").file(
        "screenshot",
        "receipt.png",
        "image/png",
        b"fake screenshot bytes",
    );
    let body = submit(&app, form).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = get_auth(app, &format!("/api/v1/payments/proofs/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let path = body["data"]["screenshot_path"].as_str().unwrap();
    assert!(path.starts_with("payments/screenshots/"));
    assert!(path.ends_with(".png"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn public_status_lookup_by_transaction_id(pool: PgPool) {
    let app = build_test_app(pool);

    submit(&app, proof_form("TXN-1001")).await;

    let response = get(app.clone(), "/api/v1/payments/proofs/status/TXN-1001").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "pending");

    let response = get(app, "/api/v1/payments/proofs/status/TXN-MISSING").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn verify_stamps_reviewer_and_time(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let token = admin_token(&pool).await;

    let body = submit(&app, proof_form("TXN-1001")).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = post_auth(app, &format!("/api/v1/payments/proofs/{id}/verify"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "verified");
    assert!(body["data"]["verified_at"].is_string());
    assert!(body["data"]["verified_by"].is_i64());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn decisions_are_final(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let token = admin_token(&pool).await;

    let body = submit(&app, proof_form("TXN-1001")).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = post_auth(
        app.clone(),
        &format!("/api/v1/payments/proofs/{id}/verify"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // A second decision of either kind is refused.
    let response = post_auth(
        app.clone(),
        &format!("/api/v1/payments/proofs/{id}/verify"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app,
        &format!("/api/v1/payments/proofs/{id}/reject"),
        &token,
        serde_json::json!({ "reason": "too late" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reject_requires_a_reason(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let token = admin_token(&pool).await;

    let body = submit(&app, proof_form("TXN-1001")).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/payments/proofs/{id}/reject"),
        &token,
        serde_json::json!({ "reason": "   " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"]["reason"][0].is_string());

    let response = post_json_auth(
        app,
        &format!("/api/v1/payments/proofs/{id}/reject"),
        &token,
        serde_json::json!({ "reason": "Amount does not match the invoice" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(
        body["data"]["rejection_reason"],
        "Amount does not match the invoice"
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_filters_by_status_and_method(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let token = admin_token(&pool).await;

    submit(&app, proof_form("TXN-1001")).await;
    submit(&app, proof_form("TXN-1002").text("paymentMethod", "bank-transfer")).await;

    let response = get_auth(
        app.clone(),
        "/api/v1/payments/proofs?payment_method=bank-transfer",
        &token,
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = get_auth(app, "/api/v1/payments/proofs?status=verified", &token).await;
    let body = body_json(response).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_search_matches_transaction_and_payer(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let token = admin_token(&pool).await;

    submit(&app, proof_form("TXN-1001")).await;
    submit(&app, proof_form("REF-2002").text("payerName", "Bashir Ahmed")).await;

    let response = get_auth(app.clone(), "/api/v1/payments/proofs?search=txn-10", &token).await;
    let body = body_json(response).await;
    let matches = body["data"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["transaction_id"], "TXN-1001");

    let response = get_auth(app, "/api/v1/payments/proofs?search=bashir", &token).await;
    let body = body_json(response).await;
    let matches = body["data"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["transaction_id"], "REF-2002");
}
