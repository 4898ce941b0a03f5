//! Shared helpers for HTTP-level integration tests.
//!
//! Builds the production router via [`build_app_router`] so tests exercise
//! the same middleware stack (CORS, request ID, timeout, tracing, panic
//! recovery) as `main.rs`, and provides request/response helpers on top of
//! `tower::ServiceExt`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use enroll_api::auth::jwt::{generate_access_token, JwtConfig};
use enroll_api::auth::password::hash_password;
use enroll_api::captcha::{CaptchaConfig, CaptchaProvider};
use enroll_api::config::ServerConfig;
use enroll_api::router::build_app_router;
use enroll_api::state::AppState;
use enroll_db::models::user::CreateUser;
use enroll_db::repositories::UserRepo;

/// JWT secret used by every test app instance.
pub const TEST_JWT_SECRET: &str = "integration-test-secret-not-for-production";

/// Build a test `ServerConfig` with safe defaults: captcha disabled, no
/// SMTP, uploads under a unique temp directory.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir: std::env::temp_dir().join(format!("enroll-test-{}", Uuid::new_v4())),
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 60,
        },
        captcha: CaptchaConfig {
            provider: CaptchaProvider::Disabled,
            secret: String::new(),
            score_threshold: 0.5,
        },
        email: None,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

/// Like [`build_test_app`], also returning the upload root so a test can
/// inspect what ended up on disk.
pub fn build_test_app_with_uploads(pool: PgPool) -> (Router, std::path::PathBuf) {
    let config = test_config();
    let upload_dir = config.upload_dir.clone();
    let state = AppState::new(pool, config.clone());
    (build_app_router(state, &config), upload_dir)
}

/// Count regular files under a directory, recursively. Zero if it does not
/// exist yet.
pub fn count_files(dir: &std::path::Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

/// Insert an admin user and return a valid bearer token for it.
pub async fn admin_token(pool: &PgPool) -> String {
    let hash = hash_password("admin-password-123").expect("hashing should succeed");
    let admin = UserRepo::create(
        pool,
        &CreateUser {
            username: format!("admin-{}", Uuid::new_v4()),
            email: format!("admin-{}@example.com", Uuid::new_v4()),
            password_hash: hash,
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            phone: None,
            role: "admin".to_string(),
        },
    )
    .await
    .expect("admin user insert should succeed");

    let config = test_config();
    generate_access_token(admin.id, "admin", &config.jwt).expect("token generation should succeed")
}

/// Insert a regular (non-admin) user and return a bearer token for it.
pub async fn user_token(pool: &PgPool) -> String {
    let hash = hash_password("user-password-123").expect("hashing should succeed");
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: format!("user-{}", Uuid::new_v4()),
            email: format!("user-{}@example.com", Uuid::new_v4()),
            password_hash: hash,
            first_name: String::new(),
            last_name: String::new(),
            phone: None,
            role: "user".to_string(),
        },
    )
    .await
    .expect("user insert should succeed");

    let config = test_config();
    generate_access_token(user.id, "user", &config.jwt).expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None, Body::empty()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None, Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        None,
        Some("application/json"),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None, Body::empty()).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Some(token),
        Some("application/json"),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        Method::PATCH,
        uri,
        Some(token),
        Some("application/json"),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn post_multipart(app: Router, uri: &str, form: MultipartForm) -> Response<Body> {
    let content_type = form.content_type();
    let body = form.finish();
    send(
        app,
        Method::POST,
        uri,
        None,
        Some(&content_type),
        Body::from(body),
    )
    .await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    content_type: Option<&str>,
    body: Body,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let request = builder.body(body).expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Decode a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

// ---------------------------------------------------------------------------
// Multipart body builder
// ---------------------------------------------------------------------------

/// Hand-rolled `multipart/form-data` body for submission tests.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("----test-boundary-{}", Uuid::new_v4()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}
