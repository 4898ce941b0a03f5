//! Staff login handler issuing JWT access tokens.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use enroll_core::error::CoreError;
use enroll_db::models::user::User;
use enroll_db::repositories::UserRepo;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::response::Envelope;
use crate::state::AppState;

/// Login request body: username or email plus password.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Login response payload.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/v1/auth/login
///
/// Authenticate by username or email. Inactive accounts and wrong
/// credentials both yield 401 without distinguishing the cause.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let identifier = input.identifier.trim();

    let user = match UserRepo::find_by_username(&state.pool, identifier).await? {
        Some(user) => Some(user),
        None => UserRepo::find_by_email(&state.pool, identifier).await?,
    };

    let Some(user) = user else {
        return Err(invalid_credentials());
    };

    let verified = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
    if !verified || !user.is_active {
        return Err(invalid_credentials());
    }

    let token = generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(Json(Envelope::ok(
        "Login successful",
        LoginResponse { token, user },
    )))
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid credentials or inactive account".into(),
    ))
}
