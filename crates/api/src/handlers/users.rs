//! Handlers for user accounts: registration, profile, and admin management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use enroll_core::error::CoreError;
use enroll_core::types::DbId;
use enroll_core::validation::{check_password_pair, FieldErrors};
use enroll_db::models::user::{CreateUser, UpdateUserProfile, User};
use enroll_db::repositories::UserRepo;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::Envelope;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// POST /api/v1/users/register
///
/// Public registration. New accounts always get the `user` role; admin
/// accounts are provisioned out-of-band.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let mut errors = FieldErrors::new();

    if input.username.trim().is_empty() {
        errors.add("username", "This field is required");
    }
    if input.email.trim().is_empty() {
        errors.add("email", "This field is required");
    } else if !input.email.contains('@') {
        errors.add("email", "Not a valid email address");
    }
    check_password_pair(&mut errors, &input.password, &input.confirm_password);

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let created = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            password_hash,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            phone: input.phone,
            role: "user".to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = created.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Registration successful", created)),
    ))
}

/// GET /api/v1/users
pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    let users = UserRepo::list_active(&state.pool).await?;
    Ok(Json(Envelope::ok("Users retrieved", users)))
}

/// GET /api/v1/users/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = find_user(&state, auth.user_id).await?;
    Ok(Json(Envelope::ok("Profile retrieved", user)))
}

/// PATCH /api/v1/users/me
///
/// Partial profile update; absent fields keep their current values.
pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateUserProfile>,
) -> AppResult<impl IntoResponse> {
    if let Some(email) = &input.email {
        if !email.contains('@') {
            let mut errors = FieldErrors::new();
            errors.add("email", "Not a valid email address");
            return Err(AppError::Validation(errors));
        }
    }

    let updated = UserRepo::update_profile(&state.pool, auth.user_id, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "User",
                id: auth.user_id.to_string(),
            })
        })?;
    Ok(Json(Envelope::ok("Profile updated", updated)))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    let user = find_user(&state, id).await?;
    Ok(Json(Envelope::ok("User retrieved", user)))
}

/// POST /api/v1/users/{id}/deactivate
///
/// Soft-deactivate an account. Idempotent at the database level; a missing
/// user yields 404.
pub async fn deactivate_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    find_user(&state, id).await?;
    UserRepo::deactivate(&state.pool, id).await?;
    tracing::info!(user_id = id, by = auth.user_id, "User deactivated");
    Ok(Json(Envelope::message("User deactivated")))
}

async fn find_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "User",
            id: id.to_string(),
        })
    })
}
