//! Route definitions for user accounts.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// User routes, nested under `/users`.
///
/// ```text
/// POST   /register           register (public)
/// GET    /                   list active users (admin)
/// GET    /me                 own profile (auth)
/// PATCH  /me                 update own profile (auth)
/// GET    /{id}               get user (admin)
/// POST   /{id}/deactivate    soft-deactivate (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/", get(users::list_users))
        .route("/me", get(users::me).patch(users::update_me))
        .route("/{id}", get(users::get_user))
        .route("/{id}/deactivate", post(users::deactivate_user))
}
