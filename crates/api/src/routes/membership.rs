//! Route definitions for the membership application workflow.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::membership;
use crate::state::AppState;

/// Membership routes, nested under `/membership`.
///
/// ```text
/// POST   /applications                   submit (public)
/// GET    /applications                   list (admin)
/// GET    /applications/statistics        statistics (admin)
/// GET    /applications/{id}              get (admin)
/// PATCH  /applications/{id}/status       update status (admin)
/// GET    /applications/{id}/history      status history (admin)
/// POST   /login                          member self-service lookup (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/applications",
            post(membership::submit_application).get(membership::list_applications),
        )
        .route("/applications/statistics", get(membership::statistics))
        .route("/applications/{id}", get(membership::get_application))
        .route("/applications/{id}/status", patch(membership::update_status))
        .route("/applications/{id}/history", get(membership::status_history))
        .route("/login", post(membership::member_login))
}
