//! Route definitions for agent onboarding.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::agents;
use crate::state::AppState;

/// Agent routes, nested under `/agents`.
///
/// ```text
/// POST   /applications              submit (public, captcha-gated)
/// GET    /applications              list (admin)
/// GET    /applications/{id}         get (admin)
/// PATCH  /applications/{id}/review  review decision (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/applications",
            post(agents::submit_agent_application).get(agents::list_agents),
        )
        .route("/applications/{id}", get(agents::get_agent))
        .route("/applications/{id}/review", patch(agents::review_agent))
}
