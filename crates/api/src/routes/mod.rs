pub mod agents;
pub mod auth;
pub mod health;
pub mod membership;
pub mod payments;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      staff login (public)
///
/// /membership/applications                         submit (public), list (admin)
/// /membership/applications/statistics              aggregate counts (admin)
/// /membership/applications/{id}                    detail (admin)
/// /membership/applications/{id}/status             transition (admin, PATCH)
/// /membership/applications/{id}/history            status history (admin)
/// /membership/login                                member lookup (public)
///
/// /agents/applications                             submit (public), list (admin)
/// /agents/applications/{id}                        detail (admin)
/// /agents/applications/{id}/review                 review decision (admin, PATCH)
///
/// /payments/proofs                                 submit (public), list (admin)
/// /payments/proofs/status/{transaction_id}         status lookup (public)
/// /payments/proofs/{id}                            detail (admin)
/// /payments/proofs/{id}/verify                     verify (admin, POST)
/// /payments/proofs/{id}/reject                     reject (admin, POST)
///
/// /users/register                                  register (public)
/// /users                                           list (admin)
/// /users/me                                        own profile (GET, PATCH)
/// /users/{id}                                      get (admin)
/// /users/{id}/deactivate                           deactivate (admin, POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/membership", membership::router())
        .nest("/agents", agents::router())
        .nest("/payments", payments::router())
        .nest("/users", users::router())
}
