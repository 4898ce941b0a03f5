//! Route definitions for payment proofs.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Payment routes, nested under `/payments`.
///
/// ```text
/// POST   /proofs                          submit (public)
/// GET    /proofs                          list (admin)
/// GET    /proofs/status/{transaction_id}  status lookup (public)
/// GET    /proofs/{id}                     get (admin)
/// POST   /proofs/{id}/verify              verify (admin)
/// POST   /proofs/{id}/reject              reject (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/proofs",
            post(payments::submit_payment_proof).get(payments::list_payments),
        )
        .route(
            "/proofs/status/{transaction_id}",
            get(payments::payment_status),
        )
        .route("/proofs/{id}", get(payments::get_payment))
        .route("/proofs/{id}/verify", post(payments::verify_payment))
        .route("/proofs/{id}/reject", post(payments::reject_payment))
}
