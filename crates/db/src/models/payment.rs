//! Payment proof models.

use enroll_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `payment_proofs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PaymentProof {
    pub id: Uuid,
    pub transaction_id: String,
    pub payment_method: String,
    pub amount: Decimal,
    pub payer_name: String,
    pub payer_contact: String,
    pub screenshot_path: Option<String>,
    pub notes: String,
    pub status: String,
    pub application_id: Option<Uuid>,
    pub verified_by: Option<DbId>,
    pub verified_at: Option<Timestamp>,
    pub rejection_reason: String,
    pub submitted_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a newly submitted payment proof.
#[derive(Debug, Clone)]
pub struct CreatePaymentProof {
    pub transaction_id: String,
    pub payment_method: String,
    pub amount: Decimal,
    pub payer_name: String,
    pub payer_contact: String,
    pub screenshot_path: Option<String>,
    pub notes: String,
    pub application_id: Option<Uuid>,
}

/// Query parameters for the admin payment list endpoint. `search` matches
/// against the transaction reference and the payer name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub search: Option<String>,
}

/// Request body for the rejection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectPaymentRequest {
    pub reason: String,
}
