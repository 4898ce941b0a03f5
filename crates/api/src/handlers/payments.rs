//! Handlers for payment proof submission, lookup, and administrator
//! verification.

use std::str::FromStr;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use enroll_core::error::CoreError;
use enroll_core::status::PaymentStatus;
use enroll_core::types::Timestamp;
use enroll_core::validation::{check_phone, check_upload, FieldErrors, DOCUMENT_EXTENSIONS};
use enroll_db::models::payment::{CreatePaymentProof, PaymentFilter, PaymentProof, RejectPaymentRequest};
use enroll_db::repositories::PaymentRepo;

use crate::error::{AppError, AppResult};
use crate::intake::read_form;
use crate::middleware::auth::AuthUser;
use crate::response::Envelope;
use crate::state::AppState;

/// Accepted payment channels.
const PAYMENT_METHODS: &[&str] = &["touch-n-go", "bkash", "bank-transfer"];

/// Receipt payload returned after submission and on status lookups.
#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub id: Uuid,
    pub transaction_id: String,
    pub payment_method: String,
    pub amount: Decimal,
    pub payer_name: String,
    pub status: String,
    pub submitted_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub rejection_reason: String,
}

impl From<PaymentProof> for PaymentReceipt {
    fn from(proof: PaymentProof) -> Self {
        Self {
            id: proof.id,
            transaction_id: proof.transaction_id,
            payment_method: proof.payment_method,
            amount: proof.amount,
            payer_name: proof.payer_name,
            status: proof.status,
            submitted_at: proof.submitted_at,
            verified_at: proof.verified_at,
            rejection_reason: proof.rejection_reason,
        }
    }
}

/// POST /api/v1/payments/proofs
///
/// Public multipart submission: transaction reference, channel, amount, and
/// an optional screenshot. Duplicate transaction IDs map to 409 via the
/// unique constraint.
pub async fn submit_payment_proof(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (form, files) = read_form(multipart).await?;

    let mut errors = FieldErrors::new();

    let transaction_id = form.text("transactionId").unwrap_or("").trim().to_string();
    if transaction_id.is_empty() {
        errors.add("transactionId", "This field is required");
    }

    let payment_method = form.text("paymentMethod").unwrap_or("").trim().to_string();
    if payment_method.is_empty() {
        errors.add("paymentMethod", "This field is required");
    } else if !PAYMENT_METHODS.contains(&payment_method.as_str()) {
        errors.add(
            "paymentMethod",
            format!(
                "Unknown payment method: {payment_method}. Allowed: {}",
                PAYMENT_METHODS.join(", ")
            ),
        );
    }

    let amount = match form.text("amount") {
        None => {
            errors.add("amount", "This field is required");
            None
        }
        Some(raw) => match Decimal::from_str(raw.trim()) {
            Ok(value) if value > Decimal::ZERO => Some(value),
            Ok(_) => {
                errors.add("amount", "Amount must be greater than zero");
                None
            }
            Err(_) => {
                errors.add("amount", format!("Amount is not a valid number: {raw}"));
                None
            }
        },
    };

    let payer_name = form.text("payerName").unwrap_or("").trim().to_string();
    if payer_name.is_empty() {
        errors.add("payerName", "This field is required");
    }

    let payer_contact = form.text("payerContact").unwrap_or("").trim().to_string();
    if payer_contact.is_empty() {
        errors.add("payerContact", "This field is required");
    } else {
        check_phone(&mut errors, "payerContact", &payer_contact, 8);
    }

    if let Some(meta) = form.file("screenshot") {
        check_upload(&mut errors, "screenshot", meta, DOCUMENT_EXTENSIONS);
    }

    let application_id = match form.text("applicationId") {
        None => None,
        Some(raw) => match Uuid::parse_str(raw.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("applicationId", format!("Not a valid application id: {raw}"));
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let amount =
        amount.ok_or_else(|| AppError::InternalError("amount missing after validation".into()))?;

    let screenshot_path = match (form.file("screenshot"), files.get("screenshot")) {
        (Some(meta), Some(bytes)) => Some(
            state
                .storage
                .store("payments/screenshots", &meta.filename, bytes)
                .await
                .map_err(|e| AppError::InternalError(format!("Failed to store screenshot: {e}")))?,
        ),
        _ => None,
    };

    let input = CreatePaymentProof {
        transaction_id,
        payment_method,
        amount,
        payer_name,
        payer_contact,
        screenshot_path,
        notes: form.text("notes").unwrap_or("").trim().to_string(),
        application_id,
    };

    let created = match PaymentRepo::create(&state.pool, &input).await {
        Ok(created) => created,
        Err(err) => {
            // A duplicate transaction id leaves the stored screenshot orphaned.
            if let Some(path) = &input.screenshot_path {
                state.storage.discard(std::slice::from_ref(path)).await;
            }
            return Err(err.into());
        }
    };

    tracing::info!(
        payment_id = %created.id,
        transaction_id = %created.transaction_id,
        method = %created.payment_method,
        "Payment proof submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(
            "Payment proof submitted successfully",
            PaymentReceipt::from(created),
        )),
    ))
}

/// GET /api/v1/payments/proofs
pub async fn list_payments(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<PaymentFilter>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    let proofs = PaymentRepo::list(
        &state.pool,
        filter.status.as_deref(),
        filter.payment_method.as_deref(),
        filter.search.as_deref(),
    )
    .await?;
    Ok(Json(Envelope::ok("Payment proofs retrieved", proofs)))
}

/// GET /api/v1/payments/proofs/{id}
pub async fn get_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    let proof = find_payment(&state, id).await?;
    Ok(Json(Envelope::ok("Payment proof retrieved", proof)))
}

/// GET /api/v1/payments/proofs/status/{transaction_id}
///
/// Public status lookup by transaction reference.
pub async fn payment_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let proof = PaymentRepo::find_by_transaction_id(&state.pool, transaction_id.trim())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "PaymentProof",
                id: transaction_id.clone(),
            })
        })?;
    Ok(Json(Envelope::ok(
        "Payment status retrieved",
        PaymentReceipt::from(proof),
    )))
}

/// POST /api/v1/payments/proofs/{id}/verify
///
/// Mark a pending proof as verified. Decisions are final: a verified or
/// rejected proof cannot be decided again.
pub async fn verify_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;

    let current = find_payment(&state, id).await?;
    PaymentStatus::parse(&current.status)?.check_decision()?;

    let updated = PaymentRepo::verify(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Payment proof was decided concurrently".into(),
            ))
        })?;

    tracing::info!(
        payment_id = %id,
        verified_by = auth.user_id,
        "Payment proof verified"
    );

    Ok(Json(Envelope::ok("Payment verified", updated)))
}

/// POST /api/v1/payments/proofs/{id}/reject
pub async fn reject_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<RejectPaymentRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;

    if input.reason.trim().is_empty() {
        let mut errors = FieldErrors::new();
        errors.add("reason", "A rejection reason is required");
        return Err(AppError::Validation(errors));
    }

    let current = find_payment(&state, id).await?;
    PaymentStatus::parse(&current.status)?.check_decision()?;

    let updated = PaymentRepo::reject(&state.pool, id, auth.user_id, input.reason.trim())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Payment proof was decided concurrently".into(),
            ))
        })?;

    tracing::info!(
        payment_id = %id,
        rejected_by = auth.user_id,
        "Payment proof rejected"
    );

    Ok(Json(Envelope::ok("Payment rejected", updated)))
}

async fn find_payment(state: &AppState, id: Uuid) -> AppResult<PaymentProof> {
    PaymentRepo::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "PaymentProof",
            id: id.to_string(),
        })
    })
}
