//! Repository for the `payment_proofs` table.

use enroll_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::payment::{CreatePaymentProof, PaymentProof};

/// Column list for payment_proofs queries.
const PAYMENT_COLUMNS: &str = "id, transaction_id, payment_method, amount, payer_name, \
    payer_contact, screenshot_path, notes, status, application_id, verified_by, verified_at, \
    rejection_reason, submitted_at, updated_at";

/// Provides CRUD operations for payment proofs.
pub struct PaymentRepo;

impl PaymentRepo {
    /// Record a newly submitted payment proof, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePaymentProof,
    ) -> Result<PaymentProof, sqlx::Error> {
        let query = format!(
            "INSERT INTO payment_proofs
                (transaction_id, payment_method, amount, payer_name, payer_contact,
                 screenshot_path, notes, application_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PAYMENT_COLUMNS}"
        );
        sqlx::query_as::<_, PaymentProof>(&query)
            .bind(&input.transaction_id)
            .bind(&input.payment_method)
            .bind(input.amount)
            .bind(&input.payer_name)
            .bind(&input.payer_contact)
            .bind(&input.screenshot_path)
            .bind(&input.notes)
            .bind(input.application_id)
            .fetch_one(pool)
            .await
    }

    /// Find a payment proof by its ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<PaymentProof>, sqlx::Error> {
        let query = format!("SELECT {PAYMENT_COLUMNS} FROM payment_proofs WHERE id = $1");
        sqlx::query_as::<_, PaymentProof>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a payment proof by its transaction reference.
    pub async fn find_by_transaction_id(
        pool: &PgPool,
        transaction_id: &str,
    ) -> Result<Option<PaymentProof>, sqlx::Error> {
        let query =
            format!("SELECT {PAYMENT_COLUMNS} FROM payment_proofs WHERE transaction_id = $1");
        sqlx::query_as::<_, PaymentProof>(&query)
            .bind(transaction_id)
            .fetch_optional(pool)
            .await
    }

    /// List payment proofs, newest first, optionally filtered by status,
    /// payment method, and a case-insensitive search over the transaction
    /// reference and payer name.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        payment_method: Option<&str>,
        search: Option<&str>,
    ) -> Result<Vec<PaymentProof>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment_proofs
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::text IS NULL OR payment_method = $2)
               AND ($3::text IS NULL
                    OR transaction_id ILIKE '%' || $3 || '%'
                    OR payer_name ILIKE '%' || $3 || '%')
             ORDER BY submitted_at DESC"
        );
        sqlx::query_as::<_, PaymentProof>(&query)
            .bind(status)
            .bind(payment_method)
            .bind(search)
            .fetch_all(pool)
            .await
    }

    /// Mark a pending payment proof as verified. Returns `None` when the
    /// proof does not exist or has already been decided.
    pub async fn verify(
        pool: &PgPool,
        id: Uuid,
        verified_by: DbId,
    ) -> Result<Option<PaymentProof>, sqlx::Error> {
        let query = format!(
            "UPDATE payment_proofs
             SET status = 'verified', verified_by = $2, verified_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {PAYMENT_COLUMNS}"
        );
        sqlx::query_as::<_, PaymentProof>(&query)
            .bind(id)
            .bind(verified_by)
            .fetch_optional(pool)
            .await
    }

    /// Mark a pending payment proof as rejected. Returns `None` when the
    /// proof does not exist or has already been decided.
    pub async fn reject(
        pool: &PgPool,
        id: Uuid,
        verified_by: DbId,
        reason: &str,
    ) -> Result<Option<PaymentProof>, sqlx::Error> {
        let query = format!(
            "UPDATE payment_proofs
             SET status = 'rejected', verified_by = $2, verified_at = NOW(),
                 rejection_reason = $3, updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {PAYMENT_COLUMNS}"
        );
        sqlx::query_as::<_, PaymentProof>(&query)
            .bind(id)
            .bind(verified_by)
            .bind(reason)
            .fetch_optional(pool)
            .await
    }
}
