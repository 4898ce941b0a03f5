//! Agent onboarding application models.

use chrono::NaiveDate;
use enroll_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `agent_applications` table.
///
/// The password hash never leaves the database layer in responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AgentApplication {
    pub id: Uuid,
    pub agent_id: String,
    pub applicant_role: String,

    pub fm_name: String,
    pub role_code: String,
    pub dgm_name: String,
    pub dgm_code: String,
    pub gm_name: String,
    pub gm_code: String,

    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub guardian_name: String,
    pub mother_name: String,
    pub present_address: String,
    pub permanent_address: String,
    pub dob: NaiveDate,
    pub birth_place: String,
    pub nid_number: String,

    pub bank_account_number: String,
    pub bank_name: String,
    pub bank_branch_name: String,

    pub applicant_photo_path: String,
    pub nid_document_path: String,
    pub education_certificate_path: String,

    #[serde(skip_serializing)]
    pub password_hash: String,
    pub agree_terms: bool,

    pub status: String,
    pub reviewed_by: String,
    pub reviewed_at: Option<Timestamp>,
    pub notes: String,

    pub submitted_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new agent application. The handler hashes the
/// password before handing the DTO to the repository.
#[derive(Debug, Clone, Default)]
pub struct CreateAgentApplication {
    pub agent_id: String,
    pub applicant_role: String,

    pub fm_name: String,
    pub role_code: String,
    pub dgm_name: String,
    pub dgm_code: String,
    pub gm_name: String,
    pub gm_code: String,

    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub guardian_name: String,
    pub mother_name: String,
    pub present_address: String,
    pub permanent_address: String,
    pub dob: NaiveDate,
    pub birth_place: String,
    pub nid_number: String,

    pub bank_account_number: String,
    pub bank_name: String,
    pub bank_branch_name: String,

    pub applicant_photo_path: String,
    pub nid_document_path: String,
    pub education_certificate_path: String,

    pub password_hash: String,
    pub agree_terms: bool,
}

/// Reduced row for the admin list endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AgentSummary {
    pub id: Uuid,
    pub agent_id: String,
    pub full_name: String,
    pub applicant_role: String,
    pub email: String,
    pub phone: String,
    pub status: String,
    pub submitted_at: Timestamp,
}

/// Request body for the admin agent review endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewAgentRequest {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}
