//! Membership application models: the aggregate row, its owned children
//! (nominees, medical record files, status history), and the DTOs used by
//! the submission pipeline.

use chrono::NaiveDate;
use enroll_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `membership_applications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MembershipApplication {
    pub id: Uuid,
    pub proposal_no: String,
    pub status: String,
    pub valid_until: Option<NaiveDate>,

    pub membership_type: String,
    pub name_bangla: String,
    pub name_english: String,
    pub father_name: String,
    pub mother_name: String,
    pub spouse_name: Option<String>,
    pub gender: String,
    pub marital_status: String,
    pub dob: NaiveDate,
    pub age: i32,

    pub mobile: String,
    pub email: Option<String>,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,

    pub nationality: String,
    pub nid_number: String,
    pub passport_number: String,
    pub age_proof: serde_json::Value,
    pub age_proof_doc_path: Option<String>,
    pub driving_license: String,
    pub license_doc_path: Option<String>,
    pub photo_path: Option<String>,

    pub education: String,
    pub professional_qualifications: String,
    pub occupation: String,
    pub organization_name: String,
    pub organization_details: String,
    pub daily_work: String,
    pub monthly_income: Option<Decimal>,
    pub income_source: String,
    pub number_of_children: i32,

    pub present_address: String,
    pub permanent_address: String,

    pub weight: String,
    pub height: String,
    pub chest: String,
    pub blood_group: String,
    pub surgery_details: String,

    pub accept_terms: bool,
    pub fo_code: Option<String>,
    pub fo_name: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new membership application. Built by the submission
/// handler from the mapped and validated form; the proposal number and
/// derived age are filled in by the repository inside its transaction.
#[derive(Debug, Clone, Default)]
pub struct CreateApplication {
    pub membership_type: String,
    pub name_bangla: String,
    pub name_english: String,
    pub father_name: String,
    pub mother_name: String,
    pub spouse_name: Option<String>,
    pub gender: String,
    pub marital_status: String,
    pub dob: NaiveDate,

    pub mobile: String,
    pub email: Option<String>,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,

    pub nationality: Option<String>,
    pub nid_number: String,
    pub passport_number: String,
    pub age_proof: serde_json::Value,
    pub age_proof_doc_path: Option<String>,
    pub driving_license: Option<String>,
    pub license_doc_path: Option<String>,
    pub photo_path: Option<String>,

    pub education: String,
    pub professional_qualifications: String,
    pub occupation: String,
    pub organization_name: String,
    pub organization_details: String,
    pub daily_work: String,
    pub monthly_income: Option<Decimal>,
    pub income_source: String,
    pub number_of_children: i32,

    pub present_address: String,
    pub permanent_address: String,

    pub weight: String,
    pub height: String,
    pub chest: String,
    pub blood_group: String,
    pub surgery_details: String,

    pub accept_terms: bool,
    pub fo_code: Option<String>,
    pub fo_name: Option<String>,
}

/// A row from the `nominees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Nominee {
    pub id: DbId,
    pub application_id: Uuid,
    pub name: String,
    pub relationship: String,
    pub relation: String,
    pub share: i32,
    pub age: i32,
    pub photo_path: Option<String>,
    pub id_proof_path: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting one nominee under an application.
#[derive(Debug, Clone)]
pub struct CreateNominee {
    pub name: String,
    pub relationship: String,
    pub relation: String,
    pub share: i32,
    pub age: i32,
    pub photo_path: Option<String>,
    pub id_proof_path: Option<String>,
}

/// A row from the `medical_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MedicalRecord {
    pub id: DbId,
    pub application_id: Uuid,
    pub file_path: String,
    pub uploaded_at: Timestamp,
}

/// A row from the append-only `application_status_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusHistoryEntry {
    pub id: DbId,
    pub application_id: Uuid,
    pub previous_status: String,
    pub new_status: String,
    pub changed_by: String,
    pub notes: String,
    pub created_at: Timestamp,
}

/// Reduced row for the admin list endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub proposal_no: String,
    pub name_english: String,
    pub membership_type: String,
    pub mobile: String,
    pub email: Option<String>,
    pub status: String,
    pub created_at: Timestamp,
}

/// Request body for the admin status transition endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Aggregate counts per status for the statistics endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub under_review: i64,
    pub approved: i64,
    pub rejected: i64,
    pub active: i64,
    pub expired: i64,
}

/// Count of applications per membership type.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TypeCount {
    pub membership_type: String,
    pub count: i64,
}
