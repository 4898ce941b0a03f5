//! Repository for the `agent_applications` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::agent::{AgentApplication, AgentSummary, CreateAgentApplication};

/// Column list for agent_applications queries.
const AGENT_COLUMNS: &str = "id, agent_id, applicant_role, fm_name, role_code, dgm_name, \
    dgm_code, gm_name, gm_code, full_name, email, phone, address, guardian_name, mother_name, \
    present_address, permanent_address, dob, birth_place, nid_number, bank_account_number, \
    bank_name, bank_branch_name, applicant_photo_path, nid_document_path, \
    education_certificate_path, password_hash, agree_terms, status, reviewed_by, reviewed_at, \
    notes, submitted_at, updated_at";

/// Provides CRUD operations for agent applications.
pub struct AgentRepo;

impl AgentRepo {
    /// Insert a new agent application, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAgentApplication,
    ) -> Result<AgentApplication, sqlx::Error> {
        let query = format!(
            "INSERT INTO agent_applications
                (agent_id, applicant_role, fm_name, role_code, dgm_name, dgm_code, gm_name,
                 gm_code, full_name, email, phone, address, guardian_name, mother_name,
                 present_address, permanent_address, dob, birth_place, nid_number,
                 bank_account_number, bank_name, bank_branch_name, applicant_photo_path,
                 nid_document_path, education_certificate_path, password_hash, agree_terms)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                     $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
             RETURNING {AGENT_COLUMNS}"
        );
        sqlx::query_as::<_, AgentApplication>(&query)
            .bind(&input.agent_id)
            .bind(&input.applicant_role)
            .bind(&input.fm_name)
            .bind(&input.role_code)
            .bind(&input.dgm_name)
            .bind(&input.dgm_code)
            .bind(&input.gm_name)
            .bind(&input.gm_code)
            .bind(&input.full_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.guardian_name)
            .bind(&input.mother_name)
            .bind(&input.present_address)
            .bind(&input.permanent_address)
            .bind(input.dob)
            .bind(&input.birth_place)
            .bind(&input.nid_number)
            .bind(&input.bank_account_number)
            .bind(&input.bank_name)
            .bind(&input.bank_branch_name)
            .bind(&input.applicant_photo_path)
            .bind(&input.nid_document_path)
            .bind(&input.education_certificate_path)
            .bind(&input.password_hash)
            .bind(input.agree_terms)
            .fetch_one(pool)
            .await
    }

    /// Find an agent application by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<AgentApplication>, sqlx::Error> {
        let query = format!("SELECT {AGENT_COLUMNS} FROM agent_applications WHERE id = $1");
        sqlx::query_as::<_, AgentApplication>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an agent application by the external agent code.
    pub async fn find_by_agent_id(
        pool: &PgPool,
        agent_id: &str,
    ) -> Result<Option<AgentApplication>, sqlx::Error> {
        let query =
            format!("SELECT {AGENT_COLUMNS} FROM agent_applications WHERE agent_id = $1");
        sqlx::query_as::<_, AgentApplication>(&query)
            .bind(agent_id)
            .fetch_optional(pool)
            .await
    }

    /// List agent applications, newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
    ) -> Result<Vec<AgentSummary>, sqlx::Error> {
        sqlx::query_as::<_, AgentSummary>(
            "SELECT id, agent_id, full_name, applicant_role, email, phone, status, submitted_at
             FROM agent_applications
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY submitted_at DESC",
        )
        .bind(status)
        .fetch_all(pool)
        .await
    }

    /// Record a review decision. Returns the updated row, or `None` if the
    /// application does not exist.
    pub async fn review(
        pool: &PgPool,
        id: Uuid,
        status: &str,
        reviewed_by: &str,
        notes: &str,
    ) -> Result<Option<AgentApplication>, sqlx::Error> {
        let query = format!(
            "UPDATE agent_applications
             SET status = $2, reviewed_by = $3, notes = $4, reviewed_at = NOW(),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {AGENT_COLUMNS}"
        );
        sqlx::query_as::<_, AgentApplication>(&query)
            .bind(id)
            .bind(status)
            .bind(reviewed_by)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }
}
