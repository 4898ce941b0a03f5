//! Repository for membership applications and their owned child rows.

use chrono::Utc;
use enroll_core::fields::age_on;
use enroll_core::proposal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::application::{
    ApplicationSummary, CreateApplication, CreateNominee, MedicalRecord, MembershipApplication,
    Nominee, StatusCounts, StatusHistoryEntry, TypeCount,
};

/// Column list for membership_applications queries.
const APPLICATION_COLUMNS: &str = "id, proposal_no, status, valid_until, membership_type, \
    name_bangla, name_english, father_name, mother_name, spouse_name, gender, marital_status, \
    dob, age, mobile, email, emergency_contact_name, emergency_contact_number, nationality, \
    nid_number, passport_number, age_proof, age_proof_doc_path, driving_license, \
    license_doc_path, photo_path, education, professional_qualifications, occupation, \
    organization_name, organization_details, daily_work, monthly_income, income_source, \
    number_of_children, present_address, permanent_address, weight, height, chest, \
    blood_group, surgery_details, accept_terms, fo_code, fo_name, created_at, updated_at";

/// Column list for nominees queries.
const NOMINEE_COLUMNS: &str = "id, application_id, name, relationship, relation, share, age, \
    photo_path, id_proof_path, created_at";

/// Column list for application_status_history queries.
const HISTORY_COLUMNS: &str =
    "id, application_id, previous_status, new_status, changed_by, notes, created_at";

/// How many times a submission retries after losing a proposal-number race.
const PROPOSAL_RETRY_ATTEMPTS: u32 = 3;

/// Outcome of a status transition attempt.
#[derive(Debug)]
pub enum TransitionOutcome {
    /// No application with the given id.
    NotFound,
    /// The transition is not permitted from the current status.
    Refused(String),
    /// The transition was applied and recorded in the history table.
    Applied(MembershipApplication),
}

/// Provides CRUD operations for membership applications.
pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Insert an application together with its nominees and medical record
    /// rows in a single transaction.
    ///
    /// The proposal number is allocated inside the transaction: the highest
    /// existing number for the current month is read under a row lock and
    /// incremented. A concurrent submitter can still win the race between
    /// two transactions that saw no prior row, in which case the unique
    /// constraint on proposal_no fires and the whole insert is retried with
    /// a fresh transaction.
    pub async fn create_with_children(
        pool: &PgPool,
        input: &CreateApplication,
        nominees: &[CreateNominee],
        medical_files: &[String],
    ) -> Result<MembershipApplication, sqlx::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::try_create(pool, input, nominees, medical_files).await {
                Ok(created) => return Ok(created),
                Err(err) if is_proposal_conflict(&err) && attempt < PROPOSAL_RETRY_ATTEMPTS => {
                    tracing::warn!(attempt, "proposal number race lost, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_create(
        pool: &PgPool,
        input: &CreateApplication,
        nominees: &[CreateNominee],
        medical_files: &[String],
    ) -> Result<MembershipApplication, sqlx::Error> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        let proposal_no = Self::next_proposal_no(&mut tx, now).await?;
        let age = age_on(input.dob, now.date_naive());

        let query = format!(
            "INSERT INTO membership_applications
                (proposal_no, membership_type, name_bangla, name_english, father_name,
                 mother_name, spouse_name, gender, marital_status, dob, age, mobile, email,
                 emergency_contact_name, emergency_contact_number, nationality, nid_number,
                 passport_number, age_proof, age_proof_doc_path, driving_license,
                 license_doc_path, photo_path, education, professional_qualifications,
                 occupation, organization_name, organization_details, daily_work,
                 monthly_income, income_source, number_of_children, present_address,
                 permanent_address, weight, height, chest, blood_group, surgery_details,
                 accept_terms, fo_code, fo_name)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                     $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                     $31, $32, $33, $34, $35, $36, $37, $38, $39, $40, $41, $42)
             RETURNING {APPLICATION_COLUMNS}"
        );
        let created = sqlx::query_as::<_, MembershipApplication>(&query)
            .bind(&proposal_no)
            .bind(&input.membership_type)
            .bind(&input.name_bangla)
            .bind(&input.name_english)
            .bind(&input.father_name)
            .bind(&input.mother_name)
            .bind(&input.spouse_name)
            .bind(&input.gender)
            .bind(&input.marital_status)
            .bind(input.dob)
            .bind(age)
            .bind(&input.mobile)
            .bind(&input.email)
            .bind(&input.emergency_contact_name)
            .bind(&input.emergency_contact_number)
            .bind(input.nationality.as_deref().unwrap_or("Bangladeshi"))
            .bind(&input.nid_number)
            .bind(&input.passport_number)
            .bind(&input.age_proof)
            .bind(&input.age_proof_doc_path)
            .bind(input.driving_license.as_deref().unwrap_or("no"))
            .bind(&input.license_doc_path)
            .bind(&input.photo_path)
            .bind(&input.education)
            .bind(&input.professional_qualifications)
            .bind(&input.occupation)
            .bind(&input.organization_name)
            .bind(&input.organization_details)
            .bind(&input.daily_work)
            .bind(input.monthly_income)
            .bind(&input.income_source)
            .bind(input.number_of_children)
            .bind(&input.present_address)
            .bind(&input.permanent_address)
            .bind(&input.weight)
            .bind(&input.height)
            .bind(&input.chest)
            .bind(&input.blood_group)
            .bind(&input.surgery_details)
            .bind(input.accept_terms)
            .bind(&input.fo_code)
            .bind(&input.fo_name)
            .fetch_one(&mut *tx)
            .await?;

        for nominee in nominees {
            sqlx::query(
                "INSERT INTO nominees
                    (application_id, name, relationship, relation, share, age,
                     photo_path, id_proof_path)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(created.id)
            .bind(&nominee.name)
            .bind(&nominee.relationship)
            .bind(&nominee.relation)
            .bind(nominee.share)
            .bind(nominee.age)
            .bind(&nominee.photo_path)
            .bind(&nominee.id_proof_path)
            .execute(&mut *tx)
            .await?;
        }

        for file_path in medical_files {
            sqlx::query(
                "INSERT INTO medical_records (application_id, file_path) VALUES ($1, $2)",
            )
            .bind(created.id)
            .bind(file_path)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Allocate the next proposal number for the month containing `now`.
    ///
    /// Locks the current high-water row so two transactions that both see it
    /// serialize; the unique constraint catches the empty-month race.
    async fn next_proposal_no(
        tx: &mut Transaction<'_, Postgres>,
        now: chrono::DateTime<Utc>,
    ) -> Result<String, sqlx::Error> {
        let prefix = proposal::month_prefix(now);
        // Longer suffixes sort after shorter ones so the numeric maximum
        // wins once the sequence outgrows the four-digit padding.
        let last: Option<String> = sqlx::query_scalar(
            "SELECT proposal_no FROM membership_applications
             WHERE proposal_no LIKE $1
             ORDER BY LENGTH(proposal_no) DESC, proposal_no DESC
             LIMIT 1
             FOR UPDATE",
        )
        .bind(format!("{prefix}-%"))
        .fetch_optional(&mut **tx)
        .await?;
        Ok(proposal::next_number(&prefix, last.as_deref()))
    }

    /// Find an application by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<MembershipApplication>, sqlx::Error> {
        let query =
            format!("SELECT {APPLICATION_COLUMNS} FROM membership_applications WHERE id = $1");
        sqlx::query_as::<_, MembershipApplication>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an application by its proposal number, case-insensitively.
    pub async fn find_by_proposal_no(
        pool: &PgPool,
        proposal_no: &str,
    ) -> Result<Option<MembershipApplication>, sqlx::Error> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM membership_applications
             WHERE UPPER(proposal_no) = UPPER($1)"
        );
        sqlx::query_as::<_, MembershipApplication>(&query)
            .bind(proposal_no)
            .fetch_optional(pool)
            .await
    }

    /// List applications for the admin dashboard, newest first, optionally
    /// filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
    ) -> Result<Vec<ApplicationSummary>, sqlx::Error> {
        sqlx::query_as::<_, ApplicationSummary>(
            "SELECT id, proposal_no, name_english, membership_type, mobile, email, status,
                    created_at
             FROM membership_applications
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(pool)
        .await
    }

    /// List the nominees for an application, in insertion order.
    pub async fn list_nominees(
        pool: &PgPool,
        application_id: Uuid,
    ) -> Result<Vec<Nominee>, sqlx::Error> {
        let query = format!(
            "SELECT {NOMINEE_COLUMNS} FROM nominees
             WHERE application_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Nominee>(&query)
            .bind(application_id)
            .fetch_all(pool)
            .await
    }

    /// List the medical record files attached to an application.
    pub async fn list_medical_records(
        pool: &PgPool,
        application_id: Uuid,
    ) -> Result<Vec<MedicalRecord>, sqlx::Error> {
        sqlx::query_as::<_, MedicalRecord>(
            "SELECT id, application_id, file_path, uploaded_at
             FROM medical_records
             WHERE application_id = $1
             ORDER BY id ASC",
        )
        .bind(application_id)
        .fetch_all(pool)
        .await
    }

    /// Apply a status transition and record it in the history table, both in
    /// one transaction.
    ///
    /// The current row is locked before the transition is checked so that two
    /// concurrent reviewers cannot both apply conflicting transitions.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        new_status: &str,
        changed_by: &str,
        notes: &str,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        use enroll_core::status::ApplicationStatus;

        let mut tx = pool.begin().await?;

        let current: Option<String> = sqlx::query_scalar(
            "SELECT status FROM membership_applications WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(current) = current else {
            return Ok(TransitionOutcome::NotFound);
        };

        let from = match ApplicationStatus::parse(&current) {
            Ok(status) => status,
            Err(err) => return Ok(TransitionOutcome::Refused(err.to_string())),
        };
        let to = match ApplicationStatus::parse(new_status) {
            Ok(status) => status,
            Err(err) => return Ok(TransitionOutcome::Refused(err.to_string())),
        };
        if let Err(err) = from.check_transition(to) {
            return Ok(TransitionOutcome::Refused(err.to_string()));
        }

        // Activation starts the one-year membership clock.
        let query = format!(
            "UPDATE membership_applications
             SET status = $2,
                 valid_until = CASE WHEN $2 = 'active'
                                    THEN (NOW() + INTERVAL '1 year')::date
                                    ELSE valid_until END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {APPLICATION_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, MembershipApplication>(&query)
            .bind(id)
            .bind(to.as_str())
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO application_status_history
                (application_id, previous_status, new_status, changed_by, notes)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(changed_by)
        .bind(notes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(TransitionOutcome::Applied(updated))
    }

    /// List the status history for an application, newest first.
    pub async fn list_status_history(
        pool: &PgPool,
        application_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM application_status_history
             WHERE application_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, StatusHistoryEntry>(&query)
            .bind(application_id)
            .fetch_all(pool)
            .await
    }

    /// Count applications per status.
    pub async fn status_counts(pool: &PgPool) -> Result<StatusCounts, sqlx::Error> {
        sqlx::query_as::<_, StatusCounts>(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'under_review') AS under_review,
                COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected,
                COUNT(*) FILTER (WHERE status = 'active') AS active,
                COUNT(*) FILTER (WHERE status = 'expired') AS expired
             FROM membership_applications",
        )
        .fetch_one(pool)
        .await
    }

    /// Count applications per membership type, largest first.
    pub async fn type_counts(pool: &PgPool) -> Result<Vec<TypeCount>, sqlx::Error> {
        sqlx::query_as::<_, TypeCount>(
            "SELECT membership_type, COUNT(*) AS count
             FROM membership_applications
             GROUP BY membership_type
             ORDER BY count DESC",
        )
        .fetch_all(pool)
        .await
    }
}

/// True when the error is the unique violation on proposal_no.
fn is_proposal_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.constraint() == Some("uq_membership_applications_proposal_no")
        }
        _ => false,
    }
}
