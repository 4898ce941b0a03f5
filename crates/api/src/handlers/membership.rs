//! Handlers for the public membership submission pipeline and the
//! administrator review endpoints.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use enroll_core::error::CoreError;
use enroll_core::fields::{map_membership_form, FileMeta, MappedMembershipForm};
use enroll_core::validation::{check_birth_year, validate_membership_form, FieldErrors};
use enroll_db::models::application::{
    CreateApplication, CreateNominee, MembershipApplication, UpdateStatusRequest,
};
use enroll_db::repositories::{ApplicationRepo, TransitionOutcome};

use crate::error::{AppError, AppResult};
use crate::intake::{read_form, FileBytes};
use crate::middleware::auth::AuthUser;
use crate::notifications::email::send_in_background;
use crate::response::Envelope;
use crate::state::AppState;
use crate::storage::DiskStorage;

/// Payload returned to the applicant after a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub proposal_no: String,
    pub status: String,
}

/// POST /api/v1/membership/applications
///
/// Public multipart submission endpoint. Maps the external form onto the
/// internal field set, validates it in full, stores the uploads, and writes
/// the application with its children in one transaction.
pub async fn submit_application(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (form, files) = read_form(multipart).await?;

    let mut errors = FieldErrors::new();
    let mapped = map_membership_form(&form, &mut errors);
    errors.merge(validate_membership_form(&mapped));

    let dob = parse_dob(&mapped, &mut errors);
    let number_of_children = parse_children_count(&mapped, &mut errors);

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    // Checked by the required-field validation above.
    let dob = dob.ok_or_else(|| AppError::InternalError("dob missing after validation".into()))?;

    // Every stored path is tracked so a failed insert can clean up after
    // itself instead of leaving orphaned files on disk.
    let mut stored_paths: Vec<String> = Vec::new();

    let photo_path = store_upload(
        &state.storage,
        "members/photos",
        &mapped.photo,
        &files,
        "photo",
        &mut stored_paths,
    )
    .await?;
    let age_proof_doc_path = store_upload(
        &state.storage,
        "members/age-proof",
        &mapped.age_proof_doc,
        &files,
        "ageProofDoc",
        &mut stored_paths,
    )
    .await?;
    let license_doc_path = store_upload(
        &state.storage,
        "members/licenses",
        &mapped.license_doc,
        &files,
        "licenseDoc",
        &mut stored_paths,
    )
    .await?;

    let mut nominees = Vec::with_capacity(mapped.nominees.len());
    for (index, nominee) in mapped.nominees.iter().enumerate() {
        let photo_path = store_upload(
            &state.storage,
            "members/nominees",
            &nominee.photo,
            &files,
            &format!("nominees[{index}]photo"),
            &mut stored_paths,
        )
        .await?;
        let id_proof_path = store_upload(
            &state.storage,
            "members/nominees",
            &nominee.id_proof,
            &files,
            &format!("nomineeIdProof[{index}]"),
            &mut stored_paths,
        )
        .await?;
        nominees.push(CreateNominee {
            name: nominee.name.clone(),
            relationship: nominee.relationship.to_string(),
            relation: nominee.relation.clone(),
            share: nominee.share,
            age: nominee.age,
            photo_path,
            id_proof_path,
        });
    }

    let mut medical_files = Vec::with_capacity(mapped.medical_records.len());
    for (key, meta) in &mapped.medical_records {
        if let Some(path) = store_upload(
            &state.storage,
            "members/medical",
            &Some(meta.clone()),
            &files,
            key,
            &mut stored_paths,
        )
        .await?
        {
            medical_files.push(path);
        }
    }

    let input = build_create_application(
        &mapped,
        dob,
        number_of_children,
        photo_path,
        age_proof_doc_path,
        license_doc_path,
    );

    let created =
        match ApplicationRepo::create_with_children(&state.pool, &input, &nominees, &medical_files)
            .await
        {
            Ok(created) => created,
            Err(err) => {
                state.storage.discard(&stored_paths).await;
                return Err(err.into());
            }
        };

    tracing::info!(
        application_id = %created.id,
        proposal_no = %created.proposal_no,
        nominees = nominees.len(),
        "Membership application submitted"
    );

    if let Some(email) = created.email.clone() {
        send_in_background(
            state.mailer.clone(),
            email,
            "Your membership application was received".to_string(),
            format!(
                "Dear {},\n\nYour membership application has been received.\n\
                 Proposal number: {}\n\nYou can check your application status \
                 using this proposal number and your birth year.",
                created.name_english, created.proposal_no
            ),
        );
    }

    let receipt = SubmissionReceipt {
        id: created.id,
        proposal_no: created.proposal_no,
        status: created.status,
    };
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Application submitted successfully", receipt)),
    ))
}

/// Query parameters for the admin application list.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// GET /api/v1/membership/applications
///
/// Admin list of applications, newest first, optionally filtered by status.
pub async fn list_applications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    let applications = ApplicationRepo::list(&state.pool, query.status.as_deref()).await?;
    Ok(Json(Envelope::ok("Applications retrieved", applications)))
}

/// Full application detail: the row plus its owned children.
#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: MembershipApplication,
    pub nominees: Vec<enroll_db::models::application::Nominee>,
    pub medical_records: Vec<enroll_db::models::application::MedicalRecord>,
}

/// GET /api/v1/membership/applications/{id}
pub async fn get_application(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    let application = find_application(&state, id).await?;
    let nominees = ApplicationRepo::list_nominees(&state.pool, id).await?;
    let medical_records = ApplicationRepo::list_medical_records(&state.pool, id).await?;
    Ok(Json(Envelope::ok(
        "Application retrieved",
        ApplicationDetail {
            application,
            nominees,
            medical_records,
        },
    )))
}

/// PATCH /api/v1/membership/applications/{id}/status
///
/// Apply an administrator-directed status transition. Terminal states and
/// same-status transitions are refused; every applied transition is recorded
/// in the history table.
pub async fn update_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;

    let changed_by = format!("user:{}", auth.user_id);
    let outcome = ApplicationRepo::update_status(
        &state.pool,
        id,
        &input.status,
        &changed_by,
        input.notes.as_deref().unwrap_or(""),
    )
    .await?;

    let updated = match outcome {
        TransitionOutcome::NotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Application",
                id: id.to_string(),
            }))
        }
        TransitionOutcome::Refused(reason) => {
            return Err(AppError::Core(CoreError::Validation(reason)))
        }
        TransitionOutcome::Applied(application) => application,
    };

    tracing::info!(
        application_id = %id,
        status = %updated.status,
        changed_by = %changed_by,
        "Application status updated"
    );

    notify_status_change(&state, &updated);

    Ok(Json(Envelope::ok("Status updated", updated)))
}

/// GET /api/v1/membership/applications/{id}/history
pub async fn status_history(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    find_application(&state, id).await?;
    let history = ApplicationRepo::list_status_history(&state.pool, id).await?;
    Ok(Json(Envelope::ok("Status history retrieved", history)))
}

/// Aggregate statistics payload.
#[derive(Debug, Serialize)]
pub struct Statistics {
    pub by_status: enroll_db::models::application::StatusCounts,
    pub by_type: Vec<enroll_db::models::application::TypeCount>,
}

/// GET /api/v1/membership/applications/statistics
pub async fn statistics(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    let by_status = ApplicationRepo::status_counts(&state.pool).await?;
    let by_type = ApplicationRepo::type_counts(&state.pool).await?;
    Ok(Json(Envelope::ok(
        "Statistics retrieved",
        Statistics { by_status, by_type },
    )))
}

/// Member self-service login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLoginRequest {
    pub proposal_no: String,
    pub birth_year: i32,
}

/// POST /api/v1/membership/login
///
/// Member self-service lookup: proposal number plus birth year. The proposal
/// number match is case-insensitive. A wrong pair yields 401 without
/// revealing which half failed.
pub async fn member_login(
    State(state): State<AppState>,
    Json(input): Json<MemberLoginRequest>,
) -> AppResult<impl IntoResponse> {
    let mut errors = FieldErrors::new();
    check_birth_year(&mut errors, input.birth_year);
    if input.proposal_no.trim().is_empty() {
        errors.add("proposalNo", "This field is required");
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let application =
        ApplicationRepo::find_by_proposal_no(&state.pool, input.proposal_no.trim()).await?;

    let Some(application) = application.filter(|a| a.dob.year() == input.birth_year) else {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid proposal number or birth year".into(),
        )));
    };

    let nominees = ApplicationRepo::list_nominees(&state.pool, application.id).await?;
    let medical_records =
        ApplicationRepo::list_medical_records(&state.pool, application.id).await?;

    Ok(Json(Envelope::ok(
        "Login successful",
        ApplicationDetail {
            application,
            nominees,
            medical_records,
        },
    )))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_application(state: &AppState, id: Uuid) -> AppResult<MembershipApplication> {
    ApplicationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Application",
                id: id.to_string(),
            })
        })
}

/// Store one named upload if present, returning its relative path. The path
/// is also appended to `stored` for cleanup if the submission later fails.
async fn store_upload(
    storage: &DiskStorage,
    category: &str,
    meta: &Option<FileMeta>,
    files: &FileBytes,
    key: &str,
    stored: &mut Vec<String>,
) -> AppResult<Option<String>> {
    let Some(meta) = meta else {
        return Ok(None);
    };
    let Some(bytes) = files.get(key) else {
        return Ok(None);
    };
    let path = storage
        .store(category, &meta.filename, bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload '{key}': {e}")))?;
    stored.push(path.clone());
    Ok(Some(path))
}

fn parse_dob(mapped: &MappedMembershipForm, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let raw = mapped.values.get("dob")?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add("dob", format!("Date must be in YYYY-MM-DD format: {raw}"));
            None
        }
    }
}

fn parse_children_count(mapped: &MappedMembershipForm, errors: &mut FieldErrors) -> i32 {
    match mapped.values.get("number_of_children") {
        None => 0,
        Some(raw) => match raw.parse::<i32>() {
            Ok(count) => count,
            Err(_) => {
                errors.add(
                    "numberOfChildren",
                    format!("Must be a whole number, got: {raw}"),
                );
                0
            }
        },
    }
}

fn build_create_application(
    mapped: &MappedMembershipForm,
    dob: NaiveDate,
    number_of_children: i32,
    photo_path: Option<String>,
    age_proof_doc_path: Option<String>,
    license_doc_path: Option<String>,
) -> CreateApplication {
    let take = |key: &str| mapped.values.get(key).cloned().unwrap_or_default();
    let take_opt = |key: &str| mapped.values.get(key).cloned();

    CreateApplication {
        membership_type: take("membership_type"),
        name_bangla: take("name_bangla"),
        name_english: take("name_english"),
        father_name: take("father_name"),
        mother_name: take("mother_name"),
        spouse_name: take_opt("spouse_name"),
        gender: take("gender"),
        marital_status: take("marital_status"),
        dob,

        mobile: take("mobile"),
        email: take_opt("email"),
        emergency_contact_name: take("emergency_contact_name"),
        emergency_contact_number: take("emergency_contact_number"),

        nationality: take_opt("nationality"),
        nid_number: take("nid_number"),
        passport_number: take("passport_number"),
        age_proof: serde_json::json!(mapped.age_proof),
        age_proof_doc_path,
        driving_license: take_opt("driving_license"),
        license_doc_path,
        photo_path,

        education: take("education"),
        professional_qualifications: take("professional_qualifications"),
        occupation: take("occupation"),
        organization_name: take("organization_name"),
        organization_details: take("organization_details"),
        daily_work: take("daily_work"),
        monthly_income: mapped.monthly_income,
        income_source: take("income_source"),
        number_of_children,

        present_address: take("present_address"),
        permanent_address: take("permanent_address"),

        weight: take("weight"),
        height: take("height"),
        chest: take("chest"),
        blood_group: take("blood_group"),
        surgery_details: take("surgery_details"),

        accept_terms: mapped.accept_terms,
        fo_code: take_opt("fo_code"),
        fo_name: take_opt("fo_name"),
    }
}

/// Email the applicant on decision statuses; silent for intermediate steps.
fn notify_status_change(state: &AppState, application: &MembershipApplication) {
    let Some(email) = application.email.clone() else {
        return;
    };
    let body = match application.status.as_str() {
        "approved" => format!(
            "Dear {},\n\nYour membership application {} has been approved.",
            application.name_english, application.proposal_no
        ),
        "rejected" => format!(
            "Dear {},\n\nWe regret to inform you that your membership \
             application {} has been rejected.",
            application.name_english, application.proposal_no
        ),
        "active" => format!(
            "Dear {},\n\nYour membership {} is now active.",
            application.name_english, application.proposal_no
        ),
        _ => return,
    };
    send_in_background(
        state.mailer.clone(),
        email,
        format!("Membership application {}", application.status),
        body,
    );
}
