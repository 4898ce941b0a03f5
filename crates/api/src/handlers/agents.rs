//! Handlers for agent onboarding: public submission plus administrator
//! review.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use enroll_core::error::CoreError;
use enroll_core::fields::map_agent_form;
use enroll_core::status::AgentStatus;
use enroll_core::validation::{validate_agent_form, FieldErrors};
use enroll_db::models::agent::{AgentApplication, CreateAgentApplication, ReviewAgentRequest};
use enroll_db::repositories::AgentRepo;

use crate::auth::password::hash_password;
use crate::captcha::CaptchaError;
use crate::error::{AppError, AppResult};
use crate::handlers::membership::ListQuery;
use crate::intake::read_form;
use crate::middleware::auth::AuthUser;
use crate::notifications::email::send_in_background;
use crate::response::Envelope;
use crate::state::AppState;

/// Payload returned to the applicant after a successful submission.
#[derive(Debug, Serialize)]
pub struct AgentReceipt {
    pub id: Uuid,
    pub agent_id: String,
    pub status: String,
}

/// POST /api/v1/agents/applications
///
/// Public multipart submission endpoint. The captcha token is verified
/// before anything is validated or stored; a provider outage is reported
/// as retryable rather than silently waved through.
pub async fn submit_agent_application(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (form, files) = read_form(multipart).await?;

    let captcha_token = form.text("captchaToken").unwrap_or("");
    match state.captcha.verify(captcha_token, None).await {
        Ok(()) => {}
        Err(CaptchaError::Rejected(reason)) => {
            let mut errors = FieldErrors::new();
            errors.add("captchaToken", format!("Captcha verification failed: {reason}"));
            return Err(AppError::Validation(errors));
        }
        Err(CaptchaError::Unavailable(reason)) => {
            tracing::warn!(error = %reason, "Captcha provider unreachable");
            return Err(AppError::Unavailable(
                "Captcha verification is temporarily unavailable, please retry".into(),
            ));
        }
    }

    let mapped = map_agent_form(&form);
    let mut errors = validate_agent_form(&mapped);

    if !mapped.values.contains_key("agent_id") {
        errors.add("agentId", "This field is required");
    }
    let dob = mapped.values.get("dob").and_then(|raw| {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add("dob", format!("Date must be in YYYY-MM-DD format: {raw}"));
                None
            }
        }
    });

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let dob = dob.ok_or_else(|| AppError::InternalError("dob missing after validation".into()))?;

    let password_hash = hash_password(&mapped.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    // Required file slots were checked by validation.
    let applicant_photo_path = store_required(&state, "agents/photos", &files, "applicantPhoto", &mapped.applicant_photo).await?;
    let nid_document_path = store_required(&state, "agents/nid", &files, "nidDocument", &mapped.nid_document).await?;
    let education_certificate_path = store_required(
        &state,
        "agents/certificates",
        &files,
        "educationCertificate",
        &mapped.education_certificate,
    )
    .await?;

    let take = |key: &str| mapped.values.get(key).cloned().unwrap_or_default();
    let input = CreateAgentApplication {
        agent_id: take("agent_id"),
        applicant_role: take("applicant_role"),
        fm_name: take("fm_name"),
        role_code: take("role_code"),
        dgm_name: take("dgm_name"),
        dgm_code: take("dgm_code"),
        gm_name: take("gm_name"),
        gm_code: take("gm_code"),
        full_name: take("full_name"),
        email: take("email"),
        phone: take("phone"),
        address: take("address"),
        guardian_name: take("guardian_name"),
        mother_name: take("mother_name"),
        present_address: take("present_address"),
        permanent_address: take("permanent_address"),
        dob,
        birth_place: take("birth_place"),
        nid_number: take("nid_number"),
        bank_account_number: take("bank_account_number"),
        bank_name: take("bank_name"),
        bank_branch_name: take("bank_branch_name"),
        applicant_photo_path,
        nid_document_path,
        education_certificate_path,
        password_hash,
        agree_terms: mapped.agree_terms,
    };

    let created = match AgentRepo::create(&state.pool, &input).await {
        Ok(created) => created,
        Err(err) => {
            // The insert did not commit (e.g. a duplicate agent id), so the
            // files stored above would be orphaned.
            state
                .storage
                .discard(&[
                    input.applicant_photo_path,
                    input.nid_document_path,
                    input.education_certificate_path,
                ])
                .await;
            return Err(err.into());
        }
    };

    tracing::info!(
        application_id = %created.id,
        agent_id = %created.agent_id,
        role = %created.applicant_role,
        "Agent application submitted"
    );

    send_in_background(
        state.mailer.clone(),
        created.email.clone(),
        "Your agent application was received".to_string(),
        format!(
            "Dear {},\n\nYour agent application ({}) has been received and \
             is pending review.",
            created.full_name, created.agent_id
        ),
    );

    let receipt = AgentReceipt {
        id: created.id,
        agent_id: created.agent_id,
        status: created.status,
    };
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Application submitted successfully", receipt)),
    ))
}

/// GET /api/v1/agents/applications
pub async fn list_agents(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    let agents = AgentRepo::list(&state.pool, query.status.as_deref()).await?;
    Ok(Json(Envelope::ok("Applications retrieved", agents)))
}

/// GET /api/v1/agents/applications/{id}
pub async fn get_agent(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;
    let agent = find_agent(&state, id).await?;
    Ok(Json(Envelope::ok("Application retrieved", agent)))
}

/// PATCH /api/v1/agents/applications/{id}/review
///
/// Record a review decision. Rejected applications are terminal.
pub async fn review_agent(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReviewAgentRequest>,
) -> AppResult<impl IntoResponse> {
    auth.require_admin()?;

    let current = find_agent(&state, id).await?;
    let from = AgentStatus::parse(&current.status)?;
    let to = AgentStatus::parse(&input.status)?;
    from.check_transition(to)?;

    let reviewed_by = format!("user:{}", auth.user_id);
    let updated = AgentRepo::review(
        &state.pool,
        id,
        to.as_str(),
        &reviewed_by,
        input.notes.as_deref().unwrap_or(""),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "AgentApplication",
            id: id.to_string(),
        })
    })?;

    tracing::info!(
        application_id = %id,
        status = %updated.status,
        reviewed_by = %reviewed_by,
        "Agent application reviewed"
    );

    if matches!(to, AgentStatus::Approved | AgentStatus::Rejected) {
        let verdict = if to == AgentStatus::Approved {
            "approved"
        } else {
            "rejected"
        };
        send_in_background(
            state.mailer.clone(),
            updated.email.clone(),
            format!("Agent application {verdict}"),
            format!(
                "Dear {},\n\nYour agent application ({}) has been {verdict}.",
                updated.full_name, updated.agent_id
            ),
        );
    }

    Ok(Json(Envelope::ok("Application reviewed", updated)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_agent(state: &AppState, id: Uuid) -> AppResult<AgentApplication> {
    AgentRepo::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "AgentApplication",
            id: id.to_string(),
        })
    })
}

async fn store_required(
    state: &AppState,
    category: &str,
    files: &crate::intake::FileBytes,
    key: &str,
    meta: &Option<enroll_core::fields::FileMeta>,
) -> AppResult<String> {
    let meta = meta
        .as_ref()
        .ok_or_else(|| AppError::InternalError(format!("{key} missing after validation")))?;
    let bytes = files
        .get(key)
        .ok_or_else(|| AppError::InternalError(format!("{key} payload missing")))?;
    state
        .storage
        .store(category, &meta.filename, bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload '{key}': {e}")))
}
