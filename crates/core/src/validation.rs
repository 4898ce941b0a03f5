//! Cross-field and per-field validation for submitted forms.
//!
//! All checks are pure functions over the mapped form. Failures accumulate
//! into a [`FieldErrors`] map so a submission returns every problem at once,
//! never just the first.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::Datelike;
use regex::Regex;
use serde::Serialize;

use crate::fields::{FileMeta, MappedAgentForm, MappedMembershipForm, AGENT_ROLES, RELATIONSHIPS};

/// Maximum upload size for any document or photo (5 MB, boundary inclusive).
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Extensions accepted for photo uploads.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Extensions accepted for document uploads (images plus PDF).
pub const DOCUMENT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];

/// Minimum password length for agent and user registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Field-keyed validation errors, collected in full.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Fold another error map into this one, appending per-field messages.
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
}

fn phone_charset() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9+\-\s()]+$").expect("static phone regex"))
}

/// Check a phone number: digits plus `+ - ( ) space`, with a minimum count
/// of significant digits.
pub fn check_phone(errors: &mut FieldErrors, field: &str, value: &str, min_digits: usize) {
    if !phone_charset().is_match(value) {
        errors.add(
            field,
            "Invalid phone number format. Use only numbers and +, -, (, )",
        );
        return;
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if digits < min_digits {
        errors.add(
            field,
            format!("Phone number must have at least {min_digits} digits"),
        );
    }
}

/// Check an uploaded file against the size limit and an extension allow-list.
pub fn check_upload(
    errors: &mut FieldErrors,
    field: &str,
    meta: &FileMeta,
    allowed_extensions: &[&str],
) {
    if meta.size_bytes > MAX_UPLOAD_BYTES {
        errors.add(field, "File size cannot exceed 5MB");
    }
    let extension = meta
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !allowed_extensions.contains(&extension.as_str()) {
        errors.add(
            field,
            format!(
                "File extension '.{extension}' is not allowed. Allowed: {}",
                allowed_extensions.join(", ")
            ),
        );
    }
}

/// Validate a mapped membership form. Returns all field errors together.
pub fn validate_membership_form(form: &MappedMembershipForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for required in ["membership_type", "name_english", "gender", "mobile", "dob"] {
        if !form.values.contains_key(required) {
            errors.add(required, "This field is required");
        }
    }

    if let Some(tier) = form.values.get("membership_type") {
        if !["individual", "family", "corporate"].contains(&tier.as_str()) {
            errors.add("membership_type", format!("Unknown membership type: {tier}"));
        }
    }

    if let Some(gender) = form.values.get("gender") {
        if !["male", "female", "other"].contains(&gender.as_str()) {
            errors.add("gender", format!("Unknown gender: {gender}"));
        }
    }

    if let Some(mobile) = form.values.get("mobile") {
        check_phone(&mut errors, "mobile", mobile, 10);
    }

    // Parse failures on these are reported by the intake layer; here only
    // values that would otherwise pass are range-checked.
    if let Some(raw) = form.values.get("number_of_children") {
        if let Ok(count) = raw.parse::<i32>() {
            if !(0..=20).contains(&count) {
                errors.add(
                    "numberOfChildren",
                    "Number of children must be between 0 and 20",
                );
            }
        }
    }

    if let Some(raw) = form.values.get("dob") {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            let today = chrono::Utc::now().date_naive();
            if date > today {
                errors.add("dob", "Birth date cannot be in the future");
            } else if date.year() < 1900 {
                errors.add("dob", "Birth year must be after 1900");
            }
        }
    }

    if !form.accept_terms {
        errors.add("acceptTerms", "You must accept the terms and conditions");
    }

    check_nominees(&mut errors, form);

    if let Some(photo) = &form.photo {
        check_upload(&mut errors, "photo", photo, IMAGE_EXTENSIONS);
    }
    if let Some(doc) = &form.age_proof_doc {
        check_upload(&mut errors, "ageProofDoc", doc, DOCUMENT_EXTENSIONS);
    }
    if let Some(doc) = &form.license_doc {
        check_upload(&mut errors, "licenseDoc", doc, DOCUMENT_EXTENSIONS);
    }
    for (key, meta) in &form.medical_records {
        check_upload(&mut errors, key, meta, DOCUMENT_EXTENSIONS);
    }

    errors
}

/// Share-sum invariant plus per-nominee checks. Zero nominees is valid.
fn check_nominees(errors: &mut FieldErrors, form: &MappedMembershipForm) {
    if form.nominees.is_empty() {
        return;
    }

    let mut total: i64 = 0;
    for (index, nominee) in form.nominees.iter().enumerate() {
        if !(0..=100).contains(&nominee.share) {
            errors.add(
                format!("nominees[{index}]share"),
                "Share percentage must be between 0 and 100",
            );
        }
        if !RELATIONSHIPS.contains(&nominee.relationship) {
            errors.add(
                format!("nominees[{index}]relation"),
                format!("Unknown relationship: {}", nominee.relationship),
            );
        }
        if let Some(photo) = &nominee.photo {
            check_upload(
                errors,
                &format!("nominees[{index}]photo"),
                photo,
                IMAGE_EXTENSIONS,
            );
        }
        if let Some(id_proof) = &nominee.id_proof {
            check_upload(
                errors,
                &format!("nomineeIdProof[{index}]"),
                id_proof,
                DOCUMENT_EXTENSIONS,
            );
        }
        total += i64::from(nominee.share);
    }

    if total != 100 {
        errors.add(
            "nominees",
            format!("Total share must equal 100%. Current total: {total}%"),
        );
    }
}

/// Validate a mapped agent onboarding form.
pub fn validate_agent_form(form: &MappedAgentForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for required in [
        "applicant_role",
        "full_name",
        "email",
        "phone",
        "present_address",
        "permanent_address",
        "dob",
        "nid_number",
    ] {
        if !form.values.contains_key(required) {
            errors.add(required, "This field is required");
        }
    }

    if let Some(role) = form.values.get("applicant_role") {
        if !AGENT_ROLES.contains(&role.as_str()) {
            errors.add(
                "applicantRole",
                format!(
                    "Unknown applicant role: {role}. Allowed: {}",
                    AGENT_ROLES.join(", ")
                ),
            );
        }
    }

    if let Some(phone) = form.values.get("phone") {
        check_phone(&mut errors, "phone", phone, 8);
    }

    check_password_pair(&mut errors, &form.password, &form.confirm_password);

    if !form.agree_terms {
        errors.add("agreeTerms", "You must accept the terms and conditions");
    }

    if let Some(photo) = &form.applicant_photo {
        check_upload(&mut errors, "applicantPhoto", photo, IMAGE_EXTENSIONS);
    } else {
        errors.add("applicantPhoto", "This field is required");
    }
    if let Some(doc) = &form.nid_document {
        check_upload(&mut errors, "nidDocument", doc, DOCUMENT_EXTENSIONS);
    } else {
        errors.add("nidDocument", "This field is required");
    }
    if let Some(doc) = &form.education_certificate {
        check_upload(&mut errors, "educationCertificate", doc, DOCUMENT_EXTENSIONS);
    } else {
        errors.add("educationCertificate", "This field is required");
    }

    errors
}

/// Password plus confirmation: minimum length and exact equality.
pub fn check_password_pair(errors: &mut FieldErrors, password: &str, confirm: &str) {
    if password.len() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long"),
        );
    }
    if confirm.is_empty() {
        errors.add("confirmPassword", "Please confirm your password");
    } else if password != confirm {
        errors.add("confirmPassword", "Passwords do not match");
    }
}

/// Birth year sanity window used by member login.
pub fn check_birth_year(errors: &mut FieldErrors, year: i32) {
    let current = chrono::Utc::now().date_naive().year();
    if year < 1900 {
        errors.add("birthYear", "Birth year must be after 1900");
    } else if year > current {
        errors.add("birthYear", "Birth year cannot be in the future");
    }
}
