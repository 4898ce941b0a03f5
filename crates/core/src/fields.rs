//! External-to-internal field mapping for submitted forms.
//!
//! The public membership and agent forms post camelCase multipart fields;
//! storage uses snake_case column names. Mapping is allow-list driven: every
//! recognized external key appears in an explicit rename table and anything
//! else is ignored. Nominees arrive as indexed keys (`nominees[0]name`,
//! `nominees[0]share`, ...) and are collected in ascending index order until
//! the first missing index.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::validation::FieldErrors;

/// Metadata for one uploaded file, captured during multipart intake.
///
/// The byte payload stays with the HTTP layer; mapping and validation only
/// need the name, size, and declared content type.
#[derive(Debug, Clone)]
pub struct FileMeta {
    pub filename: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

/// Normalized multipart payload: scalar text fields plus file metadata,
/// keyed by the external field name.
#[derive(Debug, Default)]
pub struct FormFields {
    texts: BTreeMap<String, String>,
    files: BTreeMap<String, FileMeta>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.texts.insert(key.into(), value.into());
    }

    pub fn insert_file(&mut self, key: impl Into<String>, meta: FileMeta) {
        self.files.insert(key.into(), meta);
    }

    /// Non-empty text value for an external key.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.texts
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn file(&self, key: &str) -> Option<&FileMeta> {
        self.files.get(key)
    }

    pub fn text_keys(&self) -> impl Iterator<Item = &str> {
        self.texts.keys().map(String::as_str)
    }
}

/// Scalar rename table for the membership form (external -> internal).
pub const MEMBERSHIP_FIELD_MAP: &[(&str, &str)] = &[
    ("foCode", "fo_code"),
    ("foName", "fo_name"),
    ("membershipType", "membership_type"),
    ("gender", "gender"),
    ("nameBangla", "name_bangla"),
    ("nameEnglish", "name_english"),
    ("fatherName", "father_name"),
    ("motherName", "mother_name"),
    ("spouseName", "spouse_name"),
    ("mobile", "mobile"),
    ("email", "email"),
    ("dob", "dob"),
    ("nationality", "nationality"),
    ("nidNumber", "nid_number"),
    ("passportNumber", "passport_number"),
    ("drivingLicense", "driving_license"),
    ("maritalStatus", "marital_status"),
    ("education", "education"),
    ("professionalQualifications", "professional_qualifications"),
    ("occupation", "occupation"),
    ("organizationName", "organization_name"),
    ("organizationDetails", "organization_details"),
    ("dailyWork", "daily_work"),
    ("incomeSource", "income_source"),
    ("numberOfChildren", "number_of_children"),
    ("presentAddress", "present_address"),
    ("permanentAddress", "permanent_address"),
    ("weight", "weight"),
    ("height", "height"),
    ("chest", "chest"),
    ("bloodGroup", "blood_group"),
    ("surgeryDetails", "surgery_details"),
    ("emergencyContactName", "emergency_contact_name"),
    ("emergencyContactNumber", "emergency_contact_number"),
];

/// File slots on the membership form (external -> internal).
pub const MEMBERSHIP_FILE_MAP: &[(&str, &str)] = &[
    ("photo", "photo"),
    ("ageProofDoc", "age_proof_doc"),
    ("licenseDoc", "license_doc"),
];

/// Scalar rename table for the agent onboarding form.
pub const AGENT_FIELD_MAP: &[(&str, &str)] = &[
    ("applicantRole", "applicant_role"),
    ("agentId", "agent_id"),
    ("fmName", "fm_name"),
    ("roleCode", "role_code"),
    ("dgmName", "dgm_name"),
    ("dgmCode", "dgm_code"),
    ("gmName", "gm_name"),
    ("gmCode", "gm_code"),
    ("fullName", "full_name"),
    ("email", "email"),
    ("phone", "phone"),
    ("address", "address"),
    ("guardianName", "guardian_name"),
    ("motherName", "mother_name"),
    ("presentAddress", "present_address"),
    ("permanentAddress", "permanent_address"),
    ("dob", "dob"),
    ("birthPlace", "birth_place"),
    ("nidNumber", "nid_number"),
    ("bankAccountNumber", "bank_account_number"),
    ("bankName", "bank_name"),
    ("bankBranchName", "bank_branch_name"),
];

/// File slots on the agent form.
pub const AGENT_FILE_MAP: &[(&str, &str)] = &[
    ("applicantPhoto", "applicant_photo"),
    ("nidDocument", "nid_document"),
    ("educationCertificate", "education_certificate"),
];

/// Closed set of nominee relationship categories.
pub const RELATIONSHIPS: &[&str] = &["child", "spouse", "father", "mother", "sibling"];

/// Closed set of agent applicant roles.
pub const AGENT_ROLES: &[&str] = &["FO", "FM", "DGM", "GM"];

/// Fallback category when a free-text relation label is not recognized.
pub const DEFAULT_RELATIONSHIP: &str = "child";

/// Normalize a free-text relation label to the closed relationship set.
///
/// Unrecognized labels fall back to [`DEFAULT_RELATIONSHIP`] rather than
/// being dropped.
pub fn normalize_relationship(relation: &str) -> &'static str {
    match relation.trim().to_lowercase().as_str() {
        "son" | "daughter" | "child" => "child",
        "wife" | "husband" | "spouse" => "spouse",
        "father" => "father",
        "mother" => "mother",
        "brother" | "sister" | "sibling" => "sibling",
        _ => DEFAULT_RELATIONSHIP,
    }
}

/// Map external marketing-tier names onto internal membership categories.
///
/// Unrecognized values pass through unchanged so the validation layer can
/// report them against the closed set.
pub fn normalize_membership_type(value: &str) -> String {
    match value.trim().to_lowercase().as_str() {
        "silver" | "bronze" => "individual".to_string(),
        "gold" => "family".to_string(),
        "executive" => "corporate".to_string(),
        other => other.to_string(),
    }
}

/// Map external marital-status labels onto internal categories.
pub fn normalize_marital_status(value: &str) -> String {
    match value.trim().to_lowercase().as_str() {
        "unmarried" => "single".to_string(),
        "others" => "widowed".to_string(),
        other => other.to_string(),
    }
}

/// Coerce a form value to a boolean. Accepts `true`, `1`, `yes`, `on`
/// (case-insensitive); anything else, including absent, is `false`.
pub fn coerce_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}

/// Whole years between a date of birth and `today`. Recomputed on every
/// save so the stored age never drifts from the date of birth.
pub fn age_on(dob: chrono::NaiveDate, today: chrono::NaiveDate) -> i32 {
    use chrono::Datelike;
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

/// Convert an annual income figure to monthly, rounded to 2 decimal places.
pub fn annual_to_monthly(annual: &str) -> Option<Decimal> {
    let annual = Decimal::from_str(annual.trim()).ok()?;
    Some((annual / Decimal::from(12)).round_dp(2))
}

/// One nominee parsed from the indexed form keys.
#[derive(Debug, Clone)]
pub struct NomineeInput {
    pub name: String,
    /// Raw relation label as submitted.
    pub relation: String,
    /// Normalized relationship category.
    pub relationship: &'static str,
    pub share: i32,
    pub age: i32,
    pub photo: Option<FileMeta>,
    pub id_proof: Option<FileMeta>,
}

/// Membership form after external-to-internal mapping.
#[derive(Debug, Default)]
pub struct MappedMembershipForm {
    /// Internal scalar column name -> value.
    pub values: BTreeMap<&'static str, String>,
    pub monthly_income: Option<Decimal>,
    /// Age-proof selections, decoded from the `ageProof` JSON array field.
    pub age_proof: Vec<String>,
    pub accept_terms: bool,
    pub nominees: Vec<NomineeInput>,
    pub photo: Option<FileMeta>,
    pub age_proof_doc: Option<FileMeta>,
    pub license_doc: Option<FileMeta>,
    pub medical_records: Vec<(String, FileMeta)>,
}

/// Translate a raw membership payload into internal attribute names.
///
/// Mapping itself never drops data silently: a malformed `annualIncome` or
/// nominee share is recorded in `errors` instead of being skipped.
pub fn map_membership_form(form: &FormFields, errors: &mut FieldErrors) -> MappedMembershipForm {
    let mut mapped = MappedMembershipForm::default();

    for (external, internal) in MEMBERSHIP_FIELD_MAP {
        if let Some(value) = form.text(external) {
            mapped.values.insert(internal, value.trim().to_string());
        }
    }

    if let Some(tier) = mapped.values.get("membership_type").cloned() {
        mapped
            .values
            .insert("membership_type", normalize_membership_type(&tier));
    }
    if let Some(marital) = mapped.values.get("marital_status").cloned() {
        mapped
            .values
            .insert("marital_status", normalize_marital_status(&marital));
    }

    if let Some(annual) = form.text("annualIncome") {
        match annual_to_monthly(annual) {
            Some(monthly) => mapped.monthly_income = Some(monthly),
            None => errors.add(
                "annualIncome",
                format!("Annual income is not a valid number: {annual}"),
            ),
        }
    } else if let Some(monthly) = form.text("monthlyIncome") {
        match Decimal::from_str(monthly.trim()) {
            Ok(value) => mapped.monthly_income = Some(value.round_dp(2)),
            Err(_) => errors.add(
                "monthlyIncome",
                format!("Monthly income is not a valid number: {monthly}"),
            ),
        }
    }

    mapped.age_proof = parse_age_proof(form.text("ageProof"));
    mapped.accept_terms = coerce_bool(form.text("acceptTerms"));
    mapped.nominees = parse_nominees(form, errors);

    mapped.photo = form.file("photo").cloned();
    mapped.age_proof_doc = form.file("ageProofDoc").cloned();
    mapped.license_doc = form.file("licenseDoc").cloned();

    mapped.medical_records = collect_medical_records(form);

    mapped
}

fn collect_medical_records(form: &FormFields) -> Vec<(String, FileMeta)> {
    let mut records = Vec::new();
    if let Some(meta) = form.file("medicalRecords") {
        records.push(("medicalRecords".to_string(), meta.clone()));
    }
    let mut index = 0;
    loop {
        let key = format!("medicalRecords[{index}]");
        match form.file(&key) {
            Some(meta) => records.push((key, meta.clone())),
            None => break,
        }
        index += 1;
    }
    records
}

/// Decode the `ageProof` field: a JSON array, a JSON scalar, or a bare string.
fn parse_age_proof(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .collect(),
        Ok(serde_json::Value::String(s)) => vec![s],
        Ok(other) => vec![other.to_string()],
        Err(_) => vec![raw.to_string()],
    }
}

/// Collect indexed nominee records in ascending order; an index gap
/// terminates collection.
fn parse_nominees(form: &FormFields, errors: &mut FieldErrors) -> Vec<NomineeInput> {
    let mut nominees = Vec::new();
    let mut index = 0;
    loop {
        let name_key = format!("nominees[{index}]name");
        let Some(name) = form.text(&name_key) else {
            break;
        };

        let relation = form
            .text(&format!("nominees[{index}]relation"))
            .unwrap_or("")
            .to_string();

        let share = parse_numeric_field(
            form,
            &format!("nominees[{index}]share"),
            errors,
        );
        let age = parse_numeric_field(form, &format!("nominees[{index}]age"), errors);

        nominees.push(NomineeInput {
            name: name.to_string(),
            relationship: normalize_relationship(&relation),
            relation,
            share,
            age,
            photo: form.file(&format!("nominees[{index}]photo")).cloned(),
            id_proof: form.file(&format!("nomineeIdProof[{index}]")).cloned(),
        });
        index += 1;
    }
    nominees
}

fn parse_numeric_field(form: &FormFields, key: &str, errors: &mut FieldErrors) -> i32 {
    match form.text(key) {
        None => 0,
        Some(raw) => match raw.trim().parse::<i32>() {
            Ok(value) => value,
            Err(_) => {
                errors.add(key, format!("Must be a whole number, got: {raw}"));
                0
            }
        },
    }
}

/// Agent onboarding form after external-to-internal mapping.
#[derive(Debug, Default)]
pub struct MappedAgentForm {
    pub values: BTreeMap<&'static str, String>,
    pub password: String,
    pub confirm_password: String,
    pub agree_terms: bool,
    pub applicant_photo: Option<FileMeta>,
    pub nid_document: Option<FileMeta>,
    pub education_certificate: Option<FileMeta>,
}

/// Translate a raw agent onboarding payload into internal attribute names.
pub fn map_agent_form(form: &FormFields) -> MappedAgentForm {
    let mut mapped = MappedAgentForm::default();

    for (external, internal) in AGENT_FIELD_MAP {
        if let Some(value) = form.text(external) {
            mapped.values.insert(internal, value.trim().to_string());
        }
    }

    // Strip internal whitespace so downstream digit checks see one format.
    if let Some(phone) = mapped.values.get("phone").cloned() {
        mapped.values.insert("phone", phone.replace(' ', ""));
    }

    mapped.password = form.text("password").unwrap_or("").to_string();
    mapped.confirm_password = form.text("confirmPassword").unwrap_or("").to_string();
    mapped.agree_terms = coerce_bool(form.text("agreeTerms"));

    mapped.applicant_photo = form.file("applicantPhoto").cloned();
    mapped.nid_document = form.file("nidDocument").cloned();
    mapped.education_certificate = form.file("educationCertificate").cloned();

    mapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        let mut form = FormFields::new();
        for (k, v) in pairs {
            form.insert_text(*k, *v);
        }
        form
    }

    #[test]
    fn scalar_rename_skips_empty_values() {
        let form = form(&[
            ("nameEnglish", "Rahim Uddin"),
            ("fatherName", "   "),
            ("unknownKey", "ignored"),
        ]);
        let mut errors = FieldErrors::new();
        let mapped = map_membership_form(&form, &mut errors);
        assert_eq!(mapped.values.get("name_english").unwrap(), "Rahim Uddin");
        assert!(!mapped.values.contains_key("father_name"));
        assert!(errors.is_empty());
    }

    #[test]
    fn nominee_collection_stops_at_gap() {
        let form = form(&[
            ("nominees[0]name", "Karim"),
            ("nominees[0]relation", "Son"),
            ("nominees[0]share", "60"),
            ("nominees[1]name", "Fatima"),
            ("nominees[1]relation", "wife"),
            ("nominees[1]share", "40"),
            // Index 2 missing; index 3 must not be collected.
            ("nominees[3]name", "Orphaned"),
        ]);
        let mut errors = FieldErrors::new();
        let mapped = map_membership_form(&form, &mut errors);
        assert_eq!(mapped.nominees.len(), 2);
        assert_eq!(mapped.nominees[0].relationship, "child");
        assert_eq!(mapped.nominees[1].relationship, "spouse");
        assert_eq!(mapped.nominees[0].share, 60);
    }

    #[test]
    fn unrecognized_relation_falls_back_to_default() {
        assert_eq!(normalize_relationship("cousin"), DEFAULT_RELATIONSHIP);
        assert_eq!(normalize_relationship("Brother "), "sibling");
        assert_eq!(normalize_relationship("DAUGHTER"), "child");
    }

    #[test]
    fn tier_names_map_many_to_one() {
        assert_eq!(normalize_membership_type("Silver"), "individual");
        assert_eq!(normalize_membership_type("bronze"), "individual");
        assert_eq!(normalize_membership_type("gold"), "family");
        assert_eq!(normalize_membership_type("executive"), "corporate");
        // Unrecognized values pass through for validation to reject.
        assert_eq!(normalize_membership_type("platinum"), "platinum");
    }

    #[test]
    fn boolean_coercion_accepts_documented_truthy_set() {
        for truthy in ["true", "TRUE", "1", "yes", "On"] {
            assert!(coerce_bool(Some(truthy)), "{truthy} should coerce to true");
        }
        for falsy in ["false", "0", "no", "off", "anything"] {
            assert!(!coerce_bool(Some(falsy)), "{falsy} should coerce to false");
        }
        assert!(!coerce_bool(None));
    }

    #[test]
    fn annual_income_converts_to_monthly() {
        let form = form(&[("annualIncome", "120000")]);
        let mut errors = FieldErrors::new();
        let mapped = map_membership_form(&form, &mut errors);
        assert_eq!(mapped.monthly_income.unwrap().to_string(), "10000.00");
    }

    #[test]
    fn malformed_annual_income_is_a_validation_error() {
        let form = form(&[("annualIncome", "a lot")]);
        let mut errors = FieldErrors::new();
        let mapped = map_membership_form(&form, &mut errors);
        assert!(mapped.monthly_income.is_none());
        assert!(errors.get("annualIncome").is_some());
    }

    #[test]
    fn age_proof_accepts_json_array_or_bare_string() {
        assert_eq!(
            parse_age_proof(Some(r#"["nid","passport"]"#)),
            vec!["nid".to_string(), "passport".to_string()]
        );
        assert_eq!(parse_age_proof(Some("nid")), vec!["nid".to_string()]);
        assert!(parse_age_proof(None).is_empty());
    }

    #[test]
    fn age_counts_whole_years_only() {
        use chrono::NaiveDate;
        let dob = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
        let before_birthday = NaiveDate::from_ymd_opt(2026, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        assert_eq!(age_on(dob, before_birthday), 35);
        assert_eq!(age_on(dob, on_birthday), 36);
    }

    #[test]
    fn agent_phone_is_normalized() {
        let mut form = FormFields::new();
        form.insert_text("phone", "+880 17 1234 5678");
        let mapped = map_agent_form(&form);
        assert_eq!(mapped.values.get("phone").unwrap(), "+8801712345678");
    }
}
