//! Payload validation driven by the field registry.

use crate::domain::registry::{form_spec, FieldKind, FieldSpec, SectionSpec, YesNoSpec};
use crate::domain::models::FormType;
use chrono::{Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const MINIMUM_APPLICANT_AGE: u32 = 16;
pub const DATE_FORMAT: &str = "%d/%m/%Y";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email pattern"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ()\-]{6,19}$").expect("invalid phone pattern"));
static PASSPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{6,9}$").expect("invalid passport pattern"));
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("invalid date pattern"));

/// Start/end pairs checked wherever both keys appear in the same object.
const DATE_RANGES: &[(&str, &str)] = &[("dateFrom", "dateTo"), ("issuanceDate", "expirationDate")];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered set of field errors. The first entry is what callers show as the
/// headline message; the whole set drives per-field annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", headline(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

fn headline(errors: &[FieldError]) -> &str {
    errors.first().map_or("Validation failed", |e| e.message.as_str())
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[cfg(test)]
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }

    #[cfg(test)]
    pub fn messages_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    #[cfg(test)]
    pub fn has_error_for(&self, field: &str) -> bool {
        self.messages_for(field).next().is_some()
    }

    pub fn by_field(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            map.entry(error.field.clone())
                .or_default()
                .push(error.message.clone());
        }
        map
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Implemented by typed request payloads that carry their own rules.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Partial saves: formats and explanations only.
    Draft,
    /// Full submission: required fields and section minimums as well.
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YesNoAnswer {
    pub value: YesNo,
    #[serde(default)]
    pub explanation: String,
}

/// Answer for a repeatable section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionAnswer {
    Applicable {
        #[serde(default)]
        entries: Vec<Map<String, Value>>,
    },
    NotApplicable,
}

pub fn is_valid_email(raw: &str) -> bool {
    EMAIL_RE.is_match(raw.trim())
}

pub fn is_valid_phone(raw: &str) -> bool {
    PHONE_RE.is_match(raw.trim())
}

pub fn is_valid_passport_number(raw: &str) -> bool {
    PASSPORT_RE.is_match(&raw.trim().to_uppercase())
}

/// Parses a strict `DD/MM/YYYY` calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if !DATE_RE.is_match(trimmed) {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).ok()
}

pub fn is_valid_date_of_birth(raw: &str, today: NaiveDate) -> bool {
    parse_date(raw).is_some_and(|dob| dob <= today)
}

pub fn meets_minimum_age(dob: NaiveDate, today: NaiveDate, years: u32) -> bool {
    dob.checked_add_months(Months::new(years * 12))
        .is_some_and(|threshold| threshold <= today)
}

pub fn check_date_of_birth(raw: &str, today: NaiveDate) -> Result<NaiveDate, &'static str> {
    let dob = parse_date(raw).ok_or("Invalid date. Use DD/MM/YYYY")?;
    if dob > today {
        return Err("Date of birth cannot be in the future");
    }
    if !meets_minimum_age(dob, today, MINIMUM_APPLICANT_AGE) {
        return Err("Applicant must be at least 16 years old");
    }
    Ok(dob)
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn value_as_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn check_field(
    errors: &mut ValidationErrors,
    path: String,
    spec: &FieldSpec,
    value: Option<&Value>,
    mode: ValidationMode,
    today: NaiveDate,
) {
    let Some(raw) = value_as_text(value) else {
        errors.push(path, format!("{} has an invalid value", spec.label));
        return;
    };
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        if spec.required && mode == ValidationMode::Submit {
            errors.push(path, format!("{} is required", spec.label));
        }
        return;
    }

    let len = trimmed.chars().count();
    if let Some(min) = spec.min_len {
        if len < min {
            errors.push(
                path,
                format!("{} must be at least {} characters", spec.label, min),
            );
            return;
        }
    }
    if let Some(max) = spec.max_len {
        if len > max {
            errors.push(
                path,
                format!("{} must be at most {} characters", spec.label, max),
            );
            return;
        }
    }

    let problem: Option<String> = match spec.kind {
        FieldKind::Text | FieldKind::TextArea | FieldKind::Country => None,
        FieldKind::Email => (!is_valid_email(trimmed)).then(|| "Invalid email address".to_string()),
        FieldKind::Phone => (!is_valid_phone(trimmed)).then(|| "Invalid phone number".to_string()),
        FieldKind::PassportNumber => (!is_valid_passport_number(trimmed))
            .then(|| "Passport number must be 6 to 9 letters or digits".to_string()),
        FieldKind::Date => parse_date(trimmed)
            .is_none()
            .then(|| "Invalid date. Use DD/MM/YYYY".to_string()),
        FieldKind::DateOfBirth => check_date_of_birth(trimmed, today).err().map(str::to_string),
        FieldKind::Number => trimmed
            .parse::<u32>()
            .is_err()
            .then(|| format!("{} must be a whole number", spec.label)),
        FieldKind::Select(options) => (!options.contains(&trimmed))
            .then(|| format!("Select a valid option for {}", spec.label)),
    };

    if let Some(message) = problem {
        errors.push(path, message);
    }
}

fn check_date_ranges(errors: &mut ValidationErrors, prefix: &str, object: &Map<String, Value>) {
    for (from_key, to_key) in DATE_RANGES {
        let from = object.get(*from_key).and_then(Value::as_str).and_then(parse_date);
        let to = object.get(*to_key).and_then(Value::as_str).and_then(parse_date);
        if let (Some(from), Some(to)) = (from, to) {
            if to < from {
                errors.push(join(prefix, to_key), "End date must not be before start date");
            }
        }
    }
}

fn check_yes_no(
    errors: &mut ValidationErrors,
    spec: &YesNoSpec,
    value: Option<&Value>,
    mode: ValidationMode,
) {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        if mode == ValidationMode::Submit {
            errors.push(spec.name, "Please answer Yes or No");
        }
        return;
    };

    match serde_json::from_value::<YesNoAnswer>(value.clone()) {
        Ok(answer) => {
            let explanation = answer.explanation.trim();
            if answer.value == YesNo::Yes && explanation.is_empty() {
                errors.push(join(spec.name, "explanation"), "Please provide an explanation");
            } else if explanation.chars().count() > 2000 {
                errors.push(
                    join(spec.name, "explanation"),
                    "Explanation must be at most 2000 characters",
                );
            }
        }
        Err(_) => errors.push(spec.name, "Please answer Yes or No"),
    }
}

fn check_section(
    errors: &mut ValidationErrors,
    spec: &SectionSpec,
    value: Option<&Value>,
    mode: ValidationMode,
    today: NaiveDate,
) {
    let answer = match value.filter(|v| !v.is_null()) {
        None => SectionAnswer::Applicable { entries: Vec::new() },
        Some(v) => match serde_json::from_value::<SectionAnswer>(v.clone()) {
            Ok(answer) => answer,
            Err(_) => {
                errors.push(spec.name, format!("{} has an invalid value", spec.label));
                return;
            }
        },
    };

    let entries = match answer {
        SectionAnswer::NotApplicable if spec.allow_not_applicable => return,
        SectionAnswer::NotApplicable => {
            errors.push(
                spec.name,
                format!("{} cannot be marked as not applicable", spec.label),
            );
            return;
        }
        SectionAnswer::Applicable { entries } => entries,
    };

    if entries.len() > spec.max_entries {
        errors.push(
            spec.name,
            format!("{} allows at most {} entries", spec.label, spec.max_entries),
        );
    }
    if mode == ValidationMode::Submit && entries.len() < spec.min_entries {
        errors.push(
            spec.name,
            format!("Add at least {} entry to {}", spec.min_entries, spec.label),
        );
    }

    for (index, entry) in entries.iter().enumerate() {
        let prefix = format!("{}.{}", spec.name, index);
        for key in entry.keys() {
            if spec.field(key).is_none() {
                errors.push(join(&prefix, key), "Unknown field");
            }
        }
        for field in spec.fields {
            check_field(
                errors,
                join(&prefix, field.name),
                field,
                entry.get(field.name),
                mode,
                today,
            );
        }
        check_date_ranges(errors, &prefix, entry);
    }
}

/// Validates a form payload against the registry for `form_type`.
pub fn validate_form(
    form_type: FormType,
    data: &Value,
    mode: ValidationMode,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    let spec = form_spec(form_type);
    let Some(object) = data.as_object() else {
        return Err(ValidationErrors::single("formData", "Form data must be an object"));
    };

    let mut errors = ValidationErrors::new();

    for key in object.keys() {
        if !spec.keys().any(|k| k == key.as_str()) {
            errors.push(key.clone(), "Unknown field");
        }
    }

    for field in spec.fields {
        check_field(
            &mut errors,
            field.name.to_string(),
            field,
            object.get(field.name),
            mode,
            today,
        );
    }
    check_date_ranges(&mut errors, "", object);

    for question in spec.yes_no {
        check_yes_no(&mut errors, question, object.get(question.name), mode);
    }

    for section in spec.sections {
        check_section(&mut errors, section, object.get(section.name), mode, today);
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registry::generate_default_values;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    fn defaults(form_type: FormType) -> Map<String, Value> {
        generate_default_values(form_type)
    }

    #[test]
    fn headline_is_the_first_error() {
        assert_eq!(ValidationErrors::new().to_string(), "Validation failed");
        let mut errors = ValidationErrors::single("email", "Invalid email address");
        errors.push("password", "Password is required");
        assert_eq!(errors.to_string(), "Invalid email address");
    }

    #[test]
    fn defaults_pass_as_draft_for_every_form() {
        for form_type in FormType::ALL {
            let data = Value::Object(defaults(form_type));
            assert!(
                validate_form(form_type, &data, ValidationMode::Draft, today()).is_ok(),
                "defaults rejected for {}",
                form_type
            );
        }
    }

    #[test]
    fn yes_requires_explanation_for_every_question() {
        for form_type in FormType::ALL {
            for question in form_spec(form_type).yes_no {
                let explanation_path = format!("{}.explanation", question.name);

                for blank in ["", "   ", "\n\t"] {
                    let mut data = defaults(form_type);
                    data.insert(
                        question.name.to_string(),
                        json!({ "value": "Yes", "explanation": blank }),
                    );
                    let errors =
                        validate_form(form_type, &Value::Object(data), ValidationMode::Draft, today())
                            .unwrap_err();
                    assert!(errors.has_error_for(&explanation_path));
                }

                let mut data = defaults(form_type);
                data.insert(
                    question.name.to_string(),
                    json!({ "value": "Yes", "explanation": "Visited in 2019 for a conference" }),
                );
                assert!(validate_form(form_type, &Value::Object(data), ValidationMode::Draft, today()).is_ok());

                let mut data = defaults(form_type);
                data.insert(question.name.to_string(), json!({ "value": "No", "explanation": "" }));
                assert!(validate_form(form_type, &Value::Object(data), ValidationMode::Draft, today()).is_ok());
            }
        }
    }

    #[test]
    fn submit_enforces_required_fields() {
        let data = Value::Object(defaults(FormType::PassportInfo));
        let errors = validate_form(FormType::PassportInfo, &data, ValidationMode::Submit, today())
            .unwrap_err();
        assert_eq!(errors.first_message(), Some("Passport Type is required"));
        assert!(errors.has_error_for("passportNumber"));
        assert!(!errors.has_error_for("passportBookNumber"));
    }

    #[test]
    fn complete_work_history_submits() {
        let data = json!({
            "primaryOccupation": "Employed",
            "wasDismissed": { "value": "No", "explanation": "" },
            "workHistory": {
                "status": "APPLICABLE",
                "entries": [{
                    "companyName": "Acme Logistics",
                    "jobTitle": "Dispatcher",
                    "address": "12 Harbour Road, Gdansk",
                    "phone": "+48 58 123 4567",
                    "dateFrom": "01/03/2018",
                    "dateTo": "",
                    "duties": "Scheduling freight and drivers"
                }]
            }
        });
        assert!(validate_form(FormType::WorkHistory, &data, ValidationMode::Submit, today()).is_ok());
    }

    #[test]
    fn section_rules() {
        let mut data = defaults(FormType::EducationInfo);
        data.insert("education".into(), json!({ "status": "NOT_APPLICABLE" }));
        let errors = validate_form(
            FormType::EducationInfo,
            &Value::Object(data),
            ValidationMode::Draft,
            today(),
        )
        .unwrap_err();
        assert!(errors.has_error_for("education"));

        let mut data = defaults(FormType::WorkHistory);
        data.insert("primaryOccupation".into(), json!("Student"));
        data.insert("workHistory".into(), json!({ "status": "NOT_APPLICABLE" }));
        assert!(validate_form(
            FormType::WorkHistory,
            &Value::Object(data),
            ValidationMode::Submit,
            today()
        )
        .is_ok());

        let data = json!({
            "highestLevel": "Master",
            "education": { "status": "APPLICABLE", "entries": [] }
        });
        let errors = validate_form(FormType::EducationInfo, &data, ValidationMode::Submit, today())
            .unwrap_err();
        assert_eq!(errors.first_message(), Some("Add at least 1 entry to Education"));
    }

    #[test]
    fn entry_fields_are_addressed_by_path() {
        let data = json!({
            "primaryOccupation": "Employed",
            "wasDismissed": { "value": "No" },
            "workHistory": {
                "status": "APPLICABLE",
                "entries": [{
                    "companyName": "A",
                    "jobTitle": "Clerk",
                    "address": "Main St 1",
                    "dateFrom": "01/01/2020",
                    "dateTo": "01/01/2019",
                    "duties": "Filing",
                    "salary": "1000"
                }]
            }
        });
        let errors = validate_form(FormType::WorkHistory, &data, ValidationMode::Submit, today())
            .unwrap_err();
        assert!(errors.has_error_for("workHistory.0.salary"));
        assert!(errors.has_error_for("workHistory.0.companyName"));
        assert!(errors.has_error_for("workHistory.0.dateTo"));
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let mut data = defaults(FormType::ContactInfo);
        data.insert("favouriteColour".into(), json!("blue"));
        let errors = validate_form(
            FormType::ContactInfo,
            &Value::Object(data),
            ValidationMode::Draft,
            today(),
        )
        .unwrap_err();
        assert_eq!(errors.by_field()["favouriteColour"], vec!["Unknown field".to_string()]);

        let errors =
            validate_form(FormType::ContactInfo, &json!([1, 2]), ValidationMode::Draft, today())
                .unwrap_err();
        assert!(errors.has_error_for("formData"));
    }

    #[test]
    fn format_checks_apply_in_draft_mode() {
        let mut data = defaults(FormType::ContactInfo);
        data.insert("email".into(), json!("not-an-email"));
        data.insert("primaryPhone".into(), json!("call me"));
        let errors = validate_form(
            FormType::ContactInfo,
            &Value::Object(data),
            ValidationMode::Draft,
            today(),
        )
        .unwrap_err();
        assert_eq!(errors.messages_for("email").collect::<Vec<_>>(), vec!["Invalid email address"]);
        assert_eq!(
            errors.messages_for("primaryPhone").collect::<Vec<_>>(),
            vec!["Invalid phone number"]
        );
    }

    #[test]
    fn date_of_birth_rules() {
        assert!(!is_valid_date_of_birth("31/02/2020", today()));
        assert!(!is_valid_date_of_birth("2000-01-01", today()));
        assert!(is_valid_date_of_birth("01/01/2000", today()));

        let child_today = NaiveDate::from_ymd_opt(2015, 6, 1).unwrap();
        assert_eq!(
            check_date_of_birth("01/01/2000", child_today),
            Err("Applicant must be at least 16 years old")
        );
        assert!(check_date_of_birth("01/01/2000", today()).is_ok());

        let birthday = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        assert!(meets_minimum_age(
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            birthday,
            MINIMUM_APPLICANT_AGE
        ));
    }

    #[test]
    fn passport_and_phone_formats() {
        assert!(is_valid_passport_number("ab1234567"));
        assert!(!is_valid_passport_number("AB-12345"));
        assert!(!is_valid_passport_number("A1234"));
        assert!(is_valid_phone("+1 (555) 010-2030"));
        assert!(!is_valid_phone("12"));
    }

    #[test]
    fn first_error_wins_the_headline() {
        let mut errors = ValidationErrors::new();
        errors.push("a", "first");
        errors.push("b", "second");
        assert_eq!(errors.to_string(), "first");
        assert_eq!(errors.len(), 2);
        assert_eq!(ValidationErrors::new().to_string(), "Validation failed");
    }
}
