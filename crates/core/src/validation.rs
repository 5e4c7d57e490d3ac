use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{Faculty, Job, Notice, Round};

/// Per-field validation messages for a rejected form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{form} form has {} invalid field(s)", .errors.len())]
pub struct ValidationError {
    pub form: &'static str,
    pub errors: BTreeMap<String, String>,
}

/// Forms checked before anything is sent to the backend.
pub trait Validate {
    const FORM: &'static str;

    fn collect_errors(&self, errors: &mut FieldErrors);

    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        self.collect_errors(&mut errors);
        errors.into_result(Self::FORM)
    }
}

/// Accumulator used while checking a form.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn required(&mut self, field: &str, value: Option<&str>) {
        if is_blank(value) {
            self.push(field, "is required");
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => self.push(field, "is required"),
            Some(email) if !is_valid_email(email) => self.push(field, "must be a valid email address"),
            Some(_) => {}
        }
    }

    pub fn phone(&mut self, field: &str, value: Option<&str>) {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => self.push(field, "is required"),
            Some(phone) if !is_valid_phone(phone) => {
                self.push(field, "must contain 10 to 15 digits")
            }
            Some(_) => {}
        }
    }

    pub fn optional_date(&mut self, field: &str, value: Option<&str>) {
        if let Some(date) = value.map(str::trim).filter(|v| !v.is_empty()) {
            if !is_valid_date(date) {
                self.push(field, "must be a date in YYYY-MM-DD format");
            }
        }
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn into_result(self, form: &'static str) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                form,
                errors: self.errors,
            })
        }
    }
}

/// Student add/edit form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentForm {
    #[serde(default, deserialize_with = "crate::types::lenient_string")]
    pub name: Option<String>,
    #[serde(
        rename = "registered_number",
        alias = "registeredNumber",
        default,
        deserialize_with = "crate::types::lenient_string"
    )]
    pub registered_number: Option<String>,
    #[serde(default, deserialize_with = "crate::types::lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "crate::types::lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "crate::types::lenient_id")]
    pub college_id: Option<String>,
    #[serde(default, deserialize_with = "crate::types::lenient_id")]
    pub department_id: Option<String>,
    #[serde(default, deserialize_with = "crate::types::lenient_id")]
    pub program_id: Option<String>,
    #[serde(
        default,
        alias = "graduation_year",
        deserialize_with = "crate::types::lenient_string"
    )]
    pub graduation_year: Option<String>,
    #[serde(default, deserialize_with = "crate::types::lenient_bool")]
    pub can_apply: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Validate for StudentForm {
    const FORM: &'static str = "student";

    fn collect_errors(&self, errors: &mut FieldErrors) {
        errors.required("name", self.name.as_deref());
        errors.required("registered_number", self.registered_number.as_deref());
        errors.email("email", self.email.as_deref());
        errors.phone("phone", self.phone.as_deref());
        errors.required("departmentId", self.department_id.as_deref());
        if let Some(year) = self.graduation_year.as_deref().filter(|y| !y.trim().is_empty()) {
            if crate::types::parse_leading_int(year).is_none() {
                errors.push("graduationYear", "must be a year");
            }
        }
    }
}

/// Department add form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentForm {
    #[serde(default, deserialize_with = "crate::types::lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::types::lenient_id")]
    pub college_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Validate for DepartmentForm {
    const FORM: &'static str = "department";

    fn collect_errors(&self, errors: &mut FieldErrors) {
        errors.required("name", self.name.as_deref());
        errors.required("collegeId", self.college_id.as_deref());
    }
}

impl Validate for Faculty {
    const FORM: &'static str = "faculty";

    fn collect_errors(&self, errors: &mut FieldErrors) {
        errors.required("name", self.name.as_deref());
        errors.email("email", self.email.as_deref());
        errors.phone("phone", self.phone.as_deref());
        errors.required("departmentId", self.department_id.as_deref());
    }
}

impl Validate for Job {
    const FORM: &'static str = "job";

    fn collect_errors(&self, errors: &mut FieldErrors) {
        errors.required("companyName", self.company_name.as_deref());
        errors.required("title", self.title.as_deref());
        if let Some(ctc) = &self.ctc {
            match ctc.as_number() {
                Some(value) if value >= 0.0 => {}
                _ => errors.push("ctc", "must be a non-negative number"),
            }
        }
        errors.optional_date("deadline", self.deadline.as_deref());
        for (position, round) in self.rounds.iter().enumerate() {
            round_errors(errors, position, round);
        }
    }
}

/// Rounds submitted for an existing job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundsForm {
    #[serde(default, deserialize_with = "crate::types::null_as_empty")]
    pub rounds: Vec<Round>,
}

impl Validate for RoundsForm {
    const FORM: &'static str = "rounds";

    fn collect_errors(&self, errors: &mut FieldErrors) {
        if self.rounds.is_empty() {
            errors.push("rounds", "add at least one round");
        }
        for (position, round) in self.rounds.iter().enumerate() {
            round_errors(errors, position, round);
        }
    }
}

impl Validate for Notice {
    const FORM: &'static str = "notice";

    fn collect_errors(&self, errors: &mut FieldErrors) {
        errors.required("title", self.title.as_deref());
        errors.required("description", self.description.as_deref());
    }
}

fn round_errors(errors: &mut FieldErrors, position: usize, round: &Round) {
    errors.required(&format!("rounds[{position}].name"), round.name.as_deref());
    errors.optional_date(&format!("rounds[{position}].date"), round.date.as_deref());
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// `local@domain.tld` with no whitespace and a dotted domain.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// 10 to 15 digits, optionally prefixed with `+`; spaces and dashes ignored.
pub fn is_valid_phone(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_valid_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn complete_student_form_passes() {
        let form: StudentForm = serde_json::from_value(json!({
            "name": "Asha Verma",
            "registered_number": "REG001",
            "email": "asha@example.edu",
            "phone": "+91 98765-43210",
            "departmentId": "d-1",
            "graduationYear": 2025,
            "canApply": "true"
        }))
        .expect("form parses");

        assert!(form.can_apply);
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn missing_and_malformed_fields_are_reported_per_field() {
        let form = StudentForm {
            name: Some("  ".to_string()),
            email: Some("asha@localhost".to_string()),
            phone: Some("12345".to_string()),
            ..StudentForm::default()
        };

        let err = form.validate().expect_err("form is invalid");
        assert_eq!(err.form, "student");
        assert_eq!(err.errors.get("name").map(String::as_str), Some("is required"));
        assert_eq!(
            err.errors.get("email").map(String::as_str),
            Some("must be a valid email address")
        );
        assert_eq!(
            err.errors.get("phone").map(String::as_str),
            Some("must contain 10 to 15 digits")
        );
        assert!(err.errors.contains_key("registered_number"));
        assert!(err.errors.contains_key("departmentId"));
    }

    #[test]
    fn email_rules() {
        assert!(is_valid_email("a.b@dept.college.edu"));
        assert!(!is_valid_email("a b@college.edu"));
        assert!(!is_valid_email("@college.edu"));
        assert!(!is_valid_email("a@college."));
        assert!(!is_valid_email("a@@college.edu"));
    }

    #[test]
    fn phone_rules() {
        assert!(is_valid_phone("9876543210"));
        assert!(is_valid_phone("+919876543210"));
        assert!(!is_valid_phone("98765abc10"));
        assert!(!is_valid_phone("+91"));
    }

    #[test]
    fn job_requires_company_and_title_and_checks_ctc() {
        let job: Job = serde_json::from_value(json!({
            "companyName": "Acme",
            "ctc": "-2",
            "deadline": "31/12/2024",
            "rounds": [{ "date": "2024-09-01" }]
        }))
        .expect("job parses");

        let err = job.validate().expect_err("job is invalid");
        assert!(err.errors.contains_key("title"));
        assert!(err.errors.contains_key("ctc"));
        assert!(err.errors.contains_key("deadline"));
        assert!(err.errors.contains_key("rounds[0].name"));
        assert!(!err.errors.contains_key("companyName"));
    }

    #[test]
    fn rounds_form_needs_at_least_one_round() {
        let err = RoundsForm::default().validate().expect_err("empty rounds");
        assert!(err.errors.contains_key("rounds"));

        let form: RoundsForm = serde_json::from_value(json!({
            "rounds": [{ "roundName": "Technical", "date": "2024-09-01T10:00:00Z" }]
        }))
        .expect("rounds parse");
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn notice_and_department_forms() {
        let notice: Notice =
            serde_json::from_value(json!({ "title": "Drive" })).expect("notice parses");
        let err = notice.validate().expect_err("description missing");
        assert_eq!(err.errors.len(), 1);

        let department = DepartmentForm {
            name: Some("Civil".to_string()),
            college_id: Some("c-1".to_string()),
            ..DepartmentForm::default()
        };
        assert_eq!(department.validate(), Ok(()));
    }
}
