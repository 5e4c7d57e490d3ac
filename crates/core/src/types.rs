use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Student record as returned by the placement report and student endpoints.
///
/// Backend payloads are loosely typed: ids may arrive populated as objects,
/// graduation years as strings or numbers, and `canApply` as a boolean or a
/// `"true"`/`"false"` string. Everything is normalized here, at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRecord {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_id"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(
        rename = "registered_number",
        alias = "registeredNumber",
        default,
        deserialize_with = "lenient_string"
    )]
    pub registered_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub college_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub department_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub program_id: Option<String>,
    #[serde(default, alias = "graduation_year", deserialize_with = "lenient_year")]
    pub graduation_year: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub can_apply: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub off_campus_placements: Vec<Placement>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub on_campus_placements: Vec<Placement>,
}

impl PlacementRecord {
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn registered_number_or_empty(&self) -> &str {
        self.registered_number.as_deref().unwrap_or_default()
    }
}

/// Where a placement was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementChannel {
    OffCampus,
    OnCampus,
}

impl PlacementChannel {
    pub fn label(self) -> &'static str {
        match self {
            Self::OffCampus => "Off-Campus",
            Self::OnCampus => "On-Campus",
        }
    }
}

/// A single placement entry. The source data uses either `companyName` or
/// `company`, and either `role` or `title`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_ctc")]
    pub ctc: Option<Ctc>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub kind: Option<String>,
}

impl Placement {
    /// `companyName || company`, skipping blank values.
    pub fn company_label(&self) -> Option<&str> {
        [self.company_name.as_deref(), self.company.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
    }

    /// `role || title`, skipping blank values.
    pub fn role_label(&self) -> Option<&str> {
        [self.role.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
    }

    pub fn is_selected(&self) -> bool {
        self.status.as_deref() == Some("Selected")
    }
}

/// Compensation value, stored by the backend either as a number or as text.
#[derive(Debug, Clone, PartialEq)]
pub enum Ctc {
    Number(f64),
    Text(String),
}

impl Ctc {
    /// Numeric value using JavaScript `Number()` rules; blank or non-numeric
    /// text yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(value) => parse_number(value),
        }
    }
}

impl fmt::Display for Ctc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl Serialize for Ctc {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Number(value) => serializer.serialize_f64(*value),
            Self::Text(value) => serializer.serialize_str(value),
        }
    }
}

impl Ctc {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64().map(Self::Number),
            Value::String(text) => Some(Self::Text(text)),
            _ => None,
        }
    }
}

/// Any other shape than a number or a string decodes to `None`.
pub(crate) fn lenient_ctc<'de, D>(deserializer: D) -> Result<Option<Ctc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(Ctc::from_value))
}

/// College entry from the reference lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct College {
    #[serde(rename = "_id", deserialize_with = "required_id")]
    pub id: String,
    #[serde(default, alias = "collegeName", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Department entry from the reference lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(rename = "_id", deserialize_with = "required_id")]
    pub id: String,
    #[serde(default, alias = "departmentName", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, alias = "college", deserialize_with = "lenient_id")]
    pub college_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Program entry from the reference lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    #[serde(rename = "_id", deserialize_with = "required_id")]
    pub id: String,
    #[serde(default, alias = "programName", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, alias = "department", deserialize_with = "lenient_id")]
    pub department_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Faculty member listed by the faculty panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_id"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, alias = "department", deserialize_with = "lenient_id")]
    pub department_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub designation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Job posting managed through the job slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_id"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_name: Option<String>,
    #[serde(default, alias = "jobTitle", deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_ctc")]
    pub ctc: Option<Ctc>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rounds: Vec<Round>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Selection round attached to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    #[serde(default, alias = "roundName", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Notice published to students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_id"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parses a number the way JavaScript's `Number()` does for the inputs the
/// dashboards produce. Blank input is treated as absent.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses the leading integer of a string, mirroring `parseInt(value, 10)`.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|value| sign * value)
}

/// Parses a boolean flag that may arrive as `true`/`false` or as a string.
pub fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text.trim().eq_ignore_ascii_case("true"),
        Value::Number(number) => number.as_i64() == Some(1),
        _ => false,
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_to_string))
}

/// Ids arrive either as plain strings or as populated `{ "_id": ... }` objects.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(mut object)) => object.remove("_id").and_then(value_to_string),
        Some(other) => value_to_string(other),
        None => None,
    }
    .filter(|id| !id.is_empty()))
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_id(deserializer)?.ok_or_else(|| D::Error::custom("missing _id"))
}

fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value.trunc() as i64)),
        Some(Value::String(text)) => parse_leading_int(&text),
        _ => None,
    })
}

pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(|value| parse_flag(&value))
        .unwrap_or(false))
}

pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_accepts_loose_backend_shapes() {
        let record: PlacementRecord = serde_json::from_value(json!({
            "_id": "s-1",
            "name": "Asha",
            "registered_number": "REG-01",
            "phone": 9876543210u64,
            "collegeId": { "_id": "c-1", "name": "North" },
            "departmentId": "d-1",
            "graduation_year": "2024",
            "canApply": "true",
            "offCampusPlacements": null
        }))
        .expect("record parses");

        assert_eq!(record.id.as_deref(), Some("s-1"));
        assert_eq!(record.phone.as_deref(), Some("9876543210"));
        assert_eq!(record.college_id.as_deref(), Some("c-1"));
        assert_eq!(record.graduation_year, Some(2024));
        assert!(record.can_apply);
        assert!(record.off_campus_placements.is_empty());
        assert!(record.on_campus_placements.is_empty());
    }

    #[test]
    fn can_apply_is_emitted_as_boolean() {
        let record: PlacementRecord =
            serde_json::from_value(json!({ "canApply": "false" })).expect("record parses");
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["canApply"], json!(false));
    }

    #[test]
    fn placement_prefers_company_name_over_company() {
        let placement: Placement = serde_json::from_value(json!({
            "companyName": "",
            "company": "Globex",
            "title": "Analyst",
            "ctc": "12.5"
        }))
        .expect("placement parses");

        assert_eq!(placement.company_label(), Some("Globex"));
        assert_eq!(placement.role_label(), Some("Analyst"));
        assert_eq!(placement.ctc.and_then(|ctc| ctc.as_number()), Some(12.5));
    }

    #[test]
    fn unsupported_ctc_shapes_keep_the_record() {
        let records: Vec<PlacementRecord> = serde_json::from_value(json!([
            { "_id": "s-1", "onCampusPlacements": [{ "company": "Acme", "ctc": 9, "status": "Selected" }] },
            { "_id": "s-2", "onCampusPlacements": [
                { "company": "Globex", "ctc": { "min": 8, "max": 10 }, "status": "Selected" },
                { "company": "Initech", "ctc": [12], "status": "Selected" },
                { "company": "Umbrella", "ctc": true, "status": "Selected" }
            ] }
        ]))
        .expect("records parse");

        assert_eq!(records.len(), 2);
        assert!(records[1]
            .on_campus_placements
            .iter()
            .all(|placement| placement.ctc.is_none()));
        assert_eq!(
            records[1].on_campus_placements[0].company_label(),
            Some("Globex")
        );
    }

    #[test]
    fn parse_leading_int_matches_parse_int() {
        assert_eq!(parse_leading_int("2024"), Some(2024));
        assert_eq!(parse_leading_int(" 2024-25"), Some(2024));
        assert_eq!(parse_leading_int("-7"), Some(-7));
        assert_eq!(parse_leading_int("batch"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn parse_number_rejects_text() {
        assert_eq!(parse_number("7"), Some(7.0));
        assert_eq!(parse_number(" 4.5 "), Some(4.5));
        assert_eq!(parse_number("7 LPA"), None);
        assert_eq!(parse_number("   "), None);
    }

    #[test]
    fn reference_entries_require_an_id() {
        let err = serde_json::from_value::<College>(json!({ "name": "North" }));
        assert!(err.is_err());

        let department: Department = serde_json::from_value(json!({
            "_id": "d-1",
            "departmentName": "Mechanical",
            "college": "c-1",
            "hod": "Dr. Rao"
        }))
        .expect("department parses");
        assert_eq!(department.name.as_deref(), Some("Mechanical"));
        assert_eq!(department.college_id.as_deref(), Some("c-1"));
        assert_eq!(department.extra.get("hod"), Some(&json!("Dr. Rao")));
    }
}
