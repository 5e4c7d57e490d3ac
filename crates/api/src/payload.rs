use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::BackendError;

/// Keys under which the backend wraps list payloads.
const LIST_KEYS: &[&str] = &[
    "data",
    "students",
    "jobs",
    "notices",
    "colleges",
    "departments",
    "programs",
    "faculty",
];

/// Keys under which the backend wraps single entities.
const ENTITY_KEYS: &[&str] = &["data", "job", "notice", "student", "faculty", "department"];

/// Decodes a list sent either as a bare array or wrapped in an object.
pub fn decode_list<T>(value: Value) -> Result<Vec<T>, BackendError>
where
    T: DeserializeOwned,
{
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(mut object) => {
            let key = LIST_KEYS
                .iter()
                .find(|key| object.get(**key).is_some_and(Value::is_array))
                .ok_or(BackendError::UnexpectedPayload("expected a list"))?;
            let list = object.remove(*key).unwrap_or(Value::Null);
            Ok(serde_json::from_value(list)?)
        }
        Value::Null => Ok(Vec::new()),
        _ => Err(BackendError::UnexpectedPayload("expected a list")),
    }
}

/// Decodes a single entity sent bare or wrapped under a well-known key.
pub fn decode_entity<T>(value: Value) -> Result<T, BackendError>
where
    T: DeserializeOwned,
{
    let Value::Object(mut object) = value else {
        return Err(BackendError::UnexpectedPayload("expected an object"));
    };
    if !object.contains_key("_id") {
        if let Some(key) = ENTITY_KEYS
            .iter()
            .find(|key| object.get(**key).is_some_and(Value::is_object))
        {
            let inner = object.remove(*key).unwrap_or(Value::Null);
            return Ok(serde_json::from_value(inner)?);
        }
    }
    Ok(serde_json::from_value(Value::Object(object))?)
}
