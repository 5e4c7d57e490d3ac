use std::{cmp::Ordering, collections::BTreeMap};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use placement_console_core::{
    filter::placement_count,
    filter_records,
    validation::{DepartmentForm, StudentForm},
    Faculty, FilterCriteria, PlacementRecord, PlacementStats, ValidationError,
};

use crate::error::{validated, ApiError};
use crate::extract::ApiQuery;
use crate::reference;
use crate::reports::StudentRow;
use crate::router::AppState;
use crate::session::TenantSession;
use crate::upstream::observe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    Name,
    RegisteredNumber,
    Placements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StudentSort {
    key: SortKey,
    descending: bool,
}

impl StudentSort {
    /// `name`, `registeredNumber` or `placements`; a leading `-` sorts descending.
    fn parse(raw: Option<&str>) -> Result<Option<Self>, ValidationError> {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(None);
        };
        let (descending, field) = match raw.strip_prefix('-') {
            Some(field) => (true, field),
            None => (false, raw),
        };
        let key = match field {
            "name" => SortKey::Name,
            "registeredNumber" => SortKey::RegisteredNumber,
            "placements" => SortKey::Placements,
            _ => {
                return Err(ValidationError {
                    form: "students_query",
                    errors: BTreeMap::from([(
                        "sort".to_string(),
                        "must be one of name, registeredNumber, placements".to_string(),
                    )]),
                })
            }
        };
        Ok(Some(Self { key, descending }))
    }

    fn compare(&self, left: &PlacementRecord, right: &PlacementRecord) -> Ordering {
        let ordering = match self.key {
            SortKey::Name => left
                .name_or_empty()
                .to_lowercase()
                .cmp(&right.name_or_empty().to_lowercase()),
            SortKey::RegisteredNumber => left
                .registered_number_or_empty()
                .to_lowercase()
                .cmp(&right.registered_number_or_empty().to_lowercase()),
            SortKey::Placements => placement_count(left).cmp(&placement_count(right)),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SortQuery {
    #[serde(default)]
    sort: Option<String>,
}

#[derive(Debug, Serialize)]
struct StudentList<'a> {
    students: Vec<StudentRow<'a>>,
    stats: PlacementStats,
}

/// Student list with the report facets and an optional stable sort.
pub async fn list(
    State(state): State<AppState>,
    session: TenantSession,
    ApiQuery(criteria): ApiQuery<FilterCriteria>,
    ApiQuery(query): ApiQuery<SortQuery>,
) -> Result<Response, ApiError> {
    let sort = StudentSort::parse(query.sort.as_deref())?;
    let data = reference::load(&state, &session).await?;
    let records = observe(
        "students",
        &session.university_name,
        state.backend().list_students(session.tenant()),
    )
    .await?;

    let mut filtered = filter_records(&records, &criteria);
    if let Some(sort) = sort {
        filtered.sort_by(|left, right| sort.compare(left, right));
    }

    let lookup = data.lookup();
    let body = StudentList {
        stats: PlacementStats::from_records(filtered.iter().copied()),
        students: filtered
            .iter()
            .map(|&record| StudentRow::new(record, &lookup))
            .collect(),
    };
    Ok(Json(body).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    session: TenantSession,
    Json(form): Json<StudentForm>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    validated(&form)?;
    let created = observe(
        "create_student",
        &session.university_name,
        state.backend().create_student(session.tenant(), &form),
    )
    .await?;
    info!(stage = "students", tenant = %session.university_name, "student created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_faculty(
    State(state): State<AppState>,
    session: TenantSession,
) -> Result<Json<Vec<Faculty>>, ApiError> {
    let faculty = observe(
        "faculty",
        &session.university_name,
        state.backend().list_faculty(session.tenant()),
    )
    .await?;
    Ok(Json(faculty))
}

pub async fn create_faculty(
    State(state): State<AppState>,
    session: TenantSession,
    Json(faculty): Json<Faculty>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    validated(&faculty)?;
    let created = observe(
        "create_faculty",
        &session.university_name,
        state.backend().create_faculty(session.tenant(), &faculty),
    )
    .await?;
    info!(stage = "faculty", tenant = %session.university_name, "faculty member created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Creates a department and drops the cached reference lists so the new
/// department shows up on the next read.
pub async fn create_department(
    State(state): State<AppState>,
    session: TenantSession,
    Json(form): Json<DepartmentForm>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    validated(&form)?;
    let created = observe(
        "create_department",
        &session.university_name,
        state.backend().create_department(session.tenant(), &form),
    )
    .await?;
    state.forget_reference(&session.id).await;
    info!(stage = "reference", tenant = %session.university_name, "department created");
    Ok((StatusCode::CREATED, Json(created)))
}
