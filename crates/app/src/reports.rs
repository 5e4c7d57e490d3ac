use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::info;

use placement_console_core::{
    export_report, filter::placement_count, filter_records, is_placed, lookup::ResolvedNames,
    ExportError, ExportSelection, FacetOptions, FilterCriteria, PlacementRecord, PlacementStats,
    ReferenceLookup,
};

use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::reference;
use crate::router::AppState;
use crate::session::TenantSession;
use crate::upstream::observe;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A record as shown in report and student tables: the backend fields plus
/// resolved names and the qualifying placement count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow<'a> {
    #[serde(flatten)]
    pub record: &'a PlacementRecord,
    #[serde(flatten)]
    pub names: ResolvedNames,
    pub placed: bool,
    pub total_placements: usize,
}

impl<'a> StudentRow<'a> {
    pub fn new(record: &'a PlacementRecord, lookup: &ReferenceLookup<'_>) -> Self {
        Self {
            record,
            names: lookup.names_for(record),
            placed: is_placed(record),
            total_placements: placement_count(record),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse<'a> {
    graduation_year: Option<&'a str>,
    students: Vec<StudentRow<'a>>,
    stats: PlacementStats,
    facets: FacetOptions,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    columns: Option<String>,
}

pub async fn report(
    State(state): State<AppState>,
    session: TenantSession,
    ApiQuery(criteria): ApiQuery<FilterCriteria>,
) -> Result<Response, ApiError> {
    let result = build_report(&state, &session, &criteria).await;
    let outcome = if result.is_ok() { "ok" } else { "failed" };
    counter!("report_requests_total", "result" => outcome).increment(1);
    result
}

async fn build_report(
    state: &AppState,
    session: &TenantSession,
    criteria: &FilterCriteria,
) -> Result<Response, ApiError> {
    let data = reference::load(state, session).await?;
    let records = fetch_records(state, session, criteria).await?;
    let lookup = data.lookup();

    let filtered = filter_records(&records, criteria);
    let stats = PlacementStats::from_records(filtered.iter().copied());
    info!(
        stage = "report",
        tenant = %session.university_name,
        fetched = records.len(),
        matched = filtered.len(),
        placed = stats.total_placed_students,
        "report built"
    );

    let response = ReportResponse {
        graduation_year: backend_year(criteria),
        students: filtered
            .iter()
            .map(|&record| StudentRow::new(record, &lookup))
            .collect(),
        stats,
        facets: FacetOptions::from_records(&records),
    };
    Ok(Json(response).into_response())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StudentDetail<'a> {
    #[serde(flatten)]
    row: StudentRow<'a>,
    placement_summary: String,
}

/// One student of the report, for the detail view.
pub async fn student_detail(
    State(state): State<AppState>,
    session: TenantSession,
    Path(id): Path<String>,
    ApiQuery(criteria): ApiQuery<FilterCriteria>,
) -> Result<Response, ApiError> {
    let data = reference::load(&state, &session).await?;
    let records = fetch_records(&state, &session, &criteria).await?;
    let record = records
        .iter()
        .find(|record| record.id.as_deref() == Some(id.as_str()))
        .ok_or_else(|| ApiError::NotFound(format!("student '{id}' is not in the report")))?;

    let lookup = data.lookup();
    let detail = StudentDetail {
        row: StudentRow::new(record, &lookup),
        placement_summary: placement_console_core::export::placement_summary(record),
    };
    Ok(Json(detail).into_response())
}

/// Streams the filtered report as an `.xlsx` attachment.
pub async fn export(
    State(state): State<AppState>,
    session: TenantSession,
    ApiQuery(criteria): ApiQuery<FilterCriteria>,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> Result<Response, ApiError> {
    let result = build_export(&state, &session, &criteria, &query).await;
    let outcome = match &result {
        Ok(_) => "ok",
        Err(ApiError::Export(ExportError::NoColumnsSelected)) => "no_columns",
        Err(ApiError::Export(ExportError::UnknownColumn(_))) => "unknown_column",
        Err(_) => "failed",
    };
    counter!("report_exports_total", "result" => outcome).increment(1);
    result
}

async fn build_export(
    state: &AppState,
    session: &TenantSession,
    criteria: &FilterCriteria,
    query: &ExportQuery,
) -> Result<Response, ApiError> {
    let selection = ExportSelection::parse(query.columns.as_deref())?;

    let data = reference::load(state, session).await?;
    let records = fetch_records(state, session, criteria).await?;
    let filtered = filter_records(&records, criteria);
    let file = export_report(
        &filtered,
        &data.lookup(),
        &selection,
        backend_year(criteria),
    )?;

    info!(
        stage = "report",
        tenant = %session.university_name,
        rows = file.rows,
        bytes = file.bytes.len(),
        filename = %file.filename,
        "report exported"
    );

    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

async fn fetch_records(
    state: &AppState,
    session: &TenantSession,
    criteria: &FilterCriteria,
) -> Result<Vec<PlacementRecord>, ApiError> {
    observe(
        "placement_reports",
        &session.university_name,
        state
            .backend()
            .placement_report(session.tenant(), backend_year(criteria)),
    )
    .await
}

/// The graduation year forwarded to the backend, when one is selected.
fn backend_year(criteria: &FilterCriteria) -> Option<&str> {
    criteria
        .graduation_year
        .as_deref()
        .map(str::trim)
        .filter(|year| !year.is_empty() && !year.eq_ignore_ascii_case("all"))
}
