use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use placement_console_core::ReferenceData;

use crate::error::ApiError;
use crate::router::AppState;
use crate::session::TenantSession;
use crate::upstream::observe;

/// Returns the session's reference context, fetching it on first use.
pub async fn load(state: &AppState, session: &TenantSession) -> Result<Arc<ReferenceData>, ApiError> {
    if let Some(cached) = state.cached_reference(&session.id).await {
        return Ok(cached);
    }
    fetch_and_store(state, session).await
}

async fn fetch_and_store(
    state: &AppState,
    session: &TenantSession,
) -> Result<Arc<ReferenceData>, ApiError> {
    let backend = state.backend();
    let tenant = session.tenant();
    let university = session.university_name.as_str();

    let (colleges, departments, programs) = tokio::try_join!(
        observe("colleges", university, backend.list_colleges(tenant)),
        observe("departments", university, backend.list_departments(tenant)),
        observe("programs", university, backend.list_programs(tenant)),
    )?;

    let data = Arc::new(ReferenceData {
        colleges,
        departments,
        programs,
    });
    info!(
        stage = "reference",
        tenant = university,
        colleges = data.colleges.len(),
        departments = data.departments.len(),
        programs = data.programs.len(),
        "reference context loaded"
    );
    state.store_reference(&session.id, data.clone()).await;
    Ok(data)
}

pub async fn show(
    State(state): State<AppState>,
    session: TenantSession,
) -> Result<Json<ReferenceData>, ApiError> {
    let data = load(&state, &session).await?;
    Ok(Json(ReferenceData::clone(&data)))
}

/// Refetches the reference lists. On failure the previous context stays.
pub async fn refresh(
    State(state): State<AppState>,
    session: TenantSession,
) -> Result<Json<ReferenceData>, ApiError> {
    let data = fetch_and_store(&state, &session).await?;
    Ok(Json(ReferenceData::clone(&data)))
}
