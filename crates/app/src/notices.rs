use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use placement_console_core::Notice;

use crate::error::{validated, ApiError};
use crate::router::AppState;
use crate::session::TenantSession;
use crate::upstream::observe;

pub async fn list(
    State(state): State<AppState>,
    session: TenantSession,
) -> Result<Json<Vec<Notice>>, ApiError> {
    let notices = observe(
        "notices",
        &session.university_name,
        state.backend().list_notices(session.tenant()),
    )
    .await?;
    Ok(Json(notices))
}

pub async fn create(
    State(state): State<AppState>,
    session: TenantSession,
    Json(notice): Json<Notice>,
) -> Result<(StatusCode, Json<Notice>), ApiError> {
    validated(&notice)?;
    let created = observe(
        "create_notice",
        &session.university_name,
        state.backend().create_notice(session.tenant(), &notice),
    )
    .await?;
    info!(stage = "notices", tenant = %session.university_name, "notice published");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn remove(
    State(state): State<AppState>,
    session: TenantSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    observe(
        "delete_notice",
        &session.university_name,
        state.backend().delete_notice(session.tenant(), &id),
    )
    .await?;
    info!(stage = "notices", tenant = %session.university_name, notice = %id, "notice deleted");
    Ok(StatusCode::NO_CONTENT)
}
