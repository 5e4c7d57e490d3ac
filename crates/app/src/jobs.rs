use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use placement_console_core::{validation::RoundsForm, Job, JobAction, JobsState};

use crate::error::{validated, ApiError};
use crate::router::AppState;
use crate::session::TenantSession;
use crate::upstream::observe;

async fn apply(state: &AppState, session: &TenantSession, action: JobAction) -> Arc<JobsState> {
    let label = action.label();
    let next = state.apply_job_action(&session.id, action).await;
    info!(
        stage = "jobs",
        tenant = %session.university_name,
        action = label,
        jobs = next.jobs.len(),
        status = ?next.status,
        "job state updated"
    );
    next
}

/// Refetches the job list. A failed fetch keeps the previous jobs and
/// records the error on the state.
pub async fn list(
    State(state): State<AppState>,
    session: TenantSession,
) -> Result<Json<JobsState>, ApiError> {
    apply(&state, &session, JobAction::FetchPending).await;
    let fetched = observe(
        "jobs",
        &session.university_name,
        state.backend().list_jobs(session.tenant()),
    )
    .await;

    match fetched {
        Ok(jobs) => {
            let next = apply(&state, &session, JobAction::FetchFulfilled(jobs)).await;
            Ok(Json(JobsState::clone(&next)))
        }
        Err(err) => {
            apply(&state, &session, JobAction::FetchRejected(err.to_string())).await;
            Err(err)
        }
    }
}

/// Creates a job. When the backend only acknowledges, the submitted job is
/// what lands in the session's job list.
pub async fn create(
    State(state): State<AppState>,
    session: TenantSession,
    Json(job): Json<Job>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    validated(&job)?;
    let echoed = observe(
        "create_job",
        &session.university_name,
        state.backend().create_job(session.tenant(), &job),
    )
    .await?;
    let created = echoed.unwrap_or(job);
    apply(&state, &session, JobAction::Created(created.clone())).await;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    session: TenantSession,
    Path(id): Path<String>,
    Json(mut job): Json<Job>,
) -> Result<Json<Job>, ApiError> {
    validated(&job)?;
    job.id = Some(id.clone());
    let echoed = observe(
        "update_job",
        &session.university_name,
        state.backend().update_job(session.tenant(), &id, &job),
    )
    .await?;
    let mut updated = echoed.unwrap_or(job);
    if updated.id.is_none() {
        updated.id = Some(id);
    }
    apply(&state, &session, JobAction::Updated(updated.clone())).await;
    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<AppState>,
    session: TenantSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    observe(
        "delete_job",
        &session.university_name,
        state.backend().delete_job(session.tenant(), &id),
    )
    .await?;
    apply(&state, &session, JobAction::Deleted(id)).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Appends rounds to a job. When the backend echoes the job back it replaces
/// the local copy; otherwise the rounds are appended locally.
pub async fn add_rounds(
    State(state): State<AppState>,
    session: TenantSession,
    Path(id): Path<String>,
    Json(form): Json<RoundsForm>,
) -> Result<Json<JobsState>, ApiError> {
    validated(&form)?;
    let echoed = observe(
        "add_rounds",
        &session.university_name,
        state
            .backend()
            .add_rounds(session.tenant(), &id, &form.rounds),
    )
    .await?;

    let action = match echoed {
        Some(job) => JobAction::Updated(job),
        None => JobAction::RoundsAdded {
            job_id: id,
            rounds: form.rounds,
        },
    };
    let next = apply(&state, &session, action).await;
    Ok(Json(JobsState::clone(&next)))
}
