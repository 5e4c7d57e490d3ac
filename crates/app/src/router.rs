use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

use placement_console_api::BackendClient;
use placement_console_core::{JobAction, JobsState, ReferenceData};
use placement_console_storage::Database;

use crate::{jobs, notices, reference, reports, session, students, telemetry};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;
type PerSession<T> = Arc<RwLock<HashMap<String, T>>>;

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    backend: BackendClient,
    session_ttl: Duration,
    clock: Clock,
    reference: PerSession<Arc<ReferenceData>>,
    jobs: PerSession<Arc<JobsState>>,
}

impl AppState {
    pub fn new(
        metrics: PrometheusHandle,
        storage: Database,
        backend: BackendClient,
        session_ttl: Duration,
    ) -> Self {
        Self {
            metrics,
            storage,
            backend,
            session_ttl,
            clock: Arc::new(Utc::now),
            reference: Arc::default(),
            jobs: Arc::default(),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub async fn cached_reference(&self, session_id: &str) -> Option<Arc<ReferenceData>> {
        self.reference.read().await.get(session_id).cloned()
    }

    /// Swaps the reference context of a session.
    pub async fn store_reference(&self, session_id: &str, data: Arc<ReferenceData>) {
        self.reference
            .write()
            .await
            .insert(session_id.to_string(), data);
    }

    pub async fn forget_reference(&self, session_id: &str) {
        self.reference.write().await.remove(session_id);
    }

    pub async fn jobs_state(&self, session_id: &str) -> Arc<JobsState> {
        self.jobs
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Reduces the session's job state with `action` and stores the result.
    pub async fn apply_job_action(&self, session_id: &str, action: JobAction) -> Arc<JobsState> {
        let mut guard = self.jobs.write().await;
        let current = guard.get(session_id).cloned().unwrap_or_default();
        let next = Arc::new(current.reduce(action));
        guard.insert(session_id.to_string(), next.clone());
        next
    }

    /// Session ids that currently hold cached reference data or job state.
    pub async fn cached_session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.reference.read().await.keys().cloned().collect();
        ids.extend(self.jobs.read().await.keys().cloned());
        ids.sort();
        ids.dedup();
        ids
    }

    /// Drops every cached value held for the given sessions.
    pub async fn forget_sessions(&self, session_ids: &[String]) {
        let mut reference = self.reference.write().await;
        let mut jobs = self.jobs.write().await;
        for id in session_ids {
            reference.remove(id);
            jobs.remove(id);
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/api/session", post(session::create).delete(session::delete))
        .route("/api/reference", get(reference::show))
        .route("/api/reference/refresh", post(reference::refresh))
        .route("/api/reports", get(reports::report))
        .route("/api/reports/students/:id", get(reports::student_detail))
        .route("/api/reports/export", get(reports::export))
        .route("/api/students", get(students::list).post(students::create))
        .route("/api/faculty", get(students::list_faculty).post(students::create_faculty))
        .route("/api/departments", post(students::create_department))
        .route("/api/jobs", get(jobs::list).post(jobs::create))
        .route("/api/jobs/:id", put(jobs::update).delete(jobs::remove))
        .route("/api/jobs/:id/rounds", post(jobs::add_rounds))
        .route("/api/notices", get(notices::list).post(notices::create))
        .route("/api/notices/:id", delete(notices::remove))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
