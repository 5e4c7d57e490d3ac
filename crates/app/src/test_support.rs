//! Shared fixtures for handler tests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use httpmock::MockServer;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tempfile::TempDir;
use url::Url;

use placement_console_api::BackendClient;
use placement_console_core::ReferenceData;
use placement_console_storage::Database;

use crate::router::AppState;
use crate::telemetry;

pub const UNIVERSITY: &str = "North University";
pub const BACKEND_TOKEN: &str = "backend-token";

pub struct TestContext {
    pub database: Database,
    pub state: AppState,
    pub now: DateTime<Utc>,
    pub server: MockServer,
    _dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let metrics = telemetry::init_metrics().expect("metrics");
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("app.db").display());
        let database = Database::connect(&url).await.expect("connect");
        database.run_migrations().await.expect("migrations");

        let server = MockServer::start_async().await;
        let backend = BackendClient::new(
            Url::parse(&server.url("/api/")).expect("url"),
            Client::builder().build().expect("client"),
        );

        let now = DateTime::parse_from_rfc3339("2024-06-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let state = AppState::new(metrics, database.clone(), backend, Duration::hours(12))
            .with_clock(Arc::new(move || now));

        Self {
            database,
            state,
            now,
            server,
            _dir: dir,
        }
    }

    pub async fn open_session(&self) -> String {
        self.database
            .sessions()
            .create(UNIVERSITY, BACKEND_TOKEN, self.now, Duration::hours(12))
            .await
            .expect("session")
            .id
    }

    pub fn authorized(&self, method: &str, uri: &str, session_id: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {session_id}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap()
    }

    pub fn authorized_json(
        &self,
        method: &str,
        uri: &str,
        session_id: &str,
        payload: Value,
    ) -> Request<Body> {
        self.authorized(method, uri, session_id, Body::from(payload.to_string()))
    }

    pub async fn json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    pub async fn bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes()
            .to_vec()
    }

    pub fn reference_fixture() -> Value {
        json!({
            "colleges": [{ "_id": "c-1", "name": "North Campus" }],
            "departments": [
                { "_id": "d-1", "name": "Computer Science", "college": "c-1" },
                { "_id": "d-2", "name": "Mechanical", "college": "c-1" }
            ],
            "programs": [{ "_id": "p-1", "name": "B.Tech", "department": "d-1" }]
        })
    }

    pub async fn seed_reference_cache(&self, session_id: &str) {
        let data: ReferenceData =
            serde_json::from_value(Self::reference_fixture()).expect("reference fixture");
        self.state.store_reference(session_id, Arc::new(data)).await;
    }

    /// Registers the three reference list endpoints.
    pub async fn mock_reference(&self) {
        let fixture = Self::reference_fixture();
        for (path, key) in [
            ("/api/college/colleges", "colleges"),
            ("/api/department/getAllDepartments", "departments"),
            ("/api/program/getprograms", "programs"),
        ] {
            let body = json!({ key: fixture[key].clone() });
            self.server
                .mock_async(|when, then| {
                    when.method("GET")
                        .path(path)
                        .query_param("universityName", UNIVERSITY)
                        .header("Authorization", format!("Bearer {BACKEND_TOKEN}"));
                    then.status(200).json_body(body);
                })
                .await;
        }
    }

    pub fn placement_fixture() -> Value {
        json!([
            {
                "_id": "s-1",
                "name": "Asha Verma",
                "registered_number": "REG001",
                "email": "asha@example.edu",
                "collegeId": "c-1",
                "departmentId": "d-1",
                "programId": "p-1",
                "graduationYear": 2024,
                "canApply": "true",
                "offCampusPlacements": [{ "companyName": "Acme", "ctc": 12 }]
            },
            {
                "_id": "s-2",
                "name": "Bala Kumar",
                "registered_number": "REG002",
                "departmentId": "d-2",
                "graduation_year": "2024",
                "onCampusPlacements": [{ "companyName": "Globex", "ctc": "8", "status": "Rejected" }]
            },
            {
                "_id": "s-3",
                "name": "Chitra Rao",
                "registered_number": "REG003",
                "departmentId": "d-9",
                "graduationYear": 2024
            }
        ])
    }
}
