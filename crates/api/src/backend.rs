use placement_console_core::types::{
    College, Department, Faculty, Job, Notice, PlacementRecord, Program, Round,
};
use placement_console_core::validation::{DepartmentForm, StudentForm};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;

use crate::payload::{decode_entity, decode_list};

/// Credentials scoping every request to one tenant.
#[derive(Debug, Clone, Copy)]
pub struct Tenant<'a> {
    pub university_name: &'a str,
    pub access_token: &'a str,
}

/// Client for the placement REST backend.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
}

impl BackendClient {
    /// Creates a client rooted at `base_url`. A trailing slash is added when
    /// missing so relative endpoint paths resolve beneath it.
    pub fn new(mut base_url: Url, http: Client) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn list_colleges(&self, tenant: Tenant<'_>) -> Result<Vec<College>, BackendError> {
        self.get_list(tenant, "college/colleges", &[]).await
    }

    pub async fn list_departments(
        &self,
        tenant: Tenant<'_>,
    ) -> Result<Vec<Department>, BackendError> {
        self.get_list(tenant, "department/getAllDepartments", &[])
            .await
    }

    pub async fn create_department(
        &self,
        tenant: Tenant<'_>,
        form: &DepartmentForm,
    ) -> Result<Value, BackendError> {
        self.send_json(Method::POST, tenant, "department/addDepartment", &[], form)
            .await
    }

    pub async fn list_programs(&self, tenant: Tenant<'_>) -> Result<Vec<Program>, BackendError> {
        self.get_list(tenant, "program/getprograms", &[]).await
    }

    pub async fn list_students(
        &self,
        tenant: Tenant<'_>,
    ) -> Result<Vec<PlacementRecord>, BackendError> {
        self.get_list(tenant, "student", &[]).await
    }

    pub async fn create_student(
        &self,
        tenant: Tenant<'_>,
        form: &StudentForm,
    ) -> Result<Value, BackendError> {
        self.send_json(Method::POST, tenant, "student", &[], form)
            .await
    }

    pub async fn list_faculty(&self, tenant: Tenant<'_>) -> Result<Vec<Faculty>, BackendError> {
        self.get_list(tenant, "faculty", &[]).await
    }

    pub async fn create_faculty(
        &self,
        tenant: Tenant<'_>,
        faculty: &Faculty,
    ) -> Result<Value, BackendError> {
        self.send_json(Method::POST, tenant, "faculty", &[], faculty)
            .await
    }

    /// Fetches the placement report, optionally scoped to a graduation year.
    pub async fn placement_report(
        &self,
        tenant: Tenant<'_>,
        graduation_year: Option<&str>,
    ) -> Result<Vec<PlacementRecord>, BackendError> {
        let mut url = self.endpoint("placement/placement-reports", &[], tenant)?;
        if let Some(year) = graduation_year.filter(|year| !year.trim().is_empty()) {
            url.query_pairs_mut()
                .append_pair("graduationYear", year.trim());
        }
        let response = self
            .authorized_request(Method::GET, url, tenant)
            .send()
            .await?;
        decode_list(parse_json(response).await?)
    }

    pub async fn list_jobs(&self, tenant: Tenant<'_>) -> Result<Vec<Job>, BackendError> {
        self.get_list(tenant, "job/getAllJobs", &[]).await
    }

    /// Creates a job. Returns the stored job when the backend echoes it back.
    pub async fn create_job(
        &self,
        tenant: Tenant<'_>,
        job: &Job,
    ) -> Result<Option<Job>, BackendError> {
        let value = self
            .send_json(Method::POST, tenant, "job/createJob", &[], job)
            .await?;
        Ok(echoed_job(value))
    }

    /// Updates a job. Returns the stored job when the backend echoes it back.
    pub async fn update_job(
        &self,
        tenant: Tenant<'_>,
        id: &str,
        job: &Job,
    ) -> Result<Option<Job>, BackendError> {
        let value = self
            .send_json(Method::PUT, tenant, "job/updateJob", &[id], job)
            .await?;
        Ok(echoed_job(value))
    }

    pub async fn delete_job(&self, tenant: Tenant<'_>, id: &str) -> Result<(), BackendError> {
        let url = self.endpoint("job/deleteJob", &[id], tenant)?;
        let response = self
            .authorized_request(Method::DELETE, url, tenant)
            .send()
            .await?;
        ensure_success(response).await
    }

    /// Appends rounds to a job. Returns the updated job when the backend
    /// echoes it back.
    pub async fn add_rounds(
        &self,
        tenant: Tenant<'_>,
        job_id: &str,
        rounds: &[Round],
    ) -> Result<Option<Job>, BackendError> {
        let value = self
            .send_json(
                Method::POST,
                tenant,
                "job/jobs",
                &[job_id, "addRounds"],
                &json!({ "rounds": rounds }),
            )
            .await?;
        Ok(echoed_job(value))
    }

    pub async fn list_notices(&self, tenant: Tenant<'_>) -> Result<Vec<Notice>, BackendError> {
        self.get_list(tenant, "notice", &[]).await
    }

    pub async fn create_notice(
        &self,
        tenant: Tenant<'_>,
        notice: &Notice,
    ) -> Result<Notice, BackendError> {
        let value = self
            .send_json(Method::POST, tenant, "notice", &[], notice)
            .await?;
        decode_entity(value)
    }

    pub async fn delete_notice(&self, tenant: Tenant<'_>, id: &str) -> Result<(), BackendError> {
        let url = self.endpoint("notice", &[id], tenant)?;
        let response = self
            .authorized_request(Method::DELETE, url, tenant)
            .send()
            .await?;
        ensure_success(response).await
    }

    async fn get_list<T>(
        &self,
        tenant: Tenant<'_>,
        path: &str,
        segments: &[&str],
    ) -> Result<Vec<T>, BackendError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path, segments, tenant)?;
        let response = self
            .authorized_request(Method::GET, url, tenant)
            .send()
            .await?;
        decode_list(parse_json(response).await?)
    }

    async fn send_json<B>(
        &self,
        method: Method,
        tenant: Tenant<'_>,
        path: &str,
        segments: &[&str],
        body: &B,
    ) -> Result<Value, BackendError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path, segments, tenant)?;
        let response = self
            .authorized_request(method, url, tenant)
            .json(body)
            .send()
            .await?;
        parse_json(response).await
    }

    /// Resolves `path` against the base url, appends percent-encoded
    /// `segments` and the tenant's `universityName`.
    fn endpoint(
        &self,
        path: &str,
        segments: &[&str],
        tenant: Tenant<'_>,
    ) -> Result<Url, BackendError> {
        let mut url = self.base_url.join(path)?;
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| BackendError::UnexpectedPayload("base url cannot carry a path"))?
                .extend(segments);
        }
        url.query_pairs_mut()
            .append_pair("universityName", tenant.university_name);
        Ok(url)
    }

    fn authorized_request(&self, method: Method, url: Url, tenant: Tenant<'_>) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", tenant.access_token))
    }
}

/// Errors produced by the backend client.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected payload: {0}")]
    UnexpectedPayload(&'static str),
}

impl BackendError {
    /// Status returned by the backend, when the failure was a non-2xx reply.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Job mutations answer either with the job or with a bare `{ "message" }`
/// acknowledgement. Only a payload carrying an id or a company counts as a job.
fn echoed_job(value: Value) -> Option<Job> {
    decode_entity::<Job>(value).ok().filter(|job| {
        job.id.is_some()
            || job
                .company_name
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty())
    })
}

async fn ensure_success(response: Response) -> Result<(), BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(BackendError::Status { status, body });
    }
    Ok(())
}

async fn parse_json(response: Response) -> Result<Value, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(BackendError::Status { status, body });
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::Method as MockMethod;

    const TENANT: Tenant<'static> = Tenant {
        university_name: "North University",
        access_token: "token-1",
    };

    fn client(server: &MockServer) -> BackendClient {
        let base = Url::parse(&server.url("/api")).expect("url");
        BackendClient::new(base, Client::builder().build().expect("client"))
    }

    #[tokio::test]
    async fn list_requests_carry_tenant_and_token() {
        let server = MockServer::start_async().await;
        let client = client(&server);

        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/college/colleges")
                    .query_param("universityName", "North University")
                    .header("Authorization", "Bearer token-1");
                then.status(200).json_body(serde_json::json!({
                    "colleges": [{ "_id": "c-1", "name": "North Campus" }]
                }));
            })
            .await;

        let colleges = client.list_colleges(TENANT).await.expect("colleges");
        mock.assert_async().await;

        assert_eq!(colleges.len(), 1);
        assert_eq!(colleges[0].name.as_deref(), Some("North Campus"));
    }

    #[tokio::test]
    async fn placement_report_sends_graduation_year() {
        let server = MockServer::start_async().await;
        let client = client(&server);

        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/placement/placement-reports")
                    .query_param("universityName", "North University")
                    .query_param("graduationYear", "2024");
                then.status(200).json_body(serde_json::json!([
                    {
                        "_id": "s-1",
                        "name": "Asha",
                        "graduationYear": 2024,
                        "offCampusPlacements": [{ "companyName": "Acme", "ctc": 12 }]
                    }
                ]));
            })
            .await;

        let records = client
            .placement_report(TENANT, Some("2024"))
            .await
            .expect("report");
        mock.assert_async().await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].off_campus_placements.len(), 1);
    }

    #[tokio::test]
    async fn update_job_targets_id_segment() {
        let server = MockServer::start_async().await;
        let client = client(&server);

        let mock = server
            .mock_async(|when, then| {
                when.method(MockMethod::PUT)
                    .path("/api/job/updateJob/j-1")
                    .json_body_partial(r#"{ "companyName": "Acme" }"#);
                then.status(200).json_body(serde_json::json!({
                    "job": { "_id": "j-1", "companyName": "Acme", "title": "Analyst" }
                }));
            })
            .await;

        let job: Job = serde_json::from_value(serde_json::json!({
            "_id": "j-1",
            "companyName": "Acme",
            "title": "Analyst"
        }))
        .expect("job");
        let updated = client
            .update_job(TENANT, "j-1", &job)
            .await
            .expect("update")
            .expect("echoed job");
        mock.assert_async().await;

        assert_eq!(updated.title.as_deref(), Some("Analyst"));
    }

    #[tokio::test]
    async fn job_mutations_with_plain_ack_echo_nothing() {
        let server = MockServer::start_async().await;
        let client = client(&server);

        server
            .mock_async(|when, then| {
                when.method(MockMethod::PUT).path("/api/job/updateJob/j-1");
                then.status(200)
                    .json_body(serde_json::json!({ "message": "Job updated successfully" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/job/createJob");
                then.status(201)
                    .json_body(serde_json::json!({ "message": "Job created successfully" }));
            })
            .await;

        let job: Job = serde_json::from_value(serde_json::json!({
            "companyName": "Acme",
            "title": "Analyst"
        }))
        .expect("job");

        let updated = client
            .update_job(TENANT, "j-1", &job)
            .await
            .expect("update");
        let created = client.create_job(TENANT, &job).await.expect("create");

        assert!(updated.is_none());
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn add_rounds_posts_rounds_and_tolerates_plain_ack() {
        let server = MockServer::start_async().await;
        let client = client(&server);

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/job/jobs/j-1/addRounds")
                    .json_body_partial(r#"{ "rounds": [{ "name": "Aptitude" }] }"#);
                then.status(200)
                    .json_body(serde_json::json!({ "message": "Rounds added" }));
            })
            .await;

        let round: Round =
            serde_json::from_value(serde_json::json!({ "name": "Aptitude" })).expect("round");
        let echoed = client
            .add_rounds(TENANT, "j-1", &[round])
            .await
            .expect("add rounds");
        mock.assert_async().await;

        assert!(echoed.is_none());
    }

    #[tokio::test]
    async fn delete_notice_accepts_empty_body() {
        let server = MockServer::start_async().await;
        let client = client(&server);

        let mock = server
            .mock_async(|when, then| {
                when.method(MockMethod::DELETE).path("/api/notice/n-1");
                then.status(204);
            })
            .await;

        client
            .delete_notice(TENANT, "n-1")
            .await
            .expect("delete notice");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_returns_message() {
        let server = MockServer::start_async().await;
        let client = client(&server);

        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/job/getAllJobs");
                then.status(401).body("unauthorized");
            })
            .await;

        let err = client.list_jobs(TENANT).await.expect_err("should error");
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
