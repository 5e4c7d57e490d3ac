use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::info;

use placement_console_api::Tenant;

use crate::error::ApiError;
use crate::router::AppState;

/// Tenant session resolved from the `Authorization: Bearer <sessionId>` header.
#[derive(Debug, Clone)]
pub struct TenantSession {
    pub id: String,
    pub university_name: String,
    access_token: String,
}

impl TenantSession {
    pub fn tenant(&self) -> Tenant<'_> {
        Tenant {
            university_name: &self.university_name,
            access_token: &self.access_token,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for TenantSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let now = state.now();
        let sessions = state.storage().sessions();
        let session = sessions
            .find_active(id, now)
            .await?
            .ok_or(ApiError::Unauthorized)?;
        sessions.touch(&session.id, now, state.session_ttl()).await?;

        Ok(Self {
            id: session.id,
            university_name: session.university_name,
            access_token: session.access_token,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    university_name: String,
    #[serde(default, alias = "accessToken")]
    token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub university_name: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = state
        .storage()
        .sessions()
        .create(
            &body.university_name,
            &body.token,
            state.now(),
            state.session_ttl(),
        )
        .await?;

    counter!("sessions_created_total").increment(1);
    info!(
        stage = "session",
        tenant = %session.university_name,
        expires_at = %session.expires_at.to_rfc3339(),
        "session opened"
    );

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: session.id,
            university_name: session.university_name,
            expires_at: session.expires_at,
        }),
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    session: TenantSession,
) -> Result<StatusCode, ApiError> {
    state.storage().sessions().delete(&session.id).await?;
    state.forget_sessions(std::slice::from_ref(&session.id)).await;
    info!(stage = "session", tenant = %session.university_name, "session closed");
    Ok(StatusCode::NO_CONTENT)
}
