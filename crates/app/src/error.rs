use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::counter;
use thiserror::Error;
use tracing::{error, warn};

use placement_console_api::BackendError;
use placement_console_core::{ExportError, Validate, ValidationError};
use placement_console_storage::SessionError;

use crate::problem::ProblemResponse;

/// Failures surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("a valid session is required")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    InvalidQuery(#[from] QueryRejection),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Checks a form, counting rejections per form name.
pub fn validated<T: Validate>(form: &T) -> Result<(), ApiError> {
    form.validate().map_err(|err| {
        counter!("validation_failures_total", "form" => T::FORM).increment(1);
        ApiError::Validation(err)
    })
}

impl From<ApiError> for ProblemResponse {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => ProblemResponse::new(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "a valid session is required",
            ),
            ApiError::NotFound(detail) => {
                ProblemResponse::new(StatusCode::NOT_FOUND, "not_found", detail)
            }
            ApiError::InvalidQuery(rejection) => ProblemResponse::new(
                StatusCode::BAD_REQUEST,
                "invalid_query",
                rejection.body_text(),
            ),
            ApiError::Validation(err) => ProblemResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                err.to_string(),
            )
            .with_errors(err.errors),
            ApiError::Export(ExportError::NoColumnsSelected) => ProblemResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_columns_selected",
                "select at least one column to export",
            ),
            ApiError::Export(ExportError::UnknownColumn(column)) => ProblemResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "unknown_column",
                format!("unknown export column '{column}'"),
            ),
            ApiError::Export(err) => {
                error!(stage = "report", error = %err, "failed to build workbook");
                ProblemResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "export_failed",
                    "failed to build the spreadsheet",
                )
            }
            ApiError::Backend(err) => backend_problem(err),
            ApiError::Session(SessionError::MissingUniversity) => ProblemResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                "session form has 1 invalid field(s)",
            )
            .with_errors(single_error("universityName", "is required")),
            ApiError::Session(SessionError::MissingToken) => ProblemResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                "session form has 1 invalid field(s)",
            )
            .with_errors(single_error("token", "is required")),
            ApiError::Session(err) => {
                error!(stage = "session", error = %err, "session store failure");
                ProblemResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "session store is unavailable",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ProblemResponse::from(self).into_response()
    }
}

/// Client errors reported by the backend are passed through with their
/// status; everything else is a bad gateway.
fn backend_problem(err: BackendError) -> ProblemResponse {
    match err {
        BackendError::Status { status, body } if status.is_client_error() => {
            let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            ProblemResponse::new(status, "backend_rejected", backend_message(&body))
        }
        BackendError::Decode(_) | BackendError::UnexpectedPayload(_) => {
            warn!(stage = "backend", error = %err, "backend returned an unreadable payload");
            ProblemResponse::new(
                StatusCode::BAD_GATEWAY,
                "backend_payload_invalid",
                "the placement backend returned an unexpected payload",
            )
        }
        other => {
            warn!(stage = "backend", error = %other, "backend request failed");
            ProblemResponse::new(
                StatusCode::BAD_GATEWAY,
                "backend_unavailable",
                "the placement backend could not be reached",
            )
        }
    }
}

/// Prefers the backend's `message` field over the raw body.
fn backend_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

fn single_error(field: &str, message: &str) -> std::collections::BTreeMap<String, String> {
    std::collections::BTreeMap::from([(field.to_string(), message.to_string())])
}
