use std::{future::Future, time::Instant};

use metrics::{counter, histogram};
use tracing::{debug, warn};

use placement_console_api::BackendError;

use crate::error::ApiError;

/// Runs one backend call, recording its latency and outcome under `endpoint`.
pub async fn observe<T, F>(endpoint: &'static str, tenant: &str, call: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    let started = Instant::now();
    let result = call.await;
    let elapsed = started.elapsed().as_secs_f64();
    histogram!("backend_request_seconds", "endpoint" => endpoint).record(elapsed);

    match result {
        Ok(value) => {
            counter!("backend_requests_total", "endpoint" => endpoint, "result" => "ok")
                .increment(1);
            debug!(stage = "backend", endpoint, tenant, elapsed, "backend call succeeded");
            Ok(value)
        }
        Err(err) => {
            let outcome = match err.status() {
                Some(status) if status.is_client_error() => "rejected",
                _ => "failed",
            };
            counter!("backend_requests_total", "endpoint" => endpoint, "result" => outcome)
                .increment(1);
            warn!(
                stage = "backend",
                endpoint,
                tenant,
                elapsed,
                error = %err,
                "backend call failed"
            );
            Err(ApiError::Backend(err))
        }
    }
}
