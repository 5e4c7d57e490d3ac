mod error;
mod extract;
mod jobs;
mod maintenance;
mod notices;
mod problem;
mod reference;
mod reports;
mod router;
mod session;
mod students;
mod telemetry;
mod upstream;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

use tracing::info;

use placement_console_api::BackendClient;
use placement_console_storage::Database;
use placement_console_util::{load_env_file, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_file = load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    if let Some(path) = env_file {
        info!(stage = "app", path = %path.display(), "loaded environment file");
    }
    let metrics = telemetry::init_metrics()?;

    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;

    let http = reqwest::Client::builder()
        .timeout(config.backend_timeout)
        .build()?;
    let backend = BackendClient::new(config.backend_base_url.clone(), http);
    let session_ttl = chrono::Duration::from_std(config.session_ttl)?;

    let state = router::AppState::new(metrics, database, backend, session_ttl);
    maintenance::SessionSweeper::new(state.clone()).spawn();

    let addr: SocketAddr = config.bind_addr;
    info!(
        stage = "app",
        %addr,
        env = %config.environment.as_str(),
        backend = %config.backend_base_url,
        "starting HTTP server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
