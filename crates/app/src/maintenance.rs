use std::{collections::HashSet, time::Duration};

use metrics::counter;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use placement_console_storage::SessionError;

use crate::router::AppState;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Background worker that drops expired sessions together with their
/// cached reference data and job state.
#[derive(Clone)]
pub struct SessionSweeper {
    state: AppState,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Runs the worker loop in the background.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop().await;
        })
    }

    async fn run_loop(self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.run_once().await {
                error!(stage = "session", error = %err, "session sweep failed");
            }
        }
    }

    /// Executes one sweep and returns how many sessions were removed.
    /// Cached entries whose session is gone are dropped as well, which covers
    /// requests that finished after their session was closed.
    pub async fn run_once(&self) -> Result<usize, SessionError> {
        let now = self.state.now();
        let sessions = self.state.storage().sessions();
        let purged = sessions.purge_expired(now).await?;

        let cached = self.state.cached_session_ids().await;
        let orphaned: Vec<String> = if cached.is_empty() {
            Vec::new()
        } else {
            let active: HashSet<String> = sessions.active_ids(now).await?.into_iter().collect();
            cached
                .into_iter()
                .filter(|id| !active.contains(id))
                .collect()
        };
        if !orphaned.is_empty() {
            self.state.forget_sessions(&orphaned).await;
            debug!(stage = "session", dropped = orphaned.len(), "stale session caches dropped");
        }

        if purged.is_empty() {
            return Ok(0);
        }
        counter!("sessions_purged_total").increment(purged.len() as u64);
        info!(
            stage = "session",
            purged = purged.len(),
            threshold = %now.to_rfc3339(),
            "expired sessions purged"
        );
        Ok(purged.len())
    }
}
