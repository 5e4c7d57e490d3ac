use serde::Serialize;

use crate::types::{Job, Round};

/// Loading status of the job list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Client-side job state for one tenant session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobsState {
    pub jobs: Vec<Job>,
    pub status: LoadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcomes of job requests, applied through [`JobsState::reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum JobAction {
    FetchPending,
    FetchFulfilled(Vec<Job>),
    FetchRejected(String),
    Created(Job),
    Updated(Job),
    Deleted(String),
    RoundsAdded { job_id: String, rounds: Vec<Round> },
}

impl JobAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FetchPending => "fetch_pending",
            Self::FetchFulfilled(_) => "fetch_fulfilled",
            Self::FetchRejected(_) => "fetch_rejected",
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Deleted(_) => "deleted",
            Self::RoundsAdded { .. } => "rounds_added",
        }
    }
}

impl JobsState {
    /// Returns the next state. The previous state is never mutated.
    pub fn reduce(&self, action: JobAction) -> Self {
        match action {
            JobAction::FetchPending => Self {
                jobs: self.jobs.clone(),
                status: LoadStatus::Loading,
                error: None,
            },
            JobAction::FetchFulfilled(jobs) => Self {
                jobs,
                status: LoadStatus::Succeeded,
                error: None,
            },
            JobAction::FetchRejected(message) => Self {
                jobs: self.jobs.clone(),
                status: LoadStatus::Failed,
                error: Some(message),
            },
            JobAction::Created(job) => {
                let mut jobs = self.jobs.clone();
                jobs.push(job);
                self.with_jobs(jobs)
            }
            JobAction::Updated(job) => {
                let jobs = self
                    .jobs
                    .iter()
                    .map(|existing| {
                        if job.id.is_some() && existing.id == job.id {
                            job.clone()
                        } else {
                            existing.clone()
                        }
                    })
                    .collect();
                self.with_jobs(jobs)
            }
            JobAction::Deleted(id) => {
                let jobs = self
                    .jobs
                    .iter()
                    .filter(|job| job.id.as_deref() != Some(id.as_str()))
                    .cloned()
                    .collect();
                self.with_jobs(jobs)
            }
            JobAction::RoundsAdded { job_id, rounds } => {
                let jobs = self
                    .jobs
                    .iter()
                    .map(|job| {
                        let mut job = job.clone();
                        if job.id.as_deref() == Some(job_id.as_str()) {
                            job.rounds.extend(rounds.iter().cloned());
                        }
                        job
                    })
                    .collect();
                self.with_jobs(jobs)
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id.as_deref() == Some(id))
    }

    fn with_jobs(&self, jobs: Vec<Job>) -> Self {
        Self {
            jobs,
            status: self.status,
            error: self.error.clone(),
        }
    }
}
