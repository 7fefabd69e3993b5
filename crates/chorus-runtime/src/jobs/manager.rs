//! Job arena and progress queries.
//!
//! Jobs live in an explicit arena keyed by generated IDs; a separate
//! latest-job marker backs the progress query. Jobs are never deleted —
//! a newer submission simply supersedes the old one as "latest".

use std::sync::Arc;

use dashmap::DashMap;
use metrics::counter;
use parking_lot::Mutex;
use tracing::{info, instrument};

use chorus_agents::registry::AgentRegistry;
use chorus_core::ids::{AgentId, JobId};

use crate::errors::RuntimeError;
use crate::jobs::types::{Job, JobSnapshot, ProgressSnapshot};

/// Owns all job records and answers progress queries.
#[derive(Default)]
pub struct JobManager {
    jobs: DashMap<JobId, Arc<Job>>,
    latest: Mutex<Option<JobId>>,
}

impl JobManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a submission and create the job record with every task
    /// pending. Fan-out is the caller's responsibility — this only builds
    /// and registers the record (and marks it latest).
    #[instrument(skip(self, prompt, registry), fields(agents = agent_ids.len()))]
    pub fn create_job(
        &self,
        prompt: &str,
        agent_ids: &[AgentId],
        registry: &AgentRegistry,
    ) -> Result<Arc<Job>, RuntimeError> {
        if prompt.trim().is_empty() {
            return Err(RuntimeError::InvalidInput(
                "prompt must not be empty".into(),
            ));
        }
        if agent_ids.is_empty() {
            return Err(RuntimeError::InvalidInput(
                "at least one agent must be selected".into(),
            ));
        }
        if let Some(unknown) = agent_ids.iter().find(|a| !registry.contains(a)) {
            return Err(RuntimeError::UnknownAgent((*unknown).clone()));
        }

        let job = Arc::new(Job::new(prompt, agent_ids));
        let id = job.id.clone();
        let _ = self.jobs.insert(id.clone(), Arc::clone(&job));
        *self.latest.lock() = Some(id.clone());
        counter!("chorus_jobs_submitted_total").increment(1);
        info!(job_id = %id, agents = agent_ids.len(), "job created");
        Ok(job)
    }

    /// Snapshot of the most recently created job's tasks. With no job yet,
    /// an empty map with `all_completed = true`.
    #[must_use]
    pub fn progress(&self) -> ProgressSnapshot {
        self.latest_job()
            .map_or_else(ProgressSnapshot::empty, |job| job.progress())
    }

    /// Look up a job by ID.
    #[must_use]
    pub fn job(&self, id: &JobId) -> Option<Arc<Job>> {
        self.jobs.get(id).map(|j| Arc::clone(&j))
    }

    /// Snapshot a job by ID.
    #[must_use]
    pub fn job_snapshot(&self, id: &JobId) -> Option<JobSnapshot> {
        self.job(id).map(|j| j.snapshot())
    }

    /// The most recently created job.
    #[must_use]
    pub fn latest_job(&self) -> Option<Arc<Job>> {
        let latest = self.latest.lock().clone();
        latest.and_then(|id| self.job(&id))
    }

    /// ID of the most recently created job.
    #[must_use]
    pub fn latest_job_id(&self) -> Option<JobId> {
        self.latest.lock().clone()
    }

    /// Number of jobs in the arena.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
