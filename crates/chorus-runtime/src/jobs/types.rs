//! Core types for job tracking.
//!
//! Status transitions are strictly monotonic:
//! `Pending → Running → {Completed | Failed}`. A slot is mutated exactly
//! twice on the happy path and then frozen; attempted backward or repeated
//! terminal transitions are rejected (logged, state unchanged). Exactly one
//! spawned execution owns each slot's writer path.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use chorus_core::ids::{AgentId, ChannelId, JobId};

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Per-agent task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created with the job, not yet picked up.
    Pending,
    /// The agent execution is in flight.
    Running,
    /// Finished with a result.
    Completed,
    /// Finished with an error.
    Failed,
}

impl TaskStatus {
    /// Whether this status represents a terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Wire string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Task
// ─────────────────────────────────────────────────────────────────────────────

/// One agent's status/result/error record within a job.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTask {
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Final output text (set on completion).
    pub result: Option<String>,
    /// Human-readable failure description (set on failure).
    pub error: Option<String>,
    /// Whether re-authentication with the service would resolve the
    /// failure — lets a UI prompt for login distinctly.
    pub needs_login: bool,
    /// True when `result` is the best-effort partial returned at the
    /// detection ceiling rather than a settled turn.
    pub partial: bool,
    /// The channel the execution ran in, once acquired.
    pub channel: Option<ChannelId>,
}

impl AgentTask {
    fn pending() -> Self {
        Self {
            status: TaskStatus::Pending,
            result: None,
            error: None,
            needs_login: false,
            partial: false,
            channel: None,
        }
    }
}

/// Mutable cell holding one [`AgentTask`].
///
/// The spawned execution for an agent receives the only writer handle to
/// its slot; readers clone consistent snapshots.
#[derive(Debug)]
pub struct TaskSlot {
    agent: AgentId,
    state: Mutex<AgentTask>,
}

impl TaskSlot {
    /// Create a pending slot for an agent.
    #[must_use]
    pub fn new(agent: AgentId) -> Self {
        Self {
            agent,
            state: Mutex::new(AgentTask::pending()),
        }
    }

    /// The agent this slot belongs to.
    #[must_use]
    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    /// Clone the current task state.
    #[must_use]
    pub fn snapshot(&self) -> AgentTask {
        self.state.lock().clone()
    }

    /// Record the channel the execution acquired.
    pub fn set_channel(&self, channel: ChannelId) {
        self.state.lock().channel = Some(channel);
    }

    /// Transition `Pending → Running`. Returns false (state unchanged) on
    /// any other starting point.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock();
        if state.status == TaskStatus::Pending {
            state.status = TaskStatus::Running;
            true
        } else {
            warn!(agent = %self.agent, status = %state.status, "rejected start transition");
            false
        }
    }

    /// Transition `Running → Completed` with the final text. Returns false
    /// (state unchanged) on any other starting point.
    pub fn complete(&self, result: String, partial: bool) -> bool {
        let mut state = self.state.lock();
        if state.status == TaskStatus::Running {
            state.status = TaskStatus::Completed;
            state.result = Some(result);
            state.partial = partial;
            true
        } else {
            warn!(agent = %self.agent, status = %state.status, "rejected complete transition");
            false
        }
    }

    /// Transition `Running → Failed` with the error description. Returns
    /// false (state unchanged) on any other starting point.
    pub fn fail(&self, error: String, needs_login: bool) -> bool {
        let mut state = self.state.lock();
        if state.status == TaskStatus::Running {
            state.status = TaskStatus::Failed;
            state.error = Some(error);
            state.needs_login = needs_login;
            true
        } else {
            warn!(agent = %self.agent, status = %state.status, "rejected fail transition");
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Job
// ─────────────────────────────────────────────────────────────────────────────

/// One user-submitted prompt fanned out to multiple agents.
#[derive(Debug)]
pub struct Job {
    /// Job identifier.
    pub id: JobId,
    /// The immutable prompt text.
    pub prompt: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    tasks: HashMap<AgentId, std::sync::Arc<TaskSlot>>,
}

impl Job {
    /// Create a job with one pending slot per agent. Duplicate agent IDs
    /// collapse into a single slot (the task map is keyed by agent).
    #[must_use]
    pub fn new(prompt: impl Into<String>, agents: &[AgentId]) -> Self {
        let tasks = agents
            .iter()
            .map(|a| (a.clone(), std::sync::Arc::new(TaskSlot::new(a.clone()))))
            .collect();
        Self {
            id: JobId::new(),
            prompt: prompt.into(),
            created_at: Utc::now(),
            tasks,
        }
    }

    /// The slot for one agent.
    #[must_use]
    pub fn slot(&self, agent: &AgentId) -> Option<std::sync::Arc<TaskSlot>> {
        self.tasks.get(agent).cloned()
    }

    /// All (agent, slot) pairs.
    #[must_use]
    pub fn slots(&self) -> Vec<(AgentId, std::sync::Arc<TaskSlot>)> {
        self.tasks
            .iter()
            .map(|(a, s)| (a.clone(), std::sync::Arc::clone(s)))
            .collect()
    }

    /// The agents this job was fanned out to.
    #[must_use]
    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.tasks.keys().cloned().collect()
    }

    /// Snapshot every task plus the all-completed flag.
    #[must_use]
    pub fn progress(&self) -> ProgressSnapshot {
        let tasks: HashMap<AgentId, AgentTask> = self
            .tasks
            .iter()
            .map(|(a, s)| (a.clone(), s.snapshot()))
            .collect();
        let all_completed = tasks.values().all(|t| t.status.is_terminal());
        ProgressSnapshot {
            tasks,
            all_completed,
        }
    }

    /// Full snapshot including job metadata.
    #[must_use]
    pub fn snapshot(&self) -> JobSnapshot {
        let progress = self.progress();
        JobSnapshot {
            id: self.id.clone(),
            prompt: self.prompt.clone(),
            created_at: self.created_at,
            tasks: progress.tasks,
            all_completed: progress.all_completed,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshots
// ─────────────────────────────────────────────────────────────────────────────

/// Point-in-time view of the latest job's tasks.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Task state per agent.
    pub tasks: HashMap<AgentId, AgentTask>,
    /// True when every task has reached a terminal status (vacuously true
    /// with no tasks).
    pub all_completed: bool,
}

impl ProgressSnapshot {
    /// The empty snapshot reported before any job exists.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tasks: HashMap::new(),
            all_completed: true,
        }
    }
}

/// Point-in-time view of one job.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    /// Job identifier.
    pub id: JobId,
    /// The prompt that was dispatched.
    pub prompt: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Task state per agent.
    pub tasks: HashMap<AgentId, AgentTask>,
    /// True when every task has reached a terminal status.
    pub all_completed: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn agents(keys: &[&str]) -> Vec<AgentId> {
        keys.iter().map(|k| AgentId::new(*k)).collect()
    }

    // -- status --

    #[test]
    fn terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn status_serde_values() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    // -- slot transitions --

    #[test]
    fn happy_path_is_exactly_two_transitions() {
        let slot = TaskSlot::new(AgentId::new("openai"));
        assert_eq!(slot.snapshot().status, TaskStatus::Pending);

        assert!(slot.start());
        assert_eq!(slot.snapshot().status, TaskStatus::Running);

        assert!(slot.complete("result text".into(), false));
        let task = slot.snapshot();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.as_deref(), Some("result text"));
        assert!(!task.partial);
        assert!(task.error.is_none());
    }

    #[test]
    fn failure_records_error_and_login_flag() {
        let slot = TaskSlot::new(AgentId::new("claude"));
        assert!(slot.start());
        assert!(slot.fail("please sign in".into(), true));
        let task = slot.snapshot();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("please sign in"));
        assert!(task.needs_login);
        assert!(task.result.is_none());
    }

    #[test]
    fn backward_transitions_are_rejected() {
        let slot = TaskSlot::new(AgentId::new("grok"));
        assert!(slot.start());
        assert!(slot.complete("done".into(), false));

        // No terminal state can be left again
        assert!(!slot.start());
        assert!(!slot.fail("late failure".into(), false));
        assert!(!slot.complete("second result".into(), false));

        let task = slot.snapshot();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.as_deref(), Some("done"));
        assert!(task.error.is_none());
    }

    #[test]
    fn terminal_transition_requires_running() {
        let slot = TaskSlot::new(AgentId::new("gemini"));
        // Straight to terminal without start is rejected
        assert!(!slot.complete("nope".into(), false));
        assert!(!slot.fail("nope".into(), false));
        assert_eq!(slot.snapshot().status, TaskStatus::Pending);
    }

    #[test]
    fn set_channel_is_visible_in_snapshots() {
        let slot = TaskSlot::new(AgentId::new("openai"));
        assert!(slot.snapshot().channel.is_none());
        slot.set_channel(ChannelId::from("ch-1"));
        assert_eq!(slot.snapshot().channel, Some(ChannelId::from("ch-1")));
    }

    // -- job --

    #[test]
    fn job_creates_one_pending_slot_per_agent() {
        let job = Job::new("prompt", &agents(&["a", "b", "c"]));
        assert_eq!(job.agent_ids().len(), 3);
        for (_, slot) in job.slots() {
            assert_eq!(slot.snapshot().status, TaskStatus::Pending);
        }
    }

    #[test]
    fn duplicate_agents_collapse_into_one_slot() {
        let job = Job::new("prompt", &agents(&["a", "a", "b"]));
        assert_eq!(job.agent_ids().len(), 2);
    }

    #[test]
    fn progress_is_all_completed_only_at_full_terminal() {
        let job = Job::new("prompt", &agents(&["a", "b"]));
        assert!(!job.progress().all_completed);

        let a = job.slot(&AgentId::new("a")).unwrap();
        assert!(a.start());
        assert!(a.complete("done".into(), false));
        assert!(!job.progress().all_completed);

        let b = job.slot(&AgentId::new("b")).unwrap();
        assert!(b.start());
        assert!(b.fail("broken".into(), false));
        let progress = job.progress();
        assert!(progress.all_completed);
        assert_eq!(progress.tasks.len(), 2);
    }

    #[test]
    fn empty_progress_snapshot_is_vacuously_complete() {
        let snapshot = ProgressSnapshot::empty();
        assert!(snapshot.tasks.is_empty());
        assert!(snapshot.all_completed);
    }

    #[test]
    fn job_snapshot_carries_metadata() {
        let job = Job::new("summarize X", &agents(&["a"]));
        let snap = job.snapshot();
        assert_eq!(snap.id, job.id);
        assert_eq!(snap.prompt, "summarize X");
        assert!(!snap.all_completed);
    }

    #[test]
    fn task_serializes_camel_case() {
        let slot = TaskSlot::new(AgentId::new("a"));
        assert!(slot.start());
        assert!(slot.fail("err".into(), true));
        let json = serde_json::to_value(slot.snapshot()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["needsLogin"], true);
        assert!(json["channel"].is_null());
    }
}
