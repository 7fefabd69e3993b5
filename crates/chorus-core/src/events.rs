//! Job lifecycle events.
//!
//! [`ChorusEvent`]s are broadcast by the runtime as jobs and per-agent
//! tasks move through their lifecycle. They are transient (never persisted)
//! and exist so that a UI layer can render live progress without polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Common fields carried by every event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseEvent {
    /// The job this event belongs to.
    pub job_id: String,
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
}

impl BaseEvent {
    /// Create a base stamped with the current time.
    #[must_use]
    pub fn now(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            timestamp: Utc::now(),
        }
    }
}

/// High-level job/task lifecycle events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChorusEvent {
    /// A job was created and its fan-out launched.
    #[serde(rename = "job_created")]
    JobCreated {
        /// Common fields.
        base: BaseEvent,
        /// Registry keys of the agents the job was fanned out to.
        agents: Vec<String>,
    },

    /// One agent's execution began (its task moved to running).
    #[serde(rename = "task_started")]
    TaskStarted {
        /// Common fields.
        base: BaseEvent,
        /// The agent whose task started.
        agent: String,
    },

    /// One agent's task finished with a result.
    #[serde(rename = "task_completed")]
    TaskCompleted {
        /// Common fields.
        base: BaseEvent,
        /// The agent whose task completed.
        agent: String,
        /// True when the result is the best-effort partial returned at the
        /// detection ceiling rather than a settled turn.
        partial: bool,
    },

    /// One agent's task finished with an error.
    #[serde(rename = "task_failed")]
    TaskFailed {
        /// Common fields.
        base: BaseEvent,
        /// The agent whose task failed.
        agent: String,
        /// Human-readable error description.
        error: String,
        /// Whether re-authentication with the service would resolve it.
        #[serde(rename = "needsLogin")]
        needs_login: bool,
    },

    /// The readiness handshake had to escalate past a plain ping.
    #[serde(rename = "handshake_escalated")]
    HandshakeEscalated {
        /// Common fields.
        base: BaseEvent,
        /// The agent being verified.
        agent: String,
        /// The remediation step that ultimately succeeded.
        step: String,
    },
}

impl ChorusEvent {
    /// The event's wire type tag.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::JobCreated { .. } => "job_created",
            Self::TaskStarted { .. } => "task_started",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskFailed { .. } => "task_failed",
            Self::HandshakeEscalated { .. } => "handshake_escalated",
        }
    }

    /// The job the event belongs to.
    #[must_use]
    pub fn job_id(&self) -> &str {
        match self {
            Self::JobCreated { base, .. }
            | Self::TaskStarted { base, .. }
            | Self::TaskCompleted { base, .. }
            | Self::TaskFailed { base, .. }
            | Self::HandshakeEscalated { base, .. } => &base.job_id,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
