//! Wire vocabulary exchanged with the automation adapter inside a channel.
//!
//! The channel host (a browser-like remote, abstracted behind
//! `chorus_agents::transport::ChannelTransport`) carries these messages to
//! and from the per-service automation adapter that lives on the far side.
//! All serializable types use `camelCase` for wire compatibility.
//!
//! Two message families:
//!
//! - **[`ChannelRequest`]**: what the orchestrator asks of a channel
//!   (liveness ping, reinitialize, login check, prompt submission, output
//!   sampling).
//! - **[`ChannelResponse`]**: the structured answers, including the
//!   [`OutputSnapshot`] that feeds the completion-detection state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ChannelId;

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// A request delivered to the automation adapter inside a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ChannelRequest {
    /// Lightweight liveness check. A responsive adapter answers
    /// [`ChannelResponse::Ack`] immediately.
    Ping,

    /// Ask an adapter whose listener may have gone stale to re-register it.
    Reinitialize,

    /// Ask the adapter whether the user is authenticated with the service.
    CheckLogin,

    /// Submit the task prompt into the service's composer and send it.
    #[serde(rename_all = "camelCase")]
    SubmitPrompt {
        /// The full prompt text.
        prompt: String,
    },

    /// Read the current state of the streamed output.
    ReadOutput,
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication state reported by an adapter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginStatus {
    /// Whether the user is currently authenticated.
    pub logged_in: bool,
    /// Whether the service is showing a login prompt (as opposed to the
    /// interface simply not having rendered yet).
    pub needs_login: bool,
}

/// One observation of an agent's streamed output.
///
/// The completion detector consumes a sequence of these; each carries the
/// rendered text plus the corroborating signals the service exposes around
/// an in-flight turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSnapshot {
    /// The full rendered output text at sampling time.
    pub text: String,
    /// A transient indicator the service shows while actively producing
    /// tokens (e.g. a streaming/typing animation).
    pub streaming: bool,
    /// An affordance that only appears once a turn is finished
    /// (e.g. a regenerate action).
    pub finality_control: bool,
    /// A stop affordance shown while a turn is in flight.
    pub stop_control: bool,
}

impl OutputSnapshot {
    /// Length of the rendered text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the rendered text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A structured answer from the automation adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChannelResponse {
    /// Liveness acknowledgment.
    #[serde(rename_all = "camelCase")]
    Ack {
        /// Registry key of the agent whose adapter answered.
        agent: String,
    },

    /// Answer to [`ChannelRequest::CheckLogin`].
    Login(LoginStatus),

    /// The prompt was accepted and the turn has started.
    Submitted,

    /// Answer to [`ChannelRequest::ReadOutput`].
    Output(OutputSnapshot),

    /// The adapter hit an error executing the request.
    #[serde(rename_all = "camelCase")]
    Error {
        /// Human-readable description from the far side.
        message: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Channel state
// ─────────────────────────────────────────────────────────────────────────────

/// Load state of a channel as reported by the channel host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadState {
    /// Still loading; not yet addressable.
    Loading,
    /// Load complete. Note that a complete load does not guarantee the
    /// adapter inside has initialized — that is what the readiness
    /// handshake verifies.
    Complete,
}

/// Descriptive record of one channel known to the channel host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    /// Channel identifier, stable for the channel's lifetime.
    pub id: ChannelId,
    /// Current URL the channel points at.
    pub url: String,
    /// Current load state.
    pub load_state: LoadState,
    /// When the channel was last active (used to pick the preferred
    /// channel when several match one agent).
    pub last_active: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
