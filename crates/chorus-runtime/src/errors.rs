//! Runtime error types.
//!
//! Propagation policy: every per-agent failure is isolated into that
//! agent's task slot (as a human-readable string plus the `needs_login`
//! flag) and never aborts sibling agents or the job; only malformed
//! top-level calls surface a [`RuntimeError`] directly to the caller.

use thiserror::Error;

use chorus_agents::adapter::AdapterError;
use chorus_agents::exchange::ExchangeError;
use chorus_core::errors::TransportFault;
use chorus_core::ids::{AgentId, ChannelId};

/// Errors that can occur during job execution and orchestration.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Bad caller input (empty prompt, empty agent list).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested agent is not in the registry.
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// The channel never reported a complete load.
    #[error("channel load timed out after {elapsed_ms}ms")]
    ChannelLoadTimeout {
        /// How long was waited, in milliseconds.
        elapsed_ms: u64,
    },

    /// Every handshake escalation step failed; no submission was attempted.
    #[error("adapter unavailable in channel {channel} after full handshake escalation")]
    AdapterUnavailable {
        /// The channel that was being verified.
        channel: ChannelId,
    },

    /// The agent is reachable but the user is not authenticated. Please
    /// sign in to the service and retry.
    #[error("login required for {agent}: please sign in to the service first")]
    LoginRequired {
        /// The agent requiring authentication.
        agent: AgentId,
        /// Whether the service is actively showing a login prompt, so a UI
        /// can offer re-authentication distinctly from generic failure.
        needs_login: bool,
    },

    /// Raw channel-host fault outside an exchange (listing, opening,
    /// activating channels).
    #[error(transparent)]
    Transport(#[from] TransportFault),

    /// Classified message-exchange failure.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// Adapter capability failure.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Internal / unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RuntimeError {
    /// Error category string for event emission.
    #[must_use]
    pub fn category(&self) -> &str {
        match self {
            Self::InvalidInput(_) => "input",
            Self::UnknownAgent(_) => "unknown_agent",
            Self::ChannelLoadTimeout { .. } => "load_timeout",
            Self::AdapterUnavailable { .. } => "adapter_unavailable",
            Self::LoginRequired { .. } => "login",
            Self::Transport(_) => "transport",
            Self::Exchange(e) => e.category(),
            Self::Adapter(e) => e.category(),
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the failure might clear on a plain retry (user action or
    /// transient conditions), as opposed to needing intervention.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ChannelLoadTimeout { .. } | Self::LoginRequired { .. } => true,
            Self::Transport(fault) => fault.is_closed(),
            Self::Exchange(e) => matches!(
                e,
                ExchangeError::Timeout { .. } | ExchangeError::Closed { .. }
            ),
            Self::InvalidInput(_)
            | Self::UnknownAgent(_)
            | Self::AdapterUnavailable { .. }
            | Self::Adapter(_)
            | Self::Internal(_) => false,
        }
    }

    /// Whether re-authentication with the service would resolve this.
    #[must_use]
    pub fn needs_login(&self) -> bool {
        match self {
            Self::LoginRequired { needs_login, .. } => *needs_login,
            Self::Adapter(e) => e.needs_login(),
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
