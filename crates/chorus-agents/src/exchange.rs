//! Request/response exchange over a channel.
//!
//! Wraps raw [`ChannelTransport::request`] delivery with the two timeout
//! classes the engine needs — short for handshake-class requests, very long
//! for task submission (agents may legitimately take tens of minutes to
//! produce output) — and classifies failures. Absence of any response
//! before the deadline is itself a failure, never an indefinite wait.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use chorus_core::errors::TransportFault;
use chorus_core::ids::ChannelId;
use chorus_core::wire::{ChannelRequest, ChannelResponse};
use chorus_settings::ExchangeSettings;

use crate::transport::ChannelTransport;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Classified exchange failure.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The channel was destroyed. Actionable: reacquire the channel.
    #[error("channel closed: {message}")]
    Closed {
        /// Host-provided description.
        message: String,
    },

    /// No response arrived before the deadline.
    #[error("no response within {elapsed_ms}ms")]
    Timeout {
        /// The deadline that expired, in milliseconds.
        elapsed_ms: u64,
    },

    /// Generic delivery failure.
    #[error("transport failure: {message}")]
    Transport {
        /// Host-provided description.
        message: String,
    },

    /// The far side answered with a structured error.
    #[error("remote error: {message}")]
    Remote {
        /// Adapter-provided description.
        message: String,
    },
}

impl ExchangeError {
    /// Error category string for event emission.
    #[must_use]
    pub fn category(&self) -> &str {
        match self {
            Self::Closed { .. } => "closed",
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::Remote { .. } => "remote",
        }
    }
}

impl From<TransportFault> for ExchangeError {
    fn from(fault: TransportFault) -> Self {
        match fault {
            TransportFault::Closed { message } => Self::Closed { message },
            TransportFault::Failed { message } => Self::Transport { message },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange
// ─────────────────────────────────────────────────────────────────────────────

/// Bounded request/response delivery over channels.
pub struct Exchange {
    transport: Arc<dyn ChannelTransport>,
    handshake_timeout: Duration,
    task_timeout: Duration,
}

impl Exchange {
    /// Create an exchange over a transport with explicit timeout classes.
    #[must_use]
    pub fn new(
        transport: Arc<dyn ChannelTransport>,
        handshake_timeout: Duration,
        task_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            handshake_timeout,
            task_timeout,
        }
    }

    /// Create an exchange with timeouts from settings.
    #[must_use]
    pub fn from_settings(transport: Arc<dyn ChannelTransport>, settings: &ExchangeSettings) -> Self {
        Self::new(
            transport,
            settings.handshake_timeout(),
            settings.task_timeout(),
        )
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn ChannelTransport> {
        &self.transport
    }

    /// Deliver a request and await a structured response within `timeout`.
    ///
    /// A [`ChannelResponse::Error`] answer is surfaced as
    /// [`ExchangeError::Remote`]; every other variant is returned to the
    /// caller for protocol-level interpretation.
    pub async fn send(
        &self,
        channel: &ChannelId,
        request: ChannelRequest,
        timeout: Duration,
    ) -> Result<ChannelResponse, ExchangeError> {
        debug!(channel = %channel, ?request, ?timeout, "sending channel request");
        let response = tokio::time::timeout(timeout, self.transport.request(channel, request))
            .await
            .map_err(|_| ExchangeError::Timeout {
                elapsed_ms: timeout.as_millis() as u64,
            })??;

        match response {
            ChannelResponse::Error { message } => Err(ExchangeError::Remote { message }),
            other => Ok(other),
        }
    }

    /// Deliver a handshake-class request (short timeout).
    pub async fn send_handshake(
        &self,
        channel: &ChannelId,
        request: ChannelRequest,
    ) -> Result<ChannelResponse, ExchangeError> {
        self.send(channel, request, self.handshake_timeout).await
    }

    /// Deliver a task-class request (very long timeout).
    pub async fn send_task(
        &self,
        channel: &ChannelId,
        request: ChannelRequest,
    ) -> Result<ChannelResponse, ExchangeError> {
        self.send(channel, request, self.task_timeout).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
