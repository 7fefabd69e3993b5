//! Readiness verifier — the escalating handshake run before submission.
//!
//! Remote adapter initialization is unreliable and must be actively
//! verified and remediated, not assumed. The protocol is a sequence of
//! escalating remediations (not a flat retry loop — each step performs
//! materially different repair work), short-circuiting on the first
//! successful ping:
//!
//! 1. **Ping** with a short timeout.
//! 2. **Presence probe + soft reinit**: if the adapter code is present but
//!    its listener may be stale, issue a reinitialize, settle, ping again.
//! 3. **Hard reinjection**: inject the adapter fresh, settle longer, ping
//!    with an extended timeout.
//! 4. **Fatal**: report the adapter unavailable; the agent's task fails
//!    and no submission is attempted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use chorus_agents::exchange::Exchange;
use chorus_agents::transport::ChannelTransport;
use chorus_core::ids::ChannelId;
use chorus_core::wire::{ChannelRequest, ChannelResponse};
use chorus_settings::HandshakeSettings;

use crate::errors::RuntimeError;

// ─────────────────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────────────────

/// The remediation step at which the handshake succeeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeStep {
    /// The plain ping answered.
    Ping,
    /// A soft reinitialize revived a stale listener.
    SoftReinit,
    /// A hard reinjection was needed.
    Reinject,
}

impl HandshakeStep {
    /// Wire string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::SoftReinit => "soft_reinit",
            Self::Reinject => "reinject",
        }
    }
}

impl std::fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandshakeReport {
    /// The step that produced the acknowledgment.
    pub step: HandshakeStep,
    /// Total pings sent across all steps.
    pub pings_sent: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Verifier
// ─────────────────────────────────────────────────────────────────────────────

/// Runs the escalating readiness protocol against one channel.
pub struct ReadinessVerifier {
    exchange: Arc<Exchange>,
    transport: Arc<dyn ChannelTransport>,
    settings: HandshakeSettings,
}

impl ReadinessVerifier {
    /// Create a verifier.
    #[must_use]
    pub fn new(
        exchange: Arc<Exchange>,
        transport: Arc<dyn ChannelTransport>,
        settings: HandshakeSettings,
    ) -> Self {
        Self {
            exchange,
            transport,
            settings,
        }
    }

    /// Confirm the adapter inside `channel` will answer, escalating through
    /// the remediation steps. Fails with
    /// [`RuntimeError::AdapterUnavailable`] when every step is exhausted.
    #[instrument(skip(self), fields(channel = %channel))]
    pub async fn verify(&self, channel: &ChannelId) -> Result<HandshakeReport, RuntimeError> {
        // Step 1: plain ping.
        let mut pings_sent = 1;
        if self.ping(channel, self.settings.ping_timeout_ms).await {
            debug!("adapter answered the initial ping");
            return Ok(HandshakeReport {
                step: HandshakeStep::Ping,
                pings_sent,
            });
        }

        // Step 2: presence probe + soft reinit. Only applicable when the
        // adapter code is present — its listener may merely be stale.
        let present = match self.transport.has_adapter(channel).await {
            Ok(present) => present,
            Err(fault) => {
                warn!(error = %fault, "presence probe failed");
                false
            }
        };
        if present {
            warn!("adapter present but unresponsive; issuing soft reinitialize");
            if let Err(e) = self
                .exchange
                .send(
                    channel,
                    ChannelRequest::Reinitialize,
                    self.settings.ping_timeout(),
                )
                .await
            {
                warn!(error = %e, "reinitialize request failed");
            }
            tokio::time::sleep(self.settings.reinit_settle()).await;

            pings_sent += 1;
            if self.ping(channel, self.settings.ping_timeout_ms).await {
                return Ok(HandshakeReport {
                    step: HandshakeStep::SoftReinit,
                    pings_sent,
                });
            }
        }

        // Step 3: hard reinjection with a longer settle and an extended
        // ping timeout.
        warn!("adapter unresponsive; injecting automation script fresh");
        if let Err(fault) = self.transport.inject_adapter(channel).await {
            warn!(error = %fault, "adapter injection failed");
            return Err(RuntimeError::AdapterUnavailable {
                channel: channel.clone(),
            });
        }
        tokio::time::sleep(self.settings.inject_settle()).await;

        pings_sent += 1;
        if self
            .ping(channel, self.settings.extended_ping_timeout_ms)
            .await
        {
            return Ok(HandshakeReport {
                step: HandshakeStep::Reinject,
                pings_sent,
            });
        }

        // Step 4: fatal.
        Err(RuntimeError::AdapterUnavailable {
            channel: channel.clone(),
        })
    }

    async fn ping(&self, channel: &ChannelId, timeout_ms: u64) -> bool {
        let result = self
            .exchange
            .send(
                channel,
                ChannelRequest::Ping,
                std::time::Duration::from_millis(timeout_ms),
            )
            .await;
        matches!(result, Ok(ChannelResponse::Ack { .. }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
