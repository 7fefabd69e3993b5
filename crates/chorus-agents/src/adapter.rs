//! Agent adapter contract and the generic wire-driven implementation.
//!
//! The orchestration engine depends only on [`AgentAdapter`]; per-service
//! interaction mechanics (which control to click, which field to fill)
//! live in the automation script on the far side of the channel and are
//! driven generically by [`WireAdapter`] over the wire protocol. Swappable
//! implementations slot in through [`AdapterFactory`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

use chorus_core::ids::{AgentId, ChannelId};
use chorus_core::wire::{ChannelRequest, ChannelResponse, LoginStatus, OutputSnapshot};
use chorus_settings::DetectorSettings;

use crate::detector::{CompletionDetector, DetectionOutcome, OutputProbe};
use crate::exchange::{Exchange, ExchangeError};
use crate::registry::AgentDescriptor;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failures surfaced by an adapter capability.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The underlying exchange failed.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// The agent is reachable but the user is not authenticated.
    #[error("login required")]
    LoginRequired {
        /// Whether the service is actively showing a login prompt.
        needs_login: bool,
    },

    /// The far side answered with an unexpected message for the request.
    #[error("protocol violation: {message}")]
    Protocol {
        /// Description of the mismatch.
        message: String,
    },
}

impl AdapterError {
    /// Convenience constructor for a protocol violation.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Error category string for event emission.
    #[must_use]
    pub fn category(&self) -> &str {
        match self {
            Self::Exchange(e) => e.category(),
            Self::LoginRequired { .. } => "login",
            Self::Protocol { .. } => "protocol",
        }
    }

    /// Whether re-authentication would resolve this failure.
    #[must_use]
    pub fn needs_login(&self) -> bool {
        matches!(self, Self::LoginRequired { needs_login: true })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

/// Capability set every agent service implementation exposes.
#[async_trait]
pub trait AgentAdapter: Send + Sync {
    /// Registry key of the agent this adapter drives.
    fn agent_id(&self) -> &AgentId;

    /// Verify the adapter will answer (lightweight liveness check).
    async fn check_ready(&self) -> Result<(), AdapterError>;

    /// Ask the service whether the user is authenticated.
    async fn check_logged_in(&self) -> Result<LoginStatus, AdapterError>;

    /// Submit a prompt and wait (via the completion detector) for the
    /// streamed answer.
    async fn submit(&self, prompt: &str) -> Result<DetectionOutcome, AdapterError>;
}

/// Factory producing an adapter for an acquired channel.
///
/// Called once per agent execution, so implementations can pick a strategy
/// per service or per channel.
#[async_trait]
pub trait AdapterFactory: Send + Sync {
    /// Create an adapter bound to `channel` for the described agent.
    async fn create(
        &self,
        descriptor: &AgentDescriptor,
        channel: ChannelId,
    ) -> Result<Arc<dyn AgentAdapter>, AdapterError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire adapter
// ─────────────────────────────────────────────────────────────────────────────

/// Generic adapter that drives the remote automation script over the wire
/// protocol: submit with a task-class request, then infer completion by
/// sampling output reads.
pub struct WireAdapter {
    agent: AgentId,
    channel: ChannelId,
    exchange: Arc<Exchange>,
    detector: CompletionDetector,
}

impl WireAdapter {
    /// Create a wire adapter bound to one channel.
    #[must_use]
    pub fn new(
        agent: AgentId,
        channel: ChannelId,
        exchange: Arc<Exchange>,
        detector: CompletionDetector,
    ) -> Self {
        Self {
            agent,
            channel,
            exchange,
            detector,
        }
    }

    /// The channel this adapter is bound to.
    #[must_use]
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }
}

#[async_trait]
impl OutputProbe for WireAdapter {
    async fn sample(&self) -> Result<OutputSnapshot, AdapterError> {
        match self
            .exchange
            .send_handshake(&self.channel, ChannelRequest::ReadOutput)
            .await?
        {
            ChannelResponse::Output(snap) => Ok(snap),
            other => Err(AdapterError::protocol(format!(
                "expected output snapshot, got {other:?}"
            ))),
        }
    }
}

#[async_trait]
impl AgentAdapter for WireAdapter {
    fn agent_id(&self) -> &AgentId {
        &self.agent
    }

    #[instrument(skip(self), fields(agent = %self.agent, channel = %self.channel))]
    async fn check_ready(&self) -> Result<(), AdapterError> {
        match self
            .exchange
            .send_handshake(&self.channel, ChannelRequest::Ping)
            .await?
        {
            ChannelResponse::Ack { .. } => Ok(()),
            other => Err(AdapterError::protocol(format!(
                "expected ping acknowledgment, got {other:?}"
            ))),
        }
    }

    #[instrument(skip(self), fields(agent = %self.agent, channel = %self.channel))]
    async fn check_logged_in(&self) -> Result<LoginStatus, AdapterError> {
        match self
            .exchange
            .send_handshake(&self.channel, ChannelRequest::CheckLogin)
            .await?
        {
            ChannelResponse::Login(status) => Ok(status),
            other => Err(AdapterError::protocol(format!(
                "expected login status, got {other:?}"
            ))),
        }
    }

    #[instrument(skip(self, prompt), fields(agent = %self.agent, channel = %self.channel))]
    async fn submit(&self, prompt: &str) -> Result<DetectionOutcome, AdapterError> {
        match self
            .exchange
            .send_task(
                &self.channel,
                ChannelRequest::SubmitPrompt {
                    prompt: prompt.to_owned(),
                },
            )
            .await?
        {
            ChannelResponse::Submitted => {}
            other => {
                return Err(AdapterError::protocol(format!(
                    "expected submission acknowledgment, got {other:?}"
                )));
            }
        }

        self.detector.wait(self).await
    }
}

/// Factory producing [`WireAdapter`]s over a shared exchange.
pub struct WireAdapterFactory {
    exchange: Arc<Exchange>,
    detector: DetectorSettings,
}

impl WireAdapterFactory {
    /// Create a factory with the given exchange and detector settings.
    #[must_use]
    pub fn new(exchange: Arc<Exchange>, detector: DetectorSettings) -> Self {
        Self { exchange, detector }
    }
}

#[async_trait]
impl AdapterFactory for WireAdapterFactory {
    async fn create(
        &self,
        descriptor: &AgentDescriptor,
        channel: ChannelId,
    ) -> Result<Arc<dyn AgentAdapter>, AdapterError> {
        Ok(Arc::new(WireAdapter::new(
            descriptor.id.clone(),
            channel,
            Arc::clone(&self.exchange),
            CompletionDetector::from_settings(&self.detector),
        )))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chorus_core::stability::StabilityPolicy;
    use chorus_core::wire::LoginStatus;

    use crate::testing::{ChannelScript, OutputMode, ScriptedTransport, snapshot};
    use crate::transport::ChannelTransport;

    fn wire_adapter(
        script: ChannelScript,
    ) -> (Arc<ScriptedTransport>, WireAdapter, ChannelId) {
        let transport = Arc::new(ScriptedTransport::new());
        let channel = transport.add_channel("https://claude.ai", script);
        let exchange = Arc::new(Exchange::new(
            Arc::clone(&transport) as Arc<dyn ChannelTransport>,
            Duration::from_secs(5),
            Duration::from_secs(1800),
        ));
        let detector = CompletionDetector::new(
            StabilityPolicy {
                stability_threshold: 3,
                min_content_len: 8,
            },
            Duration::from_secs(2),
            Duration::from_secs(2),
            Duration::from_secs(600),
        );
        let adapter = WireAdapter::new(
            AgentId::new("claude"),
            channel.clone(),
            exchange,
            detector,
        );
        (transport, adapter, channel)
    }

    #[tokio::test]
    async fn check_ready_accepts_ack() {
        let (_t, adapter, _c) = wire_adapter(ChannelScript::responsive("claude"));
        adapter.check_ready().await.unwrap();
    }

    #[tokio::test]
    async fn check_ready_surfaces_remote_refusal() {
        let (_t, adapter, _c) = wire_adapter(ChannelScript::dead("claude"));
        let err = adapter.check_ready().await.unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Exchange(ExchangeError::Remote { .. })
        ));
    }

    #[tokio::test]
    async fn check_logged_in_passes_status_through() {
        let mut script = ChannelScript::responsive("claude");
        script.login = LoginStatus {
            logged_in: false,
            needs_login: true,
        };
        let (_t, adapter, _c) = wire_adapter(script);
        let status = adapter.check_logged_in().await.unwrap();
        assert!(!status.logged_in);
        assert!(status.needs_login);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_drives_detection_to_completion() {
        let script = ChannelScript::responsive("claude").with_output(OutputMode::Sequence(vec![
            snapshot(10, true),
            snapshot(50, true),
            snapshot(120, false),
            snapshot(120, false),
            snapshot(120, false),
            snapshot(120, false),
        ]));
        let (transport, adapter, channel) = wire_adapter(script);

        let outcome = adapter.submit("summarize X").await.unwrap();
        assert!(outcome.complete);
        assert_eq!(outcome.text.len(), 120);
        assert_eq!(transport.submitted_prompts(&channel), vec!["summarize X"]);
    }

    #[tokio::test]
    async fn submit_surfaces_remote_composer_failure() {
        let mut script = ChannelScript::responsive("claude");
        script.submit_error = Some("send button not found or disabled".into());
        let (_t, adapter, _c) = wire_adapter(script);

        let err = adapter.submit("hello").await.unwrap_err();
        assert!(matches!(
            err,
            AdapterError::Exchange(ExchangeError::Remote { .. })
        ));
    }

    #[tokio::test]
    async fn adapter_error_classifiers() {
        let login = AdapterError::LoginRequired { needs_login: true };
        assert_eq!(login.category(), "login");
        assert!(login.needs_login());

        let soft = AdapterError::LoginRequired { needs_login: false };
        assert!(!soft.needs_login());

        let protocol = AdapterError::protocol("nope");
        assert_eq!(protocol.category(), "protocol");
        assert!(!protocol.needs_login());
    }

    #[tokio::test]
    async fn factory_binds_adapter_to_channel() {
        let transport = Arc::new(ScriptedTransport::new());
        let channel =
            transport.add_channel("https://chatgpt.com", ChannelScript::responsive("openai"));
        let exchange = Arc::new(Exchange::new(
            Arc::clone(&transport) as Arc<dyn ChannelTransport>,
            Duration::from_secs(5),
            Duration::from_secs(1800),
        ));
        let factory = WireAdapterFactory::new(exchange, chorus_settings::DetectorSettings::default());

        let descriptor = crate::registry::AgentRegistry::builtin()
            .get(&AgentId::new("openai"))
            .cloned()
            .unwrap();
        let adapter = factory.create(&descriptor, channel).await.unwrap();
        assert_eq!(adapter.agent_id().as_str(), "openai");
        adapter.check_ready().await.unwrap();
    }
}
