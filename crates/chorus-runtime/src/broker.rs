//! Session broker — channel acquisition, reuse, and load waits.
//!
//! A channel pointed at an agent's service is reused when one exists (the
//! most recently active match across all of the agent's address patterns,
//! brought to the foreground); otherwise a fresh one is opened in the
//! background at the agent's preferred entry URL. A channel that reports a
//! complete load still gets a settle delay before it is considered usable,
//! since load completion does not guarantee the adapter inside has
//! initialized.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use chorus_agents::registry::AgentDescriptor;
use chorus_agents::transport::ChannelTransport;
use chorus_core::ids::ChannelId;
use chorus_core::wire::{ChannelInfo, LoadState};
use chorus_settings::BrokerSettings;

use crate::errors::RuntimeError;

/// Acquires and prepares channels for agent executions.
pub struct SessionBroker {
    transport: Arc<dyn ChannelTransport>,
    settings: BrokerSettings,
}

impl SessionBroker {
    /// Create a broker over a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn ChannelTransport>, settings: BrokerSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Find or create a channel for the agent.
    ///
    /// Every address pattern the agent carries is checked (services keep
    /// legacy domains alive next to current ones). When several channels
    /// match, the most recently active one wins and is foregrounded;
    /// otherwise a new background channel is opened at the preferred entry
    /// URL.
    #[instrument(skip(self, descriptor), fields(agent = %descriptor.id))]
    pub async fn acquire(&self, descriptor: &AgentDescriptor) -> Result<ChannelInfo, RuntimeError> {
        let channels = self.transport.list_channels().await?;
        let existing = channels
            .into_iter()
            .filter(|c| descriptor.matches_url(&c.url))
            .max_by_key(|c| c.last_active);

        if let Some(channel) = existing {
            info!(channel = %channel.id, url = %channel.url, "reusing existing channel");
            self.transport.activate(&channel.id).await?;
            return Ok(channel);
        }

        let url = descriptor.preferred_entry();
        info!(url, "opening new channel");
        Ok(self.transport.open_channel(url, true).await?)
    }

    /// Poll the channel's load state until complete, then apply the settle
    /// delay. Fails with [`RuntimeError::ChannelLoadTimeout`] when the
    /// channel never finishes loading.
    #[instrument(skip(self), fields(channel = %channel))]
    pub async fn await_loaded(&self, channel: &ChannelId) -> Result<(), RuntimeError> {
        let started = tokio::time::Instant::now();
        loop {
            if self.transport.load_state(channel).await? == LoadState::Complete {
                break;
            }
            if started.elapsed() >= self.settings.load_timeout() {
                return Err(RuntimeError::ChannelLoadTimeout {
                    elapsed_ms: self.settings.load_timeout_ms,
                });
            }
            tokio::time::sleep(self.settings.load_poll()).await;
        }

        debug!("load complete; settling");
        tokio::time::sleep(self.settings.settle()).await;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
