//! Channel transport boundary.
//!
//! The channel host — the remote, browser-like environment that actually
//! renders the agent services — is abstracted behind [`ChannelTransport`].
//! The orchestration engine is written once against this trait; concrete
//! hosts (a driven browser, a remote automation bridge, the in-memory
//! [`crate::testing::ScriptedTransport`]) implement it externally.
//!
//! Delivery failures are reported as raw [`TransportFault`]s; timeout
//! handling and error classification live in [`crate::exchange`].

use async_trait::async_trait;

use chorus_core::errors::TransportFault;
use chorus_core::ids::ChannelId;
use chorus_core::wire::{ChannelInfo, ChannelRequest, ChannelResponse, LoadState};

/// The remote channel host boundary.
///
/// Implementors must be `Send + Sync` for use across spawned agent
/// executions. `request` delivers a message to the automation adapter
/// inside a channel and resolves with its structured answer; it has no
/// timeout of its own — callers bound it.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Enumerate all channels the host currently has open.
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, TransportFault>;

    /// Open a new channel at `url`. `background` opens it without focusing.
    async fn open_channel(&self, url: &str, background: bool)
    -> Result<ChannelInfo, TransportFault>;

    /// Bring an existing channel to the foreground.
    async fn activate(&self, channel: &ChannelId) -> Result<(), TransportFault>;

    /// Current load state of a channel.
    async fn load_state(&self, channel: &ChannelId) -> Result<LoadState, TransportFault>;

    /// Deliver a request to the automation adapter inside a channel and
    /// await its answer.
    async fn request(
        &self,
        channel: &ChannelId,
        request: ChannelRequest,
    ) -> Result<ChannelResponse, TransportFault>;

    /// Whether the automation adapter's code is present in the channel
    /// (it may still have a stale listener — that is what a ping verifies).
    async fn has_adapter(&self, channel: &ChannelId) -> Result<bool, TransportFault>;

    /// Inject the automation adapter into the channel fresh.
    async fn inject_adapter(&self, channel: &ChannelId) -> Result<(), TransportFault>;
}
