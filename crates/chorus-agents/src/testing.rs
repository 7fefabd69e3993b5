//! In-memory channel host for tests.
//!
//! [`ScriptedTransport`] implements [`ChannelTransport`] over scripted
//! per-channel behaviors so that broker, handshake, detector, and
//! end-to-end tests can exercise the full pipeline without a real channel
//! host. Channels are added with a [`ChannelScript`] describing how their
//! adapter behaves; the transport records every interaction for
//! assertions.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use chorus_core::errors::TransportFault;
use chorus_core::ids::ChannelId;
use chorus_core::wire::{
    ChannelInfo, ChannelRequest, ChannelResponse, LoadState, LoginStatus, OutputSnapshot,
};

use crate::transport::ChannelTransport;

// ─────────────────────────────────────────────────────────────────────────────
// Scripts
// ─────────────────────────────────────────────────────────────────────────────

/// How a channel reports its streamed output across `ReadOutput` samples.
#[derive(Clone, Debug)]
pub enum OutputMode {
    /// Play this sequence; the last snapshot repeats forever.
    Sequence(Vec<OutputSnapshot>),
    /// Output that never stabilizes: every read grows by `step` bytes and
    /// keeps the streaming indicator on.
    Growing {
        /// Bytes added per read.
        step: usize,
    },
}

impl Default for OutputMode {
    fn default() -> Self {
        Self::Sequence(Vec::new())
    }
}

/// Scripted behavior of one channel's automation adapter.
#[derive(Clone, Debug)]
pub struct ChannelScript {
    /// Registry key reported in ping acknowledgments.
    pub agent: String,
    /// Never answer any request (forces exchange timeouts).
    pub silent: bool,
    /// Whether pings succeed from the start.
    pub ping_ok: bool,
    /// Whether the adapter presence marker is visible.
    pub has_adapter: bool,
    /// Pings start succeeding after a `Reinitialize` request is seen.
    pub reinit_revives: bool,
    /// Pings start succeeding after `inject_adapter` is called.
    pub inject_revives: bool,
    /// `inject_adapter` itself fails.
    pub inject_fails: bool,
    /// Authentication state reported to `CheckLogin`.
    pub login: LoginStatus,
    /// When set, `SubmitPrompt` answers with this error.
    pub submit_error: Option<String>,
    /// Output script consumed by `ReadOutput`.
    pub output: OutputMode,
    /// Number of `load_state` polls that report `Loading` before the
    /// channel reports `Complete`.
    pub load_polls_until_complete: u32,
}

impl ChannelScript {
    /// A healthy channel: responsive adapter, authenticated user.
    #[must_use]
    pub fn responsive(agent: &str) -> Self {
        Self {
            agent: agent.to_owned(),
            silent: false,
            ping_ok: true,
            has_adapter: true,
            reinit_revives: false,
            inject_revives: false,
            inject_fails: false,
            login: LoginStatus {
                logged_in: true,
                needs_login: false,
            },
            submit_error: None,
            output: OutputMode::default(),
            load_polls_until_complete: 0,
        }
    }

    /// Adapter code present but its listener is stale: the initial ping
    /// fails, a soft reinitialize revives it.
    #[must_use]
    pub fn stale_listener(agent: &str) -> Self {
        Self {
            ping_ok: false,
            reinit_revives: true,
            ..Self::responsive(agent)
        }
    }

    /// No adapter in the channel at all: only a hard reinjection revives it.
    #[must_use]
    pub fn absent_adapter(agent: &str) -> Self {
        Self {
            ping_ok: false,
            has_adapter: false,
            inject_revives: true,
            ..Self::responsive(agent)
        }
    }

    /// Nothing revives this channel: every handshake step fails.
    #[must_use]
    pub fn dead(agent: &str) -> Self {
        Self {
            ping_ok: false,
            has_adapter: false,
            ..Self::responsive(agent)
        }
    }

    /// Set the output script.
    #[must_use]
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }
}

/// Build an [`OutputSnapshot`] of `len` bytes. A streaming snapshot shows
/// the stop affordance; a quiescent one shows the finality affordance.
#[must_use]
pub fn snapshot(len: usize, streaming: bool) -> OutputSnapshot {
    OutputSnapshot {
        text: "x".repeat(len),
        streaming,
        finality_control: !streaming,
        stop_control: streaming,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ChannelState {
    info: ChannelInfo,
    script: ChannelScript,
    pings: u32,
    reinit_seen: bool,
    injected: bool,
    load_polls: u32,
    output_reads: usize,
    submitted: Vec<String>,
}

#[derive(Default)]
struct TransportState {
    channels: Vec<ChannelId>,
    by_id: HashMap<ChannelId, ChannelState>,
    opened: Vec<(String, bool)>,
    activated: Vec<ChannelId>,
}

/// Scripted in-memory [`ChannelTransport`].
#[derive(Default)]
pub struct ScriptedTransport {
    state: Mutex<TransportState>,
    /// Script attached to channels created through `open_channel`.
    default_script: Mutex<Option<ChannelScript>>,
}

impl ScriptedTransport {
    /// Create an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pre-existing channel with the given behavior; returns its ID.
    pub fn add_channel(&self, url: &str, script: ChannelScript) -> ChannelId {
        self.add_channel_with_activity(url, script, Utc::now())
    }

    /// Add a pre-existing channel with an explicit last-active timestamp
    /// (for preferred-channel selection tests).
    pub fn add_channel_with_activity(
        &self,
        url: &str,
        script: ChannelScript,
        last_active: DateTime<Utc>,
    ) -> ChannelId {
        let id = ChannelId::new();
        let load_state = if script.load_polls_until_complete > 0 {
            LoadState::Loading
        } else {
            LoadState::Complete
        };
        let info = ChannelInfo {
            id: id.clone(),
            url: url.to_owned(),
            load_state,
            last_active,
        };
        let mut state = self.state.lock();
        state.channels.push(id.clone());
        let _ = state.by_id.insert(
            id.clone(),
            ChannelState {
                info,
                script,
                pings: 0,
                reinit_seen: false,
                injected: false,
                load_polls: 0,
                output_reads: 0,
                submitted: Vec::new(),
            },
        );
        id
    }

    /// Script to attach to channels created via `open_channel`.
    pub fn set_default_script(&self, script: ChannelScript) {
        *self.default_script.lock() = Some(script);
    }

    /// URLs (and background flags) passed to `open_channel`, in order.
    #[must_use]
    pub fn opened(&self) -> Vec<(String, bool)> {
        self.state.lock().opened.clone()
    }

    /// Channels that were activated, in order.
    #[must_use]
    pub fn activated(&self) -> Vec<ChannelId> {
        self.state.lock().activated.clone()
    }

    /// Number of pings a channel has answered (or refused).
    #[must_use]
    pub fn pings_seen(&self, channel: &ChannelId) -> u32 {
        self.state.lock().by_id.get(channel).map_or(0, |c| c.pings)
    }

    /// Whether a `Reinitialize` request reached the channel.
    #[must_use]
    pub fn reinit_seen(&self, channel: &ChannelId) -> bool {
        self.state
            .lock()
            .by_id
            .get(channel)
            .is_some_and(|c| c.reinit_seen)
    }

    /// Whether `inject_adapter` was called on the channel.
    #[must_use]
    pub fn was_injected(&self, channel: &ChannelId) -> bool {
        self.state
            .lock()
            .by_id
            .get(channel)
            .is_some_and(|c| c.injected)
    }

    /// Prompts submitted into the channel, in order.
    #[must_use]
    pub fn submitted_prompts(&self, channel: &ChannelId) -> Vec<String> {
        self.state
            .lock()
            .by_id
            .get(channel)
            .map_or_else(Vec::new, |c| c.submitted.clone())
    }

    fn unknown(channel: &ChannelId) -> TransportFault {
        TransportFault::closed(format!("no channel with id {channel}"))
    }
}

#[async_trait]
impl ChannelTransport for ScriptedTransport {
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, TransportFault> {
        let state = self.state.lock();
        Ok(state
            .channels
            .iter()
            .filter_map(|id| state.by_id.get(id).map(|c| c.info.clone()))
            .collect())
    }

    async fn open_channel(
        &self,
        url: &str,
        background: bool,
    ) -> Result<ChannelInfo, TransportFault> {
        let script = self
            .default_script
            .lock()
            .clone()
            .unwrap_or_else(|| ChannelScript::responsive("default"));
        let id = self.add_channel(url, script);
        let mut state = self.state.lock();
        state.opened.push((url.to_owned(), background));
        Ok(state
            .by_id
            .get(&id)
            .map(|c| c.info.clone())
            .expect("channel just added"))
    }

    async fn activate(&self, channel: &ChannelId) -> Result<(), TransportFault> {
        let mut state = self.state.lock();
        state.activated.push(channel.clone());
        let entry = state
            .by_id
            .get_mut(channel)
            .ok_or_else(|| Self::unknown(channel))?;
        entry.info.last_active = Utc::now();
        Ok(())
    }

    async fn load_state(&self, channel: &ChannelId) -> Result<LoadState, TransportFault> {
        let mut state = self.state.lock();
        let entry = state
            .by_id
            .get_mut(channel)
            .ok_or_else(|| Self::unknown(channel))?;
        entry.load_polls += 1;
        let loaded = entry.load_polls > entry.script.load_polls_until_complete;
        let load_state = if loaded {
            LoadState::Complete
        } else {
            LoadState::Loading
        };
        entry.info.load_state = load_state;
        Ok(load_state)
    }

    async fn request(
        &self,
        channel: &ChannelId,
        request: ChannelRequest,
    ) -> Result<ChannelResponse, TransportFault> {
        let (silent, response) = {
            let mut state = self.state.lock();
            let entry = state
                .by_id
                .get_mut(channel)
                .ok_or_else(|| Self::unknown(channel))?;
            if entry.script.silent {
                (true, ChannelResponse::Submitted)
            } else {
                (false, answer(entry, request))
            }
        };

        if silent {
            // Never resolves — the exchange's timeout fires instead.
            futures::future::pending::<()>().await;
        }
        Ok(response)
    }

    async fn has_adapter(&self, channel: &ChannelId) -> Result<bool, TransportFault> {
        let state = self.state.lock();
        let entry = state
            .by_id
            .get(channel)
            .ok_or_else(|| Self::unknown(channel))?;
        Ok(entry.script.has_adapter || entry.injected)
    }

    async fn inject_adapter(&self, channel: &ChannelId) -> Result<(), TransportFault> {
        let mut state = self.state.lock();
        let entry = state
            .by_id
            .get_mut(channel)
            .ok_or_else(|| Self::unknown(channel))?;
        if entry.script.inject_fails {
            return Err(TransportFault::failed("script injection rejected"));
        }
        entry.injected = true;
        Ok(())
    }
}

/// Compute the scripted answer for one request.
fn answer(entry: &mut ChannelState, request: ChannelRequest) -> ChannelResponse {
    match request {
        ChannelRequest::Ping => {
            entry.pings += 1;
            let alive = entry.script.ping_ok
                || (entry.reinit_seen && entry.script.reinit_revives)
                || (entry.injected && entry.script.inject_revives);
            if alive {
                ChannelResponse::Ack {
                    agent: entry.script.agent.clone(),
                }
            } else {
                ChannelResponse::Error {
                    message: "no automation listener".into(),
                }
            }
        }
        ChannelRequest::Reinitialize => {
            entry.reinit_seen = true;
            ChannelResponse::Ack {
                agent: entry.script.agent.clone(),
            }
        }
        ChannelRequest::CheckLogin => ChannelResponse::Login(entry.script.login),
        ChannelRequest::SubmitPrompt { prompt } => {
            entry.submitted.push(prompt);
            match &entry.script.submit_error {
                Some(message) => ChannelResponse::Error {
                    message: message.clone(),
                },
                None => ChannelResponse::Submitted,
            }
        }
        ChannelRequest::ReadOutput => {
            let snap = match &entry.script.output {
                OutputMode::Sequence(seq) => {
                    let idx = entry.output_reads.min(seq.len().saturating_sub(1));
                    seq.get(idx).cloned().unwrap_or_default()
                }
                OutputMode::Growing { step } => {
                    snapshot((entry.output_reads + 1) * step, true)
                }
            };
            entry.output_reads += 1;
            ChannelResponse::Output(snap)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
