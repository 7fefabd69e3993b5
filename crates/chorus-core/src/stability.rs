//! Completion-detection state machine.
//!
//! Chat services stream output of unknown, growing length with no explicit
//! end-of-stream signal, so completion has to be inferred from observable
//! signals alone. This module contains the portable, sync-only state
//! machine; the async sampling loop that feeds it lives in `chorus-agents`
//! (which has access to tokio):
//!
//! - [`StabilityPolicy`]: thresholds (stability window, minimum content)
//! - [`StabilityTracker`]: per-turn sample accumulator
//! - [`Verdict`]: the per-sample decision
//!
//! A turn is considered settled only when every condition holds at once:
//! the output length has been unchanged and non-zero for the configured
//! number of consecutive samples, no active-streaming indicator is shown,
//! the service exposes a finality affordance (or no stop affordance), and
//! the content has reached a minimum size. The detection is a bounded-time
//! heuristic, never a proof.

use serde::{Deserialize, Serialize};

use crate::wire::OutputSnapshot;

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Default consecutive unchanged samples required to declare completion.
pub const DEFAULT_STABILITY_THRESHOLD: u32 = 3;
/// Default minimum content length (bytes) before completion may be declared.
pub const DEFAULT_MIN_CONTENT_LEN: usize = 8;

/// Thresholds governing the stability heuristic.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityPolicy {
    /// Consecutive unchanged, non-empty length samples required (the
    /// "stability window").
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,
    /// Minimum content length in bytes; guards against declaring an empty
    /// or placeholder render complete.
    #[serde(default = "default_min_content_len")]
    pub min_content_len: usize,
}

fn default_stability_threshold() -> u32 {
    DEFAULT_STABILITY_THRESHOLD
}
fn default_min_content_len() -> usize {
    DEFAULT_MIN_CONTENT_LEN
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self {
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
            min_content_len: DEFAULT_MIN_CONTENT_LEN,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracker
// ─────────────────────────────────────────────────────────────────────────────

/// Decision produced by one observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Keep sampling — the turn is not provably quiescent yet.
    Sampling,
    /// All completion conditions hold; the turn is considered finished.
    Settled,
}

/// Accumulates output samples for one turn and decides when the stream
/// has settled.
///
/// Feed one [`OutputSnapshot`] per sampling tick to [`observe`].
/// The tracker is single-turn: create a fresh one per submission.
///
/// [`observe`]: StabilityTracker::observe
#[derive(Debug)]
pub struct StabilityTracker {
    policy: StabilityPolicy,
    last_len: usize,
    stable_count: u32,
    samples: u32,
}

impl StabilityTracker {
    /// Create a tracker with the given policy.
    #[must_use]
    pub fn new(policy: StabilityPolicy) -> Self {
        Self {
            policy,
            last_len: 0,
            stable_count: 0,
            samples: 0,
        }
    }

    /// Record one sample and decide whether the turn has settled.
    ///
    /// The stable count increments only when the sampled length equals the
    /// previous sample and is non-zero; any growth (or an empty render)
    /// resets it. The settled verdict additionally requires the streaming
    /// indicator to be absent, a finality affordance to be present (or no
    /// stop affordance shown), and the content to exceed the minimum size.
    pub fn observe(&mut self, snapshot: &OutputSnapshot) -> Verdict {
        self.samples += 1;
        let len = snapshot.len();

        if len == self.last_len && len > 0 {
            self.stable_count += 1;
        } else {
            self.stable_count = 0;
            self.last_len = len;
        }

        let stable = self.stable_count >= self.policy.stability_threshold;
        let quiescent = !snapshot.streaming;
        let finalized = snapshot.finality_control || !snapshot.stop_control;
        let substantial = self.last_len >= self.policy.min_content_len;

        if stable && quiescent && finalized && substantial {
            Verdict::Settled
        } else {
            Verdict::Sampling
        }
    }

    /// Number of consecutive unchanged samples seen so far.
    #[must_use]
    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }

    /// Length of the most recent distinct sample.
    #[must_use]
    pub fn last_len(&self) -> usize {
        self.last_len
    }

    /// Total samples observed.
    #[must_use]
    pub fn samples(&self) -> u32 {
        self.samples
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
