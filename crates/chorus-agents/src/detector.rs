//! Async completion-detection loop.
//!
//! Drives `chorus_core::stability` against a live output source: sample at
//! a fixed interval, declare completion when the tracker settles, take one
//! grace-delayed confirmation read, and bound the whole wait with a hard
//! ceiling that returns the best-effort last observation instead of
//! failing. The ceiling is a deliberate correctness trade-off — true
//! end-of-output is unobservable, so a bounded partial answer beats an
//! error.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use chorus_core::stability::{StabilityPolicy, StabilityTracker, Verdict};
use chorus_core::wire::OutputSnapshot;
use chorus_settings::DetectorSettings;

use crate::adapter::AdapterError;

// ─────────────────────────────────────────────────────────────────────────────
// Probe
// ─────────────────────────────────────────────────────────────────────────────

/// Source of output observations for one in-flight turn.
#[async_trait]
pub trait OutputProbe: Send + Sync {
    /// Read the current output state.
    async fn sample(&self) -> Result<OutputSnapshot, AdapterError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Result of waiting for a turn to finish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionOutcome {
    /// The final (or best-effort partial) output text.
    pub text: String,
    /// True when the turn settled; false when the ceiling cut the wait
    /// short and `text` is the last observation.
    pub complete: bool,
    /// Number of samples taken before the decision.
    pub samples: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Detector
// ─────────────────────────────────────────────────────────────────────────────

/// Sampling loop around [`StabilityTracker`].
#[derive(Clone, Debug)]
pub struct CompletionDetector {
    policy: StabilityPolicy,
    sample_interval: Duration,
    grace: Duration,
    ceiling: Duration,
}

impl CompletionDetector {
    /// Create a detector with explicit timings.
    #[must_use]
    pub fn new(
        policy: StabilityPolicy,
        sample_interval: Duration,
        grace: Duration,
        ceiling: Duration,
    ) -> Self {
        Self {
            policy,
            sample_interval,
            grace,
            ceiling,
        }
    }

    /// Create a detector from settings.
    #[must_use]
    pub fn from_settings(settings: &DetectorSettings) -> Self {
        Self::new(
            StabilityPolicy {
                stability_threshold: settings.stability_threshold,
                min_content_len: settings.min_content_len,
            },
            settings.sample_interval(),
            settings.grace(),
            settings.ceiling(),
        )
    }

    /// Wait until the probed output settles or the ceiling is reached.
    ///
    /// On settlement, one extra grace interval passes before a final
    /// authoritative read, so a last-moment content mutation is not raced.
    /// Reaching the ceiling is not an error: the last observed content is
    /// returned with `complete: false`.
    pub async fn wait(&self, probe: &dyn OutputProbe) -> Result<DetectionOutcome, AdapterError> {
        let mut tracker = StabilityTracker::new(self.policy);
        let started = tokio::time::Instant::now();
        let mut last_text = String::new();

        loop {
            tokio::time::sleep(self.sample_interval).await;

            if started.elapsed() >= self.ceiling {
                warn!(
                    samples = tracker.samples(),
                    observed_len = last_text.len(),
                    "detection ceiling reached; returning best-effort partial output"
                );
                return Ok(DetectionOutcome {
                    text: last_text,
                    complete: false,
                    samples: tracker.samples(),
                });
            }

            let snap = probe.sample().await?;
            last_text.clone_from(&snap.text);

            if tracker.observe(&snap) == Verdict::Settled {
                debug!(
                    samples = tracker.samples(),
                    len = tracker.last_len(),
                    "output settled; taking confirmation read"
                );
                tokio::time::sleep(self.grace).await;
                let text = match probe.sample().await {
                    Ok(final_snap) => final_snap.text,
                    Err(e) => {
                        warn!(error = %e, "confirmation read failed; keeping last observation");
                        last_text
                    }
                };
                return Ok(DetectionOutcome {
                    text,
                    complete: true,
                    samples: tracker.samples(),
                });
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    use crate::testing::snapshot;

    /// Probe that plays a fixed snapshot sequence; the last entry repeats.
    struct SeqProbe {
        snaps: Vec<OutputSnapshot>,
        reads: Mutex<usize>,
    }

    impl SeqProbe {
        fn new(snaps: Vec<OutputSnapshot>) -> Self {
            Self {
                snaps,
                reads: Mutex::new(0),
            }
        }

        fn reads(&self) -> usize {
            *self.reads.lock()
        }
    }

    #[async_trait]
    impl OutputProbe for SeqProbe {
        async fn sample(&self) -> Result<OutputSnapshot, AdapterError> {
            let mut reads = self.reads.lock();
            let idx = (*reads).min(self.snaps.len().saturating_sub(1));
            *reads += 1;
            Ok(self.snaps.get(idx).cloned().unwrap_or_default())
        }
    }

    /// Probe whose output grows forever.
    struct GrowingProbe {
        reads: Mutex<usize>,
    }

    #[async_trait]
    impl OutputProbe for GrowingProbe {
        async fn sample(&self) -> Result<OutputSnapshot, AdapterError> {
            let mut reads = self.reads.lock();
            *reads += 1;
            Ok(snapshot(*reads * 10, true))
        }
    }

    fn detector(threshold: u32, interval_s: u64, ceiling_s: u64) -> CompletionDetector {
        CompletionDetector::new(
            StabilityPolicy {
                stability_threshold: threshold,
                min_content_len: 8,
            },
            Duration::from_secs(interval_s),
            Duration::from_secs(2),
            Duration::from_secs(ceiling_s),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn settles_at_the_exact_stability_tick() {
        // [10, 50, 120, 120, 120, 120], threshold 3, quiescent after the
        // third sample: settlement must land on the sixth sample.
        let probe = SeqProbe::new(vec![
            snapshot(10, true),
            snapshot(50, true),
            snapshot(120, true),
            snapshot(120, false),
            snapshot(120, false),
            snapshot(120, false),
        ]);
        let outcome = detector(3, 2, 600).wait(&probe).await.unwrap();

        assert!(outcome.complete);
        assert_eq!(outcome.samples, 6);
        assert_eq!(outcome.text.len(), 120);
        // Six detection samples plus the grace confirmation read
        assert_eq!(probe.reads(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn ceiling_returns_last_partial_instead_of_error() {
        let probe = GrowingProbe {
            reads: Mutex::new(0),
        };
        // 1s interval, 5s ceiling: samples at t=1..4, cut off at t=5.
        let outcome = detector(3, 1, 5).wait(&probe).await.unwrap();

        assert!(!outcome.complete);
        assert_eq!(outcome.samples, 4);
        assert_eq!(outcome.text.len(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_read_is_authoritative() {
        // The grace read observes a longer final render than the settled
        // samples did.
        let probe = SeqProbe::new(vec![
            snapshot(100, false),
            snapshot(100, false),
            snapshot(100, false),
            snapshot(100, false),
            snapshot(103, false),
        ]);
        let outcome = detector(3, 2, 600).wait(&probe).await.unwrap();

        assert!(outcome.complete);
        assert_eq!(outcome.text.len(), 103);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_error_mid_loop_propagates() {
        struct FailingProbe;

        #[async_trait]
        impl OutputProbe for FailingProbe {
            async fn sample(&self) -> Result<OutputSnapshot, AdapterError> {
                Err(AdapterError::protocol("channel renderer crashed"))
            }
        }

        let err = detector(3, 1, 600).wait(&FailingProbe).await.unwrap_err();
        assert!(matches!(err, AdapterError::Protocol { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn streaming_signal_defers_settlement_past_stability() {
        // Length is stable from the start but the service still shows the
        // streaming indicator for two extra ticks.
        let probe = SeqProbe::new(vec![
            snapshot(64, true),
            snapshot(64, true),
            snapshot(64, true),
            snapshot(64, true),
            snapshot(64, true),
            snapshot(64, false),
        ]);
        let outcome = detector(3, 2, 600).wait(&probe).await.unwrap();

        assert!(outcome.complete);
        assert_eq!(outcome.samples, 6);
    }
}
