//! Settings schema with compiled defaults.
//!
//! All timings live here rather than as scattered constants so that
//! operators can tune them per deployment; the defaults match the timings
//! the dispatch pipeline was calibrated against. Durations are stored as
//! integer milliseconds on the wire with [`std::time::Duration`] accessors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Root
// ─────────────────────────────────────────────────────────────────────────────

/// Root settings object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChorusSettings {
    /// Settings schema version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Application name (used in log targets).
    #[serde(default = "default_name")]
    pub name: String,
    /// Minimum log level for the tracing subscriber.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Registry key of the agent used for prompt refinement.
    #[serde(default = "default_refiner_agent")]
    pub refiner_agent: String,
    /// Channel acquisition and load settings.
    #[serde(default)]
    pub broker: BrokerSettings,
    /// Readiness handshake timings.
    #[serde(default)]
    pub handshake: HandshakeSettings,
    /// Message exchange timeout classes.
    #[serde(default)]
    pub exchange: ExchangeSettings,
    /// Completion detector timings and thresholds.
    #[serde(default)]
    pub detector: DetectorSettings,
}

fn default_version() -> String {
    "0.1.0".to_owned()
}
fn default_name() -> String {
    "chorus".to_owned()
}
fn default_log_level() -> String {
    "warn".to_owned()
}
fn default_refiner_agent() -> String {
    "openai".to_owned()
}

impl Default for ChorusSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: default_name(),
            log_level: default_log_level(),
            refiner_agent: default_refiner_agent(),
            broker: BrokerSettings::default(),
            handshake: HandshakeSettings::default(),
            exchange: ExchangeSettings::default(),
            detector: DetectorSettings::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Broker
// ─────────────────────────────────────────────────────────────────────────────

/// Channel acquisition and load-wait settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerSettings {
    /// Maximum time to wait for a channel to report a complete load.
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
    /// Interval between load-state polls.
    #[serde(default = "default_load_poll_ms")]
    pub load_poll_ms: u64,
    /// Settle delay after a complete load before the channel is considered
    /// usable (a loaded channel's adapter may not have initialized yet).
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_load_timeout_ms() -> u64 {
    15_000
}
fn default_load_poll_ms() -> u64 {
    500
}
fn default_settle_ms() -> u64 {
    2_500
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            load_timeout_ms: default_load_timeout_ms(),
            load_poll_ms: default_load_poll_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl BrokerSettings {
    /// Load timeout as a [`Duration`].
    #[must_use]
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn load_poll(&self) -> Duration {
        Duration::from_millis(self.load_poll_ms)
    }

    /// Settle delay as a [`Duration`].
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handshake
// ─────────────────────────────────────────────────────────────────────────────

/// Readiness handshake timings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeSettings {
    /// Timeout for the initial liveness ping.
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,
    /// Settle delay after a soft reinitialize before the retry ping.
    #[serde(default = "default_reinit_settle_ms")]
    pub reinit_settle_ms: u64,
    /// Settle delay after a hard reinjection before the retry ping.
    #[serde(default = "default_inject_settle_ms")]
    pub inject_settle_ms: u64,
    /// Extended ping timeout used after a hard reinjection.
    #[serde(default = "default_extended_ping_timeout_ms")]
    pub extended_ping_timeout_ms: u64,
}

fn default_ping_timeout_ms() -> u64 {
    3_000
}
fn default_reinit_settle_ms() -> u64 {
    1_500
}
fn default_inject_settle_ms() -> u64 {
    3_500
}
fn default_extended_ping_timeout_ms() -> u64 {
    5_000
}

impl Default for HandshakeSettings {
    fn default() -> Self {
        Self {
            ping_timeout_ms: default_ping_timeout_ms(),
            reinit_settle_ms: default_reinit_settle_ms(),
            inject_settle_ms: default_inject_settle_ms(),
            extended_ping_timeout_ms: default_extended_ping_timeout_ms(),
        }
    }
}

impl HandshakeSettings {
    /// Initial ping timeout as a [`Duration`].
    #[must_use]
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    /// Soft-reinit settle delay as a [`Duration`].
    #[must_use]
    pub fn reinit_settle(&self) -> Duration {
        Duration::from_millis(self.reinit_settle_ms)
    }

    /// Reinjection settle delay as a [`Duration`].
    #[must_use]
    pub fn inject_settle(&self) -> Duration {
        Duration::from_millis(self.inject_settle_ms)
    }

    /// Extended ping timeout as a [`Duration`].
    #[must_use]
    pub fn extended_ping_timeout(&self) -> Duration {
        Duration::from_millis(self.extended_ping_timeout_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange
// ─────────────────────────────────────────────────────────────────────────────

/// Message exchange timeout classes.
///
/// Handshake-class requests answer in seconds; task-class requests may
/// legitimately take tens of minutes while an agent produces output.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSettings {
    /// Timeout for handshake-class requests (login checks, output reads).
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Timeout for task-class requests (prompt submission).
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,
}

fn default_handshake_timeout_ms() -> u64 {
    5_000
}
fn default_task_timeout_ms() -> u64 {
    1_800_000
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: default_handshake_timeout_ms(),
            task_timeout_ms: default_task_timeout_ms(),
        }
    }
}

impl ExchangeSettings {
    /// Handshake-class timeout as a [`Duration`].
    #[must_use]
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Task-class timeout as a [`Duration`].
    #[must_use]
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detector
// ─────────────────────────────────────────────────────────────────────────────

/// Completion detector timings and thresholds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorSettings {
    /// Interval between output samples.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    /// Consecutive unchanged samples required to declare completion.
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,
    /// Minimum content length (bytes) before completion may be declared.
    #[serde(default = "default_min_content_len")]
    pub min_content_len: usize,
    /// Grace delay after settlement before the final authoritative read.
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
    /// Hard ceiling on total detection time; reaching it returns the
    /// best-effort last observation instead of an error.
    #[serde(default = "default_ceiling_ms")]
    pub ceiling_ms: u64,
}

fn default_sample_interval_ms() -> u64 {
    2_500
}
fn default_stability_threshold() -> u32 {
    3
}
fn default_min_content_len() -> usize {
    8
}
fn default_grace_ms() -> u64 {
    2_000
}
fn default_ceiling_ms() -> u64 {
    1_200_000
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            stability_threshold: default_stability_threshold(),
            min_content_len: default_min_content_len(),
            grace_ms: default_grace_ms(),
            ceiling_ms: default_ceiling_ms(),
        }
    }
}

impl DetectorSettings {
    /// Sample interval as a [`Duration`].
    #[must_use]
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Grace delay as a [`Duration`].
    #[must_use]
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    /// Ceiling as a [`Duration`].
    #[must_use]
    pub fn ceiling(&self) -> Duration {
        Duration::from_millis(self.ceiling_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deserialize_from_empty_object() {
        let settings: ChorusSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.version, "0.1.0");
        assert_eq!(settings.broker.load_timeout_ms, 15_000);
        assert_eq!(settings.handshake.reinit_settle_ms, 1_500);
        assert_eq!(settings.detector.min_content_len, 8);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let json = r#"{"detector": {"stabilityThreshold": 5}}"#;
        let settings: ChorusSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.detector.stability_threshold, 5);
        assert_eq!(settings.detector.sample_interval_ms, 2_500);
        assert_eq!(settings.broker.settle_ms, 2_500);
    }

    #[test]
    fn duration_accessors_convert_millis() {
        let settings = ChorusSettings::default();
        assert_eq!(settings.broker.load_poll(), Duration::from_millis(500));
        assert_eq!(
            settings.handshake.ping_timeout(),
            Duration::from_secs(3)
        );
        assert_eq!(
            settings.exchange.task_timeout(),
            Duration::from_secs(1_800)
        );
        assert_eq!(settings.detector.grace(), Duration::from_secs(2));
    }

    #[test]
    fn settings_serialize_camel_case() {
        let json = serde_json::to_value(ChorusSettings::default()).unwrap();
        assert!(json["broker"]["loadTimeoutMs"].is_u64());
        assert!(json["handshake"]["extendedPingTimeoutMs"].is_u64());
        assert!(json["detector"]["minContentLen"].is_u64());
        assert!(json["refinerAgent"].is_string());
    }
}
