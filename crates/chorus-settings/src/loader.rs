//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ChorusSettings::default()`]
//! 2. If `~/.chorus/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::ChorusSettings;

/// Resolve the path to the settings file (`~/.chorus/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".chorus").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ChorusSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ChorusSettings> {
    let defaults = serde_json::to_value(ChorusSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ChorusSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Invalid values are silently ignored (fall back to file/default)
pub fn apply_env_overrides(settings: &mut ChorusSettings) {
    // ── General ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("CHORUS_LOG_LEVEL") {
        settings.log_level = v;
    }
    if let Some(v) = read_env_string("CHORUS_REFINER_AGENT") {
        settings.refiner_agent = v;
    }

    // ── Broker ──────────────────────────────────────────────────────
    if let Some(v) = read_env_u64("CHORUS_LOAD_TIMEOUT_MS", 500, 600_000) {
        settings.broker.load_timeout_ms = v;
    }
    if let Some(v) = read_env_u64("CHORUS_LOAD_POLL_MS", 50, 10_000) {
        settings.broker.load_poll_ms = v;
    }
    if let Some(v) = read_env_u64("CHORUS_SETTLE_MS", 0, 60_000) {
        settings.broker.settle_ms = v;
    }

    // ── Handshake ───────────────────────────────────────────────────
    if let Some(v) = read_env_u64("CHORUS_PING_TIMEOUT_MS", 100, 60_000) {
        settings.handshake.ping_timeout_ms = v;
    }
    if let Some(v) = read_env_u64("CHORUS_REINIT_SETTLE_MS", 0, 60_000) {
        settings.handshake.reinit_settle_ms = v;
    }
    if let Some(v) = read_env_u64("CHORUS_INJECT_SETTLE_MS", 0, 60_000) {
        settings.handshake.inject_settle_ms = v;
    }
    if let Some(v) = read_env_u64("CHORUS_EXTENDED_PING_TIMEOUT_MS", 100, 120_000) {
        settings.handshake.extended_ping_timeout_ms = v;
    }

    // ── Exchange ────────────────────────────────────────────────────
    if let Some(v) = read_env_u64("CHORUS_HANDSHAKE_TIMEOUT_MS", 100, 120_000) {
        settings.exchange.handshake_timeout_ms = v;
    }
    if let Some(v) = read_env_u64("CHORUS_TASK_TIMEOUT_MS", 1_000, 7_200_000) {
        settings.exchange.task_timeout_ms = v;
    }

    // ── Detector ────────────────────────────────────────────────────
    if let Some(v) = read_env_u64("CHORUS_SAMPLE_INTERVAL_MS", 100, 60_000) {
        settings.detector.sample_interval_ms = v;
    }
    if let Some(v) = read_env_u32("CHORUS_STABILITY_THRESHOLD", 1, 100) {
        settings.detector.stability_threshold = v;
    }
    if let Some(v) = read_env_u64("CHORUS_GRACE_MS", 0, 60_000) {
        settings.detector.grace_ms = v;
    }
    if let Some(v) = read_env_u64("CHORUS_CEILING_MS", 10_000, 7_200_000) {
        settings.detector.ceiling_ms = v;
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    std::env::var(name)
        .ok()?
        .parse::<u64>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    std::env::var(name)
        .ok()?
        .parse::<u32>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
