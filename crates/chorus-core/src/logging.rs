//! Structured logging bootstrap with `tracing`.
//!
//! Log context (job ID, agent, channel) is propagated via tracing spans;
//! components annotate their entry points with `#[instrument]`.

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at application startup. Subsequent calls are no-ops.
/// The subscriber writes human-readable output to stderr; the
/// `RUST_LOG` environment variable overrides `level` when set.
///
/// # Arguments
///
/// * `level` - Minimum log level to display (e.g. `"info"`, `"warn"`).
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init is a no-op if a subscriber is already set
    let _ = subscriber.try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
