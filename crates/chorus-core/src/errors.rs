//! Raw channel-host fault types.
//!
//! [`TransportFault`] is what a `ChannelTransport` implementation reports
//! when delivery itself fails. Classification into the richer exchange and
//! runtime error taxonomies happens in the higher crates; the foundation
//! crate only distinguishes the one actionable case — the channel is gone —
//! from everything else.

use thiserror::Error;

/// A delivery failure reported by the channel host.
#[derive(Debug, Error)]
pub enum TransportFault {
    /// The channel no longer exists (closed or destroyed). Actionable:
    /// the channel must be reacquired before anything else is attempted.
    #[error("channel closed: {message}")]
    Closed {
        /// Host-provided description.
        message: String,
    },

    /// Any other delivery failure.
    #[error("transport failure: {message}")]
    Failed {
        /// Host-provided description.
        message: String,
    },
}

impl TransportFault {
    /// Convenience constructor for a closed-channel fault.
    #[must_use]
    pub fn closed(message: impl Into<String>) -> Self {
        Self::Closed {
            message: message.into(),
        }
    }

    /// Convenience constructor for a generic delivery fault.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Whether the channel itself is gone (vs. a transient delivery error).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
