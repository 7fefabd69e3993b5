//! Branded ID newtypes for type safety.
//!
//! Every entity in the chorus system has a distinct ID type implemented as a
//! newtype wrapper around `String`. This prevents accidentally passing a
//! channel ID where a job ID is expected.
//!
//! Generated IDs are UUID v7 (time-ordered) via [`uuid::Uuid::now_v7`].
//! [`AgentId`] is the exception: it is a registry key (e.g. `"openai"`)
//! chosen by the operator, never generated.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a new UUID v7 string (time-ordered).
fn new_v7() -> String {
    Uuid::now_v7().to_string()
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(new_v7())
            }

            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for a dispatch job.
    JobId
}

branded_id! {
    /// Unique identifier for a communication channel to an agent instance.
    ChannelId
}

branded_id! {
    /// Unique identifier for a single request over a channel.
    RequestId
}

/// Registry key identifying an agent service (e.g. `"openai"`, `"claude"`).
///
/// Unlike the generated IDs above, agent IDs are stable operator-chosen
/// keys into the agent registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create an agent ID from a registry key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for AgentId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<AgentId> for String {
    fn from(id: AgentId) -> Self {
        id.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn generated_ids_are_uuid_v7() {
        let id = ChannelId::new();
        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn branded_id_serde_is_transparent() {
        let id = JobId::from("job-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"job-1\"");
        let back: JobId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn branded_id_display_and_deref() {
        let id = RequestId::from("req-9");
        assert_eq!(id.to_string(), "req-9");
        assert_eq!(&*id, "req-9");
        assert_eq!(id.as_ref(), "req-9");
    }

    #[test]
    fn branded_id_round_trips_through_string() {
        let id = ChannelId::from_string("ch-7".to_owned());
        let s: String = id.clone().into();
        assert_eq!(s, "ch-7");
        assert_eq!(id.into_inner(), "ch-7");
    }

    #[test]
    fn agent_id_is_a_plain_key() {
        let id = AgentId::new("openai");
        assert_eq!(id.as_str(), "openai");
        assert_eq!(id.to_string(), "openai");
        assert_eq!(AgentId::from("openai"), id);
    }

    #[test]
    fn agent_id_serde_is_transparent() {
        let id = AgentId::new("deepseek");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"deepseek\"");
        let back: AgentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
