//! Built-in registry of known agent services.
//!
//! Each service is described by its registry key, display name, the address
//! patterns its channels may live under, and the entry URL used when a
//! fresh channel has to be opened. Services frequently keep a legacy domain
//! alive next to the current one, so a descriptor carries every pattern
//! that must be checked when hunting for a reusable channel.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use chorus_core::ids::AgentId;

// ─────────────────────────────────────────────────────────────────────────────
// Descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// Static description of one agent service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDescriptor {
    /// Registry key (e.g. `"openai"`).
    pub id: AgentId,
    /// Human-readable service name.
    pub name: String,
    /// Host patterns a channel URL may match (legacy and current domains).
    pub address_patterns: Vec<String>,
    /// Base service URL.
    pub entry_url: String,
    /// Preferred URL for opening a fresh session, when the service has one.
    pub new_session_url: Option<String>,
}

impl AgentDescriptor {
    /// The URL to open a new channel at (new-session URL when available,
    /// base entry URL otherwise).
    #[must_use]
    pub fn preferred_entry(&self) -> &str {
        self.new_session_url.as_deref().unwrap_or(&self.entry_url)
    }

    /// Whether a channel currently pointed at `url` belongs to this agent.
    ///
    /// Matches the URL's host component against every known address
    /// pattern; any hit counts.
    #[must_use]
    pub fn matches_url(&self, url: &str) -> bool {
        let host = host_of(url);
        self.address_patterns.iter().any(|p| host.contains(p.as_str()))
    }
}

/// Extract the host component of a URL (empty when there is none).
fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?', '#']).next().unwrap_or("")
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Lookup table of known agent services.
#[derive(Clone, Debug)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, AgentDescriptor>,
}

impl AgentRegistry {
    /// The built-in service table.
    #[must_use]
    pub fn builtin() -> Self {
        let agents = [
            AgentDescriptor {
                id: AgentId::new("openai"),
                name: "OpenAI ChatGPT".into(),
                address_patterns: vec!["chat.openai.com".into(), "chatgpt.com".into()],
                entry_url: "https://chat.openai.com".into(),
                new_session_url: Some("https://chat.openai.com/?model=gpt-4".into()),
            },
            AgentDescriptor {
                id: AgentId::new("gemini"),
                name: "Google Gemini".into(),
                address_patterns: vec!["gemini.google.com".into()],
                entry_url: "https://gemini.google.com".into(),
                new_session_url: Some("https://gemini.google.com/app".into()),
            },
            AgentDescriptor {
                id: AgentId::new("claude"),
                name: "Anthropic Claude".into(),
                address_patterns: vec!["claude.ai".into()],
                entry_url: "https://claude.ai".into(),
                new_session_url: Some("https://claude.ai/chat/new".into()),
            },
            AgentDescriptor {
                id: AgentId::new("grok"),
                name: "Grok".into(),
                address_patterns: vec!["grok.x.ai".into(), "grok.com".into()],
                entry_url: "https://grok.com".into(),
                new_session_url: None,
            },
            AgentDescriptor {
                id: AgentId::new("deepseek"),
                name: "DeepSeek".into(),
                address_patterns: vec!["chat.deepseek.com".into()],
                entry_url: "https://chat.deepseek.com".into(),
                new_session_url: None,
            },
        ];
        Self {
            agents: agents
                .into_iter()
                .map(|d| (d.id.clone(), d))
                .collect(),
        }
    }

    /// Build a registry from explicit descriptors (tests, custom fleets).
    #[must_use]
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = AgentDescriptor>) -> Self {
        Self {
            agents: descriptors
                .into_iter()
                .map(|d| (d.id.clone(), d))
                .collect(),
        }
    }

    /// Look up a descriptor by registry key.
    #[must_use]
    pub fn get(&self, id: &AgentId) -> Option<&AgentDescriptor> {
        self.agents.get(id)
    }

    /// Whether the registry knows this key.
    #[must_use]
    pub fn contains(&self, id: &AgentId) -> bool {
        self.agents.contains_key(id)
    }

    /// All registered agent keys.
    #[must_use]
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.keys().cloned().collect()
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_all_services() {
        let registry = AgentRegistry::builtin();
        assert_eq!(registry.len(), 5);
        for key in ["openai", "gemini", "claude", "grok", "deepseek"] {
            assert!(registry.contains(&AgentId::new(key)), "missing {key}");
        }
    }

    #[test]
    fn lookup_returns_descriptor() {
        let registry = AgentRegistry::builtin();
        let openai = registry.get(&AgentId::new("openai")).unwrap();
        assert_eq!(openai.name, "OpenAI ChatGPT");
        assert!(registry.get(&AgentId::new("nope")).is_none());
    }

    #[test]
    fn matches_url_checks_every_address_pattern() {
        let registry = AgentRegistry::builtin();
        let openai = registry.get(&AgentId::new("openai")).unwrap();
        // Legacy and current domains both count
        assert!(openai.matches_url("https://chat.openai.com/c/abc123"));
        assert!(openai.matches_url("https://chatgpt.com/"));
        assert!(!openai.matches_url("https://claude.ai/chat/new"));
    }

    #[test]
    fn matches_url_ignores_path_lookalikes() {
        let registry = AgentRegistry::builtin();
        let claude = registry.get(&AgentId::new("claude")).unwrap();
        // The pattern must match in the host, not the path or query
        assert!(!claude.matches_url("https://example.com/claude.ai"));
        assert!(!claude.matches_url("https://example.com/?ref=claude.ai"));
    }

    #[test]
    fn preferred_entry_falls_back_to_entry_url() {
        let registry = AgentRegistry::builtin();
        let openai = registry.get(&AgentId::new("openai")).unwrap();
        assert_eq!(openai.preferred_entry(), "https://chat.openai.com/?model=gpt-4");
        let deepseek = registry.get(&AgentId::new("deepseek")).unwrap();
        assert_eq!(deepseek.preferred_entry(), "https://chat.deepseek.com");
    }

    #[test]
    fn host_extraction_handles_bare_and_full_urls() {
        assert_eq!(host_of("https://chat.deepseek.com/a/b"), "chat.deepseek.com");
        assert_eq!(host_of("chat.deepseek.com"), "chat.deepseek.com");
        assert_eq!(host_of("https://grok.com?x=1"), "grok.com");
        assert_eq!(host_of(""), "");
    }

    #[test]
    fn from_descriptors_builds_custom_registry() {
        let registry = AgentRegistry::from_descriptors([AgentDescriptor {
            id: AgentId::new("local"),
            name: "Local".into(),
            address_patterns: vec!["localhost".into()],
            entry_url: "http://localhost:3000".into(),
            new_session_url: None,
        }]);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&AgentId::new("local")));
    }
}
