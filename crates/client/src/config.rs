//! Client configuration loaded from TOML.

use anyhow::{Context, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Client configuration.
///
/// Route templates may contain `{tenant}`, replaced with the tenant slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the chat backend.
    pub base_url: String,
    /// Model selector sent with every turn.
    pub model: CompactString,
    /// Longest wait for the next stream read before a turn fails.
    pub stream_timeout_secs: u64,
    /// Longest a whole turn may take to reach its `end` record.
    pub turn_timeout_secs: u64,
    /// Client name reported in guest session metadata.
    pub client_name: CompactString,
    /// Guest session issuance route.
    pub guest_session_path: String,
    /// Login route.
    pub login_path: String,
    /// Token refresh route.
    pub refresh_path: String,
    /// Chat turn route for authenticated callers.
    pub member_chat_path: String,
    /// Chat turn route for guests.
    pub public_chat_path: String,
    /// History collection route.
    pub chats_path: String,
    /// Response header that may carry a newly assigned chat id.
    pub chat_id_header: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_owned(),
            model: "default".into(),
            stream_timeout_secs: 60,
            turn_timeout_secs: 300,
            client_name: "parley".into(),
            guest_session_path: "/auth/guest-session".to_owned(),
            login_path: "/auth/login".to_owned(),
            refresh_path: "/auth/refresh".to_owned(),
            member_chat_path: "/chat/{tenant}".to_owned(),
            public_chat_path: "/public/chat/{tenant}".to_owned(),
            chats_path: "/chats".to_owned(),
            chat_id_header: "x-chat-id".to_owned(),
        }
    }
}

impl ClientConfig {
    /// Parse a TOML string, expanding `${ENV_VAR}` references first.
    ///
    /// The client settings may sit at the top level or under an `[api]` table.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Wrapped {
            api: ClientConfig,
        }

        let expanded = types::utils::expand_env_vars(toml_str);
        let value: toml::Table = toml::from_str(&expanded)?;
        if value.contains_key("api") {
            let wrapped: Wrapped = toml::from_str(&expanded)?;
            return Ok(wrapped.api);
        }
        Ok(toml::from_str(&expanded)?)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// The stream read timeout.
    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs.max(1))
    }

    /// The bound on a whole turn, never shorter than the read timeout.
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs).max(self.stream_timeout())
    }

    /// Join a route onto the base URL, substituting `{tenant}`.
    pub fn url(&self, route: &str, tenant: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let route = route.replace("{tenant}", tenant);
        if route.starts_with('/') {
            format!("{base}{route}")
        } else {
            format!("{base}/{route}")
        }
    }
}
