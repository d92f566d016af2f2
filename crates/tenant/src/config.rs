//! Edge routing configuration loaded from TOML.

use anyhow::{Context, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default bind address of the edge server.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Default sub-path the bare root maps to.
pub const DEFAULT_PATH: &str = "chat";

/// Path prefixes that are never rewritten, whatever the host.
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &[
    "/api",
    "/dashboard",
    "/admin/auth",
    "/_next",
    "/static",
    "/favicon.ico",
];

/// Edge routing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Socket address the edge server binds to.
    pub bind: String,
    /// Sub-path the bare root is mapped to under `/{slug}`.
    pub default_path: CompactString,
    /// Path prefixes excluded from the rewrite.
    pub excluded_prefixes: Vec<String>,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_owned(),
            default_path: DEFAULT_PATH.into(),
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|p| (*p).to_owned())
                .collect(),
        }
    }
}

impl EdgeConfig {
    /// Parse a TOML string, expanding `${ENV_VAR}` references first.
    ///
    /// The edge settings may sit at the top level or under an `[edge]` table.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Wrapped {
            edge: EdgeConfig,
        }

        let expanded = types::utils::expand_env_vars(toml_str);
        let value: toml::Table = toml::from_str(&expanded)?;
        if value.contains_key("edge") {
            let wrapped: Wrapped = toml::from_str(&expanded)?;
            return Ok(wrapped.edge);
        }
        Ok(toml::from_str(&expanded)?)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}
