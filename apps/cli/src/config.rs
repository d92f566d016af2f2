//! Configuration resolution for the CLI.
//!
//! Resolves parley.toml in priority order:
//! 1. `--config <path>` flag (explicit override)
//! 2. `{cwd}/.parley/parley.toml` (workspace config)
//! 3. `~/.config/parley/parley.toml` (global config)
//!
//! Built-in defaults apply when none exists.

use anyhow::{Context, Result};
use client::ClientConfig;
use std::path::{Path, PathBuf};

/// Resolve client config following the priority chain.
pub fn resolve_config(config_flag: Option<&str>) -> Result<ClientConfig> {
    if let Some(path) = config_flag {
        return ClientConfig::load(Path::new(path))
            .with_context(|| format!("failed to load config from {path}"));
    }

    let workspace_path = PathBuf::from(".parley/parley.toml");
    if workspace_path.exists() {
        return ClientConfig::load(&workspace_path)
            .context("failed to load workspace config from .parley/parley.toml");
    }

    if let Some(global_path) = global_config_path().filter(|path| path.exists()) {
        return ClientConfig::load(&global_path).context("failed to load global config");
    }

    tracing::debug!("no config file found, using defaults");
    Ok(ClientConfig::default())
}

/// Global config path: `~/.config/parley/parley.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("parley").join("parley.toml"))
}
