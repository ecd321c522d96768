//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.converse/config.json`) and environment.
//! Credentials in the environment override the file so secrets need not be written to disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::conversation::{Credentials, DEFAULT_BASE_URL};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Service endpoint settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Login and workspace. Each field may be overridden from the environment.
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Where the service lives and how long a call may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Service root (default "https://gateway.watsonplatform.net").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request deadline in seconds. Absent or 0 = no client-side deadline.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}

/// Credentials as written in the config file; all optional until resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    /// Overridden by CONVERSATION_USERNAME env.
    pub username: Option<String>,
    /// Overridden by CONVERSATION_PASSWORD env.
    pub password: Option<String>,
    /// Overridden by CONVERSATION_WORKSPACE_ID env.
    pub workspace_id: Option<String>,
}

/// Non-empty, trimmed value of an env var.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn config_value(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve credentials: env overrides config. Fails naming the first missing field.
pub fn resolve_credentials(config: &Config) -> Result<Credentials> {
    let c = &config.credentials;
    let username = env_value("CONVERSATION_USERNAME")
        .or_else(|| config_value(&c.username))
        .context("missing username (set credentials.username or CONVERSATION_USERNAME)")?;
    let password = env_value("CONVERSATION_PASSWORD")
        .or_else(|| config_value(&c.password))
        .context("missing password (set credentials.password or CONVERSATION_PASSWORD)")?;
    let workspace_id = env_value("CONVERSATION_WORKSPACE_ID")
        .or_else(|| config_value(&c.workspace_id))
        .context(
            "missing workspace id (set credentials.workspaceId or CONVERSATION_WORKSPACE_ID)",
        )?;
    Ok(Credentials {
        username,
        password,
        workspace_id,
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CONVERSE_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".converse").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or CONVERSE_CONFIG_PATH).
/// Missing file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
