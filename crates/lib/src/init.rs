//! Initialize the configuration directory: create `~/.converse` and a template config file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{Config, CredentialsConfig};

/// Template written by `init`: default service settings and empty credential slots to fill in.
fn template_config() -> Config {
    Config {
        credentials: CredentialsConfig {
            username: Some(String::new()),
            password: Some(String::new()),
            workspace_id: Some(String::new()),
        },
        ..Config::default()
    }
}

/// Create the config directory and a template config file if they do not exist.
/// An existing config file is never overwritten. Returns the config directory.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let template = serde_json::to_string_pretty(&template_config())
            .context("serializing template config")?;
        std::fs::write(config_path, template)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, skipping", config_path.display());
    }

    Ok(config_dir.to_path_buf())
}
