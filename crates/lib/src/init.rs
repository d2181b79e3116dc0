//! Initialize the configuration directory: `~/.newsletter/config.json` and an editable
//! copy of the bundled channel directory (`channels.json`) that the config points at.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::directory::ChannelDirectory;

pub const DIRECTORY_FILE: &str = "channels.json";

fn default_config_json() -> String {
    let v = serde_json::json!({
        "slack": {},
        "canvas": {},
        "pipeline": { "preset": "markdown" },
        "directory": DIRECTORY_FILE,
    });
    serde_json::to_string_pretty(&v).unwrap_or_else(|_| "{}".to_string())
}

/// Create the config directory and default files if they do not exist.
/// Existing files are left untouched.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, default_config_json())
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let directory_path = config_dir.join(DIRECTORY_FILE);
    if !directory_path.exists() {
        std::fs::write(&directory_path, ChannelDirectory::bundled_json())
            .with_context(|| format!("writing channel directory to {}", directory_path.display()))?;
        log::info!("wrote channel directory to {}", directory_path.display());
    } else {
        log::debug!(
            "channel directory already exists at {}, skipping",
            directory_path.display()
        );
    }

    Ok(config_dir.to_path_buf())
}
