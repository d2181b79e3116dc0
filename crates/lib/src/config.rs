//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.newsletter/config.json`) and environment.
//! Secrets (bot token, server token) are usually supplied through the environment.

use crate::directory::ChannelDirectory;
use crate::normalize::{Pipeline, Preset, Stage};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Slack Web API credentials and endpoint.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Target canvas settings.
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// Text normalization pipeline.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Channel directory JSON file. Relative paths are resolved against the config file's parent.
    /// Omit to use the bundled table.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Function server bind, port, and auth.
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    /// Bot token (xoxb-...). Overridden by SLACK_BOT_TOKEN env.
    pub bot_token: Option<String>,
    /// Web API base URL (default https://slack.com/api). Overridden by SLACK_API_BASE env.
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Canvas used when an invocation does not carry `canvas_id`.
    pub default_canvas_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// "markdown" (default) or "raw".
    #[serde(default)]
    pub preset: Preset,
    /// Explicit stage order, replacing the preset's stages
    /// (e.g. ["convertLinks", "removeEmojiCodes"]).
    #[serde(default)]
    pub stages: Option<Vec<Stage>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for HTTP (default 15152).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,

    /// Bearer token required on function calls. Overridden by NEWSLETTER_SERVER_TOKEN env.
    /// Required when bind is not loopback.
    pub token: Option<String>,
}

fn default_server_port() -> u16 {
    15152
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
            token: None,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Resolve the Slack bot token: env SLACK_BOT_TOKEN overrides config.
pub fn resolve_slack_token(config: &Config) -> Option<String> {
    env_non_empty("SLACK_BOT_TOKEN").or_else(|| trimmed(config.slack.bot_token.as_ref()))
}

/// Resolve the Slack API base: env SLACK_API_BASE overrides config. None means the public API.
pub fn resolve_slack_api_base(config: &Config) -> Option<String> {
    env_non_empty("SLACK_API_BASE").or_else(|| trimmed(config.slack.api_base.as_ref()))
}

/// Resolve the server token: env NEWSLETTER_SERVER_TOKEN overrides config.
pub fn resolve_server_token(config: &Config) -> Option<String> {
    env_non_empty("NEWSLETTER_SERVER_TOKEN").or_else(|| trimmed(config.server.token.as_ref()))
}

/// True if the bind address is loopback (127.0.0.1, ::1, localhost).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("NEWSLETTER_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".newsletter").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, NEWSLETTER_CONFIG_PATH, or the default.
/// Missing file => default config.
/// Returns the config and the path that was used (for resolving relative paths).
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

fn config_parent(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Resolve the channel directory file, if one is configured.
pub fn resolve_directory_path(config: &Config, config_path: &Path) -> Option<PathBuf> {
    match &config.directory {
        Some(d) if !d.as_os_str().is_empty() => {
            if d.is_absolute() {
                Some(d.clone())
            } else {
                Some(config_parent(config_path).join(d))
            }
        }
        _ => None,
    }
}

/// Load the configured channel directory, or the bundled one when none is set.
pub fn load_directory(config: &Config, config_path: &Path) -> Result<ChannelDirectory> {
    let directory = match resolve_directory_path(config, config_path) {
        Some(p) => ChannelDirectory::load(&p)?,
        None => ChannelDirectory::bundled()?,
    };
    log::debug!("channel directory has {} entries", directory.len());
    Ok(directory)
}

/// Pipeline from config: the preset, with its stages replaced when `pipeline.stages` is set.
pub fn build_pipeline(config: &Config) -> Pipeline {
    match &config.pipeline.stages {
        Some(stages) => Pipeline::with_stages(config.pipeline.preset, stages.clone()),
        None => Pipeline::from_preset(config.pipeline.preset),
    }
}
