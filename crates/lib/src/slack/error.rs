//! Error types for Slack Web API calls.

use thiserror::Error;

/// Errors from the Slack Web API client.
#[derive(Error, Debug)]
pub enum SlackError {
    /// No bot token configured.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Slack answered `ok: false`. `code` is Slack's error string (e.g. "channel_not_found").
    #[error("{method} failed: {code}")]
    Api { method: String, code: String },

    /// Non-success HTTP status.
    #[error("{method} returned HTTP {status}: {body}")]
    Http {
        method: String,
        status: u16,
        body: String,
    },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Response body was not the JSON we expected.
    #[error("JSON error: {0}")]
    Json(String),
}

impl SlackError {
    /// Slack's error code when the platform rejected the call.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            SlackError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SlackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SlackError::Timeout(err.to_string())
        } else if err.is_connect() {
            SlackError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            SlackError::Json(err.to_string())
        } else {
            SlackError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(err: serde_json::Error) -> Self {
        SlackError::Json(err.to_string())
    }
}

pub type SlackResult<T> = std::result::Result<T, SlackError>;
