//! Function server: exposes the parse-message handler over HTTP.
//!
//! `GET /` is a health probe. `POST /functions/parse_message` takes the function input as JSON and
//! answers with the function output (`parsedMsg` or `error`), HTTP 200 either way. A body that is
//! not a valid input record is reported through `error` as well. Only a missing or wrong bearer
//! token gets a non-200 status (401).

use crate::config::{self, Config};
use crate::handler::{FunctionInput, FunctionOutput, Handler, HandlerError};
use crate::slack::{SlackClient, Workspace};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PARSE_MESSAGE_PATH: &str = "/functions/parse_message";

/// Shared state for request handlers.
#[derive(Clone)]
pub struct ServerState {
    pub port: u16,
    pub handler: Arc<Handler>,
    pub workspace: Arc<dyn Workspace>,
    /// When Some, function calls must send `Authorization: Bearer <token>`.
    pub required_token: Option<String>,
}

impl ServerState {
    /// Build handler and Slack client from config and environment.
    pub fn from_config(config: &Config, config_path: &Path) -> Result<Self> {
        let token = config::resolve_slack_token(config);
        if token.is_none() {
            log::warn!("no slack bot token configured (set slack.botToken or SLACK_BOT_TOKEN)");
        }
        let client = SlackClient::new(token, config::resolve_slack_api_base(config))
            .context("creating slack client")?;
        let mut state = Self::with_workspace(config, config_path, Arc::new(client))?;
        state.required_token = config::resolve_server_token(config);
        Ok(state)
    }

    /// Build the handler from config around a given workspace. Reads no environment;
    /// `required_token` is taken from `server.token` only.
    pub fn with_workspace(
        config: &Config,
        config_path: &Path,
        workspace: Arc<dyn Workspace>,
    ) -> Result<Self> {
        let directory = config::load_directory(config, config_path)?;
        let handler = Handler::new(Arc::new(directory), config::build_pipeline(config))
            .with_default_canvas(config.canvas.default_canvas_id.clone());
        Ok(Self {
            port: config.server.port,
            handler: Arc::new(handler),
            workspace,
            required_token: config.server.token.clone().filter(|t| !t.trim().is_empty()),
        })
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route(PARSE_MESSAGE_PATH, post(parse_message_http))
        .with_state(state)
}

/// Bind and serve until SIGINT/SIGTERM.
pub async fn run_server(config: Config, config_path: PathBuf) -> Result<()> {
    let bind = config.server.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) && config::resolve_server_token(&config).is_none() {
        anyhow::bail!(
            "refusing to bind server to {} without auth (set server.token or NEWSLETTER_SERVER_TOKEN)",
            bind
        );
    }
    let state = ServerState::from_config(&config, &config_path)?;
    serve(state, &bind).await
}

/// Serve `state` on `bind:state.port` until SIGINT/SIGTERM.
pub async fn serve(state: ServerState, bind: &str) -> Result<()> {
    let bind_addr = format!("{}:{}", bind, state.port);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("function server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("function server exited")?;
    log::info!("function server stopped");
    Ok(())
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.port,
    }))
}

fn authorized(headers: &HeaderMap, required: Option<&str>) -> bool {
    let Some(expected) = required else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim() == expected)
        .unwrap_or(false)
}

/// POST /functions/parse_message — run one invocation.
async fn parse_message_http(
    State(state): State<ServerState>,
    headers: HeaderMap,
    input: Result<Json<FunctionInput>, JsonRejection>,
) -> Result<Json<FunctionOutput>, StatusCode> {
    if !authorized(&headers, state.required_token.as_deref()) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let input = match input {
        Ok(Json(input)) => input,
        Err(rejection) => {
            log::warn!("parse_message: rejected input: {}", rejection.body_text());
            return Ok(Json(HandlerError::Unhandled(rejection.body_text()).into()));
        }
    };
    log::debug!(
        "parse_message: channel={} ts={}",
        input.channel_name,
        input.message_ts
    );
    let output = state.handler.handle(state.workspace.as_ref(), &input).await;
    Ok(Json(output))
}
