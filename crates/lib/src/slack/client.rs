//! Slack Web API client: conversations.history, canvases.sections.lookup, canvases.edit.

use crate::slack::error::{SlackError, SlackResult};
use crate::slack::types::{
    CanvasChange, CanvasEditRequest, CanvasSection, HistoryMessage, HistoryQuery,
    HistoryResponse, SectionCriteria, SectionLookupRequest, SectionLookupResponse,
};
use crate::slack::Workspace;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const SLACK_API_BASE: &str = "https://slack.com/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bot-token client for the Slack Web API.
#[derive(Clone)]
pub struct SlackClient {
    api_base: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(token: Option<String>, api_base: Option<String>) -> SlackResult<Self> {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| SLACK_API_BASE.to_string());
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SlackError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            api_base,
            token,
            client,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn token(&self) -> SlackResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| SlackError::Config("slack bot token not configured".to_string()))
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Check HTTP status and the `ok` envelope, then decode the method-specific payload.
    async fn decode<T: DeserializeOwned>(method: &str, res: reqwest::Response) -> SlackResult<T> {
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(SlackError::Http {
                method: method.to_string(),
                status,
                body,
            });
        }
        let data: serde_json::Value = res.json().await?;
        if data.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let code = data
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown")
                .to_string();
            return Err(SlackError::Api {
                method: method.to_string(),
                code,
            });
        }
        Ok(serde_json::from_value(data)?)
    }

    /// GET conversations.history.
    pub async fn conversations_history(
        &self,
        query: &HistoryQuery,
    ) -> SlackResult<Vec<HistoryMessage>> {
        let method = "conversations.history";
        let res = self
            .client
            .get(self.url(method))
            .bearer_auth(self.token()?)
            .query(query)
            .send()
            .await?;
        let data: HistoryResponse = Self::decode(method, res).await?;
        Ok(data.messages)
    }

    /// POST canvases.sections.lookup.
    pub async fn canvases_sections_lookup(
        &self,
        canvas_id: &str,
        criteria: &SectionCriteria,
    ) -> SlackResult<Vec<CanvasSection>> {
        let method = "canvases.sections.lookup";
        let body = SectionLookupRequest { canvas_id, criteria };
        let res = self
            .client
            .post(self.url(method))
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await?;
        let data: SectionLookupResponse = Self::decode(method, res).await?;
        Ok(data.sections)
    }

    /// POST canvases.edit.
    pub async fn canvases_edit(
        &self,
        canvas_id: &str,
        changes: &[CanvasChange],
    ) -> SlackResult<()> {
        let method = "canvases.edit";
        let body = CanvasEditRequest { canvas_id, changes };
        let res = self
            .client
            .post(self.url(method))
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .await?;
        let _: serde_json::Value = Self::decode(method, res).await?;
        Ok(())
    }
}

#[async_trait]
impl Workspace for SlackClient {
    async fn conversation_history(
        &self,
        query: &HistoryQuery,
    ) -> SlackResult<Vec<HistoryMessage>> {
        self.conversations_history(query).await
    }

    async fn lookup_sections(
        &self,
        canvas_id: &str,
        criteria: &SectionCriteria,
    ) -> SlackResult<Vec<CanvasSection>> {
        self.canvases_sections_lookup(canvas_id, criteria).await
    }

    async fn edit_canvas(&self, canvas_id: &str, changes: &[CanvasChange]) -> SlackResult<()> {
        self.canvases_edit(canvas_id, changes).await
    }
}
