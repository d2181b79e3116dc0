//! Request and response payloads for the Slack Web API methods we call.

use serde::{Deserialize, Serialize};

/// `conversations.history` query. `latest` + `inclusive` + `limit = 1` selects one message by ts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryQuery {
    pub channel: String,
    pub latest: String,
    pub limit: u32,
    pub inclusive: bool,
}

impl HistoryQuery {
    /// The single message at-or-before `ts`.
    pub fn single(channel: impl Into<String>, ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            latest: ts.into(),
            limit: 1,
            inclusive: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

/// Message item from `conversations.history`. Only the text is read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    #[serde(default)]
    pub text: Option<String>,
}

/// Heading levels searched by `canvases.sections.lookup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    H1,
    H2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionCriteria {
    pub section_types: Vec<SectionType>,
    pub contains_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SectionLookupRequest<'a> {
    pub canvas_id: &'a str,
    pub criteria: &'a SectionCriteria,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionLookupResponse {
    #[serde(default)]
    pub sections: Vec<CanvasSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSection {
    pub id: String,
}

/// One entry of `canvases.edit` `changes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasChange {
    pub operation: ChangeOperation,
    pub section_id: String,
    pub document_content: DocumentContent,
}

impl CanvasChange {
    /// Insert markdown right after the given section.
    pub fn insert_after(section_id: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            operation: ChangeOperation::InsertAfter,
            section_id: section_id.into(),
            document_content: DocumentContent::markdown(markdown),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    InsertAfter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentContent {
    #[serde(rename = "type")]
    pub typ: String,
    pub markdown: String,
}

impl DocumentContent {
    pub fn markdown(markdown: impl Into<String>) -> Self {
        Self {
            typ: "markdown".to_string(),
            markdown: markdown.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CanvasEditRequest<'a> {
    pub canvas_id: &'a str,
    pub changes: &'a [CanvasChange],
}
