//! Slack Web API access.
//!
//! [`Workspace`] is the seam the handler talks to: the three platform calls it needs.
//! [`SlackClient`] implements it over HTTPS; tests substitute an in-memory fake.

mod client;
mod error;
mod types;

use async_trait::async_trait;

pub use client::{SlackClient, SLACK_API_BASE};
pub use error::{SlackError, SlackResult};
pub use types::{
    CanvasChange, CanvasSection, ChangeOperation, DocumentContent, HistoryMessage, HistoryQuery,
    HistoryResponse, SectionCriteria, SectionLookupResponse, SectionType,
};

/// Message history and canvas operations consumed by the handler.
#[async_trait]
pub trait Workspace: Send + Sync {
    async fn conversation_history(
        &self,
        query: &HistoryQuery,
    ) -> SlackResult<Vec<HistoryMessage>>;

    async fn lookup_sections(
        &self,
        canvas_id: &str,
        criteria: &SectionCriteria,
    ) -> SlackResult<Vec<CanvasSection>>;

    async fn edit_canvas(&self, canvas_id: &str, changes: &[CanvasChange]) -> SlackResult<()>;
}
