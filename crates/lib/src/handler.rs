//! The parse-message function: copy a reacted-to message into its channel's canvas section.
//!
//! One linear pass per invocation: fetch message, resolve channel, find section, normalize,
//! insert. Every step can end the invocation with a [`HandlerError`]; nothing is retried.

use crate::directory::ChannelDirectory;
use crate::normalize::Pipeline;
use crate::slack::{
    CanvasChange, HistoryQuery, SectionCriteria, SectionType, SlackError, Workspace,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Substituted when the fetched message has no text.
pub const NO_TEXT_PLACEHOLDER: &str = "No text content found";

const SECTION_TYPES: [SectionType; 2] = [SectionType::H1, SectionType::H2];

/// Function input, as delivered by the workflow trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInput {
    /// Channel where the reaction was added.
    pub channel_id: String,
    /// Channel name, looked up in the directory (e.g. "#kultura").
    pub channel_name: String,
    /// Timestamp of the reacted-to message.
    pub message_ts: String,
    /// Target canvas. Falls back to the configured default canvas.
    #[serde(default)]
    pub canvas_id: Option<String>,
}

/// Function output: `{ "parsedMsg": ... }` or `{ "error": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionOutput {
    Parsed {
        #[serde(rename = "parsedMsg")]
        parsed_msg: String,
    },
    Error {
        error: String,
    },
}

impl FunctionOutput {
    pub fn is_error(&self) -> bool {
        matches!(self, FunctionOutput::Error { .. })
    }
}

/// Terminal failures. The `Display` text is what callers see in `error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("Could not retrieve the message that was reacted to.")]
    MessageNotFound,
    #[error("Could not find the channel that was reacted to.")]
    ChannelNotFound,
    #[error("Could not find the section that was reacted to.")]
    SectionNotFound,
    #[error("Failed to update section: {0}")]
    EditFailed(String),
    #[error("Failed to parse message: {0}")]
    Unhandled(String),
}

impl From<HandlerError> for FunctionOutput {
    fn from(e: HandlerError) -> Self {
        FunctionOutput::Error {
            error: e.to_string(),
        }
    }
}

/// Platform rejections (`ok: false`) of a read carry no data: treat them as an empty result.
/// Anything else (transport, decoding) is a fault.
fn empty_on_rejection<T>(result: Result<Vec<T>, SlackError>) -> Result<Vec<T>, HandlerError> {
    match result {
        Ok(items) => Ok(items),
        Err(e) if e.api_code().is_some() => {
            log::warn!("{}", e);
            Ok(Vec::new())
        }
        Err(e) => Err(HandlerError::Unhandled(e.to_string())),
    }
}

/// Holds the read-only directory and the pipeline; shared across invocations.
#[derive(Debug, Clone)]
pub struct Handler {
    directory: Arc<ChannelDirectory>,
    pipeline: Pipeline,
    default_canvas_id: Option<String>,
}

impl Handler {
    pub fn new(directory: Arc<ChannelDirectory>, pipeline: Pipeline) -> Self {
        Self {
            directory,
            pipeline,
            default_canvas_id: None,
        }
    }

    pub fn with_default_canvas(mut self, canvas_id: Option<String>) -> Self {
        self.default_canvas_id = canvas_id.filter(|c| !c.trim().is_empty());
        self
    }

    /// Run one invocation and fold the result into the function output record.
    pub async fn handle(
        &self,
        workspace: &dyn Workspace,
        input: &FunctionInput,
    ) -> FunctionOutput {
        match self.parse_message(workspace, input).await {
            Ok(parsed_msg) => FunctionOutput::Parsed { parsed_msg },
            Err(e) => {
                log::warn!(
                    "parse_message failed for {} @ {}: {}",
                    input.channel_name,
                    input.message_ts,
                    e
                );
                e.into()
            }
        }
    }

    /// Run one invocation. Returns the normalized text that was inserted.
    pub async fn parse_message(
        &self,
        workspace: &dyn Workspace,
        input: &FunctionInput,
    ) -> Result<String, HandlerError> {
        let canvas_id = input
            .canvas_id
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.default_canvas_id.as_deref())
            .ok_or_else(|| {
                HandlerError::Unhandled(
                    "no canvas_id given and no default canvas configured".to_string(),
                )
            })?;

        let query = HistoryQuery::single(&input.channel_id, &input.message_ts);
        let messages = empty_on_rejection(workspace.conversation_history(&query).await)?;
        let message = messages.into_iter().next().ok_or(HandlerError::MessageNotFound)?;
        let text = message
            .text
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TEXT_PLACEHOLDER.to_string());

        let channel = self
            .directory
            .lookup(&input.channel_name)
            .ok_or(HandlerError::ChannelNotFound)?;
        log::debug!("channel {} -> section \"{}\"", input.channel_name, channel.title);

        let criteria = SectionCriteria {
            section_types: SECTION_TYPES.to_vec(),
            contains_text: channel.title.clone(),
        };
        let sections = empty_on_rejection(workspace.lookup_sections(canvas_id, &criteria).await)?;
        let section = sections.into_iter().next().ok_or(HandlerError::SectionNotFound)?;

        let normalized = self.pipeline.run(&text);
        log::debug!("normalized message: {}", normalized);

        let change = CanvasChange::insert_after(section.id, self.pipeline.quote_block(&normalized));
        match workspace.edit_canvas(canvas_id, &[change]).await {
            Ok(()) => {}
            Err(SlackError::Api { code, .. }) => return Err(HandlerError::EditFailed(code)),
            Err(e) => return Err(HandlerError::Unhandled(e.to_string())),
        }
        log::info!("inserted message {} into canvas {}", input.message_ts, canvas_id);

        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::ChannelEntry;
    use crate::normalize::Preset;
    use crate::slack::{CanvasSection, HistoryMessage, SlackResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory workspace: canned answers, recorded calls.
    #[derive(Default)]
    struct FakeWorkspace {
        messages: Vec<HistoryMessage>,
        history_rejection: Option<&'static str>,
        history_unreachable: bool,
        sections: Vec<CanvasSection>,
        sections_rejection: Option<&'static str>,
        edit_rejection: Option<&'static str>,
        history_calls: Mutex<Vec<HistoryQuery>>,
        lookups: Mutex<Vec<(String, SectionCriteria)>>,
        edits: Mutex<Vec<(String, Vec<CanvasChange>)>>,
    }

    impl FakeWorkspace {
        fn with_message(text: Option<&str>) -> Self {
            Self {
                messages: vec![HistoryMessage {
                    text: text.map(str::to_string),
                }],
                sections: vec![
                    CanvasSection {
                        id: "temp:C:first".to_string(),
                    },
                    CanvasSection {
                        id: "temp:C:second".to_string(),
                    },
                ],
                ..Default::default()
            }
        }

        fn edits(&self) -> Vec<(String, Vec<CanvasChange>)> {
            self.edits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Workspace for FakeWorkspace {
        async fn conversation_history(
            &self,
            query: &HistoryQuery,
        ) -> SlackResult<Vec<HistoryMessage>> {
            self.history_calls.lock().unwrap().push(query.clone());
            if self.history_unreachable {
                return Err(SlackError::Network("Connection failed: refused".to_string()));
            }
            if let Some(code) = self.history_rejection {
                return Err(SlackError::Api {
                    method: "conversations.history".to_string(),
                    code: code.to_string(),
                });
            }
            Ok(self.messages.clone())
        }

        async fn lookup_sections(
            &self,
            canvas_id: &str,
            criteria: &SectionCriteria,
        ) -> SlackResult<Vec<CanvasSection>> {
            self.lookups
                .lock()
                .unwrap()
                .push((canvas_id.to_string(), criteria.clone()));
            if let Some(code) = self.sections_rejection {
                return Err(SlackError::Api {
                    method: "canvases.sections.lookup".to_string(),
                    code: code.to_string(),
                });
            }
            Ok(self.sections.clone())
        }

        async fn edit_canvas(&self, canvas_id: &str, changes: &[CanvasChange]) -> SlackResult<()> {
            self.edits
                .lock()
                .unwrap()
                .push((canvas_id.to_string(), changes.to_vec()));
            match self.edit_rejection {
                Some(code) => Err(SlackError::Api {
                    method: "canvases.edit".to_string(),
                    code: code.to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    fn handler(preset: Preset) -> Handler {
        let directory = ChannelDirectory::new(vec![
            ChannelEntry {
                title: "Kultura".to_string(),
                channel_identifier: "#kultura".to_string(),
            },
            ChannelEntry {
                title: "Bazarki".to_string(),
                channel_identifier: "#bazarki".to_string(),
            },
        ]);
        Handler::new(Arc::new(directory), Pipeline::from_preset(preset))
    }

    fn input(channel_name: &str) -> FunctionInput {
        FunctionInput {
            channel_id: "C123".to_string(),
            channel_name: channel_name.to_string(),
            message_ts: "1712.0001".to_string(),
            canvas_id: Some("F0CANVAS".to_string()),
        }
    }

    fn error(msg: &str) -> FunctionOutput {
        FunctionOutput::Error {
            error: msg.to_string(),
        }
    }

    #[tokio::test]
    async fn inserts_normalized_message_after_first_section() {
        let ws = FakeWorkspace::with_message(Some("<http://a|Title> - note"));
        let out = handler(Preset::Markdown).handle(&ws, &input("#kultura")).await;
        assert_eq!(
            out,
            FunctionOutput::Parsed {
                parsed_msg: "[Title](http://a)  note".to_string()
            }
        );

        let edits = ws.edits();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, "F0CANVAS");
        assert_eq!(
            edits[0].1,
            vec![CanvasChange::insert_after(
                "temp:C:first",
                "> [Title](http://a)  note \n "
            )]
        );
    }

    #[tokio::test]
    async fn queries_single_message_and_heading_sections() {
        let ws = FakeWorkspace::with_message(Some("x"));
        handler(Preset::Markdown)
            .parse_message(&ws, &input("#bazarki"))
            .await
            .unwrap();
        assert_eq!(
            ws.history_calls.lock().unwrap().as_slice(),
            &[HistoryQuery::single("C123", "1712.0001")]
        );
        let lookups = ws.lookups.lock().unwrap();
        assert_eq!(lookups[0].0, "F0CANVAS");
        assert_eq!(lookups[0].1.section_types, vec![SectionType::H1, SectionType::H2]);
        assert_eq!(lookups[0].1.contains_text, "Bazarki");
    }

    #[tokio::test]
    async fn no_messages_stops_before_edit() {
        let ws = FakeWorkspace::default();
        let out = handler(Preset::Markdown).handle(&ws, &input("#kultura")).await;
        assert_eq!(out, error("Could not retrieve the message that was reacted to."));
        assert!(ws.lookups.lock().unwrap().is_empty());
        assert!(ws.edits().is_empty());
    }

    #[tokio::test]
    async fn history_rejection_reads_as_missing_message() {
        let ws = FakeWorkspace {
            history_rejection: Some("channel_not_found"),
            ..Default::default()
        };
        let err = handler(Preset::Markdown)
            .parse_message(&ws, &input("#kultura"))
            .await
            .unwrap_err();
        assert_eq!(err, HandlerError::MessageNotFound);
    }

    #[tokio::test]
    async fn unreachable_workspace_is_unhandled_fault() {
        let ws = FakeWorkspace {
            history_unreachable: true,
            ..Default::default()
        };
        let out = handler(Preset::Markdown).handle(&ws, &input("#kultura")).await;
        assert_eq!(
            out,
            error("Failed to parse message: Network error: Connection failed: refused")
        );
    }

    #[tokio::test]
    async fn unknown_channel_is_reported() {
        let ws = FakeWorkspace::with_message(Some("x"));
        let out = handler(Preset::Markdown).handle(&ws, &input("#nowhere")).await;
        assert_eq!(out, error("Could not find the channel that was reacted to."));
        assert!(ws.edits().is_empty());
    }

    #[tokio::test]
    async fn no_sections_is_reported() {
        let ws = FakeWorkspace {
            sections: Vec::new(),
            ..FakeWorkspace::with_message(Some("x"))
        };
        let out = handler(Preset::Markdown).handle(&ws, &input("#kultura")).await;
        assert_eq!(out, error("Could not find the section that was reacted to."));
        assert!(ws.edits().is_empty());
    }

    #[tokio::test]
    async fn section_lookup_rejection_reads_as_missing_section() {
        let ws = FakeWorkspace {
            sections_rejection: Some("canvas_not_found"),
            ..FakeWorkspace::with_message(Some("x"))
        };
        let err = handler(Preset::Markdown)
            .parse_message(&ws, &input("#kultura"))
            .await
            .unwrap_err();
        assert_eq!(err, HandlerError::SectionNotFound);
        assert_eq!(ws.lookups.lock().unwrap().len(), 1);
        assert!(ws.edits().is_empty());
    }

    #[tokio::test]
    async fn edit_rejection_is_reported_with_detail() {
        let ws = FakeWorkspace {
            edit_rejection: Some("canvas_editing_failed"),
            ..FakeWorkspace::with_message(Some("x"))
        };
        let out = handler(Preset::Markdown).handle(&ws, &input("#kultura")).await;
        assert_eq!(out, error("Failed to update section: canvas_editing_failed"));
        assert_eq!(ws.edits().len(), 1);
    }

    #[tokio::test]
    async fn missing_text_uses_placeholder() {
        for text in [None, Some("")] {
            let ws = FakeWorkspace::with_message(text);
            let parsed = handler(Preset::Markdown)
                .parse_message(&ws, &input("#kultura"))
                .await
                .unwrap();
            assert_eq!(parsed, NO_TEXT_PLACEHOLDER);
        }
    }

    #[tokio::test]
    async fn raw_preset_inserts_text_unchanged() {
        let ws = FakeWorkspace::with_message(Some("<http://a|T> - x"));
        let parsed = handler(Preset::Raw)
            .parse_message(&ws, &input("#kultura"))
            .await
            .unwrap();
        assert_eq!(parsed, "<http://a|T> - x");
        assert_eq!(
            ws.edits()[0].1,
            vec![CanvasChange::insert_after("temp:C:first", "> <http://a|T> - x\n")]
        );
    }

    #[tokio::test]
    async fn default_canvas_used_when_input_has_none() {
        let ws = FakeWorkspace::with_message(Some("x"));
        let h = handler(Preset::Markdown).with_default_canvas(Some("F0DEFAULT".to_string()));
        let mut i = input("#kultura");
        i.canvas_id = None;
        h.parse_message(&ws, &i).await.unwrap();
        assert_eq!(ws.edits()[0].0, "F0DEFAULT");
    }

    #[tokio::test]
    async fn missing_canvas_is_unhandled_fault() {
        let ws = FakeWorkspace::with_message(Some("x"));
        let mut i = input("#kultura");
        i.canvas_id = None;
        let err = handler(Preset::Markdown).parse_message(&ws, &i).await.unwrap_err();
        assert!(matches!(err, HandlerError::Unhandled(_)));
        assert!(ws.history_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn output_wire_shapes() {
        let ok = FunctionOutput::Parsed {
            parsed_msg: "x".to_string(),
        };
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"parsedMsg":"x"}"#);
        let err: FunctionOutput = HandlerError::SectionNotFound.into();
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            r#"{"error":"Could not find the section that was reacted to."}"#
        );
        assert!(err.is_error());
    }

    #[test]
    fn input_canvas_id_is_optional() {
        let i: FunctionInput = serde_json::from_str(
            r##"{"channel_id":"C1","channel_name":"#kultura","message_ts":"1.2"}"##,
        )
        .unwrap();
        assert!(i.canvas_id.is_none());
    }
}
