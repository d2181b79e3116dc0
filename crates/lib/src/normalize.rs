//! Message normalizer: rewrites Slack message markup into canvas markdown.
//!
//! Each stage is a pure `&str -> String` rewrite; a [`Pipeline`] applies its stages left to right.
//! None of the stages can fail: text the patterns don't match passes through unchanged.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^|>]+)\|?([^>]*)>").unwrap());
static EMOJI_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":[a-z0-9_+-]+:").unwrap());
static DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[–—-]").unwrap());
static STRING_CONCAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""\n" \+\s*"#).unwrap());

/// `<url>` / `<url|text>` to markdown. Link text starting with `@` (a mention) becomes an
/// image embed.
pub fn convert_links(text: &str) -> String {
    LINK_RE
        .replace_all(text, |caps: &Captures| {
            let url = &caps[1];
            let link_text = caps
                .get(2)
                .map(|m| m.as_str())
                .filter(|t| !t.is_empty())
                .unwrap_or(url);
            if link_text.starts_with('@') {
                format!("![]({})", url)
            } else {
                format!("[{}]({})", link_text, url)
            }
        })
        .into_owned()
}

/// Strip `:shortcode:` emoji. Surrounding whitespace is kept.
pub fn remove_emoji_codes(text: &str) -> String {
    EMOJI_CODE_RE.replace_all(text, "").into_owned()
}

/// Remove hyphen-minus, en dash and em dash.
pub fn remove_dashes(text: &str) -> String {
    DASH_RE.replace_all(text, "").into_owned()
}

/// Remove `"<newline>" +` artifacts left behind by content pasted from concatenated string
/// literals.
pub fn remove_string_concatenation(text: &str) -> String {
    STRING_CONCAT_RE.replace_all(text, "").into_owned()
}

pub fn remove_newlines(text: &str) -> String {
    text.replace('\n', "")
}

/// One rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    ConvertLinks,
    RemoveEmojiCodes,
    RemoveDashes,
    RemoveStringConcatenation,
    RemoveNewlines,
}

impl Stage {
    pub fn apply(self, text: &str) -> String {
        match self {
            Stage::ConvertLinks => convert_links(text),
            Stage::RemoveEmojiCodes => remove_emoji_codes(text),
            Stage::RemoveDashes => remove_dashes(text),
            Stage::RemoveStringConcatenation => remove_string_concatenation(text),
            Stage::RemoveNewlines => remove_newlines(text),
        }
    }
}

/// Named pipeline configurations. Each fixes the default stages and how the inserted block is
/// laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Preset {
    /// Links converted, dashes removed; block is `"> {text} \n "`.
    #[default]
    Markdown,
    /// Text inserted as received; block is `"> {text}\n"`.
    Raw,
}

impl Preset {
    pub fn stages(self) -> Vec<Stage> {
        match self {
            Preset::Markdown => vec![Stage::ConvertLinks, Stage::RemoveDashes],
            Preset::Raw => Vec::new(),
        }
    }
}

/// Ordered stages plus the block layout used when inserting into the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
    preset: Preset,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

impl Pipeline {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            stages: preset.stages(),
            preset,
        }
    }

    /// Explicit stage list; the preset still decides the block layout.
    pub fn with_stages(preset: Preset, stages: Vec<Stage>) -> Self {
        Self { stages, preset }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn run(&self, text: &str) -> String {
        self.stages
            .iter()
            .fold(text.to_string(), |acc, stage| stage.apply(&acc))
    }

    /// Markdown inserted after the section: the normalized text as a block quote.
    pub fn quote_block(&self, normalized: &str) -> String {
        match self.preset {
            Preset::Markdown => format!("> {} \n ", normalized),
            Preset::Raw => format!("> {}\n", normalized),
        }
    }
}
