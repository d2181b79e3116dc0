//! Channel directory: channel identifier (e.g. "#kultura") -> canvas section title.
//!
//! The bundled table lives in `config/channels.json` and is compiled in; a config option can
//! point at an edited copy instead. Lookup is exact and first-match-wins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

static BUNDLED_CHANNELS: &str = include_str!("../config/channels.json");

/// One directory row: the section title to search for and the channel it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub title: String,
    /// Channel identifier as delivered by the trigger (`channel_name`), including the leading `#`.
    #[serde(rename = "channel")]
    pub channel_identifier: String,
}

/// Ordered, read-only list of channel entries. Built once at startup and shared.
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    entries: Vec<ChannelEntry>,
}

impl ChannelDirectory {
    pub fn new(entries: Vec<ChannelEntry>) -> Self {
        let directory = Self { entries };
        for dup in directory.duplicate_identifiers() {
            log::debug!("channel directory: {} listed more than once, first entry wins", dup);
        }
        directory
    }

    /// The table shipped with the library.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CHANNELS).context("parsing bundled channel directory")
    }

    /// Raw JSON of the bundled table (written out by `init`).
    pub fn bundled_json() -> &'static str {
        BUNDLED_CHANNELS
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let entries: Vec<ChannelEntry> = serde_json::from_str(s)?;
        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading channel directory from {}", path.display()))?;
        Self::from_json(&s)
            .with_context(|| format!("parsing channel directory from {}", path.display()))
    }

    /// Exact match on the channel identifier. No trimming or case-folding.
    pub fn lookup(&self, channel_name: &str) -> Option<&ChannelEntry> {
        self.entries
            .iter()
            .find(|e| e.channel_identifier == channel_name)
    }

    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers that appear more than once, in first-seen order.
    pub fn duplicate_identifiers(&self) -> Vec<&str> {
        let mut dups: Vec<&str> = Vec::new();
        for (i, e) in self.entries.iter().enumerate() {
            let id = e.channel_identifier.as_str();
            let seen_before = self.entries[..i].iter().any(|p| p.channel_identifier == id);
            if seen_before && !dups.contains(&id) {
                dups.push(id);
            }
        }
        dups
    }
}
