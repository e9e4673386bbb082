use crate::error::{HostError, Result};
use crate::page::title_from_url;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A single signal captured from the browsing host.
///
/// Event logs hold one JSON object per line, for example
/// `{"type":"intent","origin":"Dog","target":"/wiki/Cat"}` followed by
/// `{"type":"load","url":"/wiki/Cat","title":"Cat"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// The user activated a link on page `origin` pointing at `target`
    Intent {
        origin: String,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<DateTime<Utc>>,
    },
    /// The page at `url` finished loading
    Load {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<DateTime<Utc>>,
    },
}

impl HostEvent {
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            HostEvent::Intent { at, .. } | HostEvent::Load { at, .. } => *at,
        }
    }

    /// Title of the loaded page, derived from its URL when the host did not
    /// capture one. `None` for intents.
    pub fn page_title(&self) -> Option<Result<String>> {
        match self {
            HostEvent::Intent { .. } => None,
            HostEvent::Load {
                title: Some(title), ..
            } => Some(Ok(title.clone())),
            HostEvent::Load { url, title: None, .. } => Some(title_from_url(url)),
        }
    }
}

/// Parses a JSON-lines event log. Blank lines and `#` comments are skipped.
pub fn parse_event_log(content: &str) -> Result<Vec<HostEvent>> {
    let mut events = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(line).map_err(|e| HostError::ParseError {
            line: idx + 1,
            message: e.to_string(),
        })?;
        events.push(event);
    }
    debug!("Parsed {} host events", events.len());
    Ok(events)
}

pub fn load_event_log(path: &Path) -> Result<Vec<HostEvent>> {
    let content = fs::read_to_string(path)?;
    parse_event_log(&content)
}
