use crate::error::Result;
use crate::model::{PageTitle, Timestamp};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A navigation the user started but which has not been seen to finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingIntent {
    pub origin_title: PageTitle,
    pub recorded_at: Timestamp,
}

/// Result of looking up a pending intent for a completed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The intent was recorded within the window and has been removed
    Matched(PendingIntent),
    /// The intent was too old; it has been removed without matching
    Expired(PendingIntent),
    NotFound,
}

/// Pending intents keyed by navigation target.
///
/// Entries are never swept in the background. An entry older than the window
/// is discarded the first time its target is looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeTimeoutMap {
    entries: BTreeMap<String, PendingIntent>,
}

impl EdgeTimeoutMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an intent for `target`, replacing any unconsumed one.
    ///
    /// Returns the replaced intent. Duplicate click and keyboard activations
    /// of the same link land here, and the most recent one wins.
    pub fn record(
        &mut self,
        target: &str,
        origin_title: PageTitle,
        now: Timestamp,
    ) -> Option<PendingIntent> {
        let replaced = self.entries.insert(
            target.to_string(),
            PendingIntent {
                origin_title,
                recorded_at: now,
            },
        );
        if let Some(ref old) = replaced {
            debug!(
                "Intent for {} from {} superseded",
                target, old.origin_title
            );
        }
        replaced
    }

    /// Removes the intent for `target` and reports whether it was still fresh.
    ///
    /// An intent matches when `now - recorded_at <= window`. A negative age
    /// (completion stamped before the intent) counts as fresh.
    pub fn try_consume(&mut self, target: &str, now: Timestamp, window: TimeDelta) -> ConsumeOutcome {
        let Some(intent) = self.entries.remove(target) else {
            return ConsumeOutcome::NotFound;
        };

        let age = now - intent.recorded_at;
        if age <= window {
            ConsumeOutcome::Matched(intent)
        } else {
            debug!(
                "Intent for {} expired after {} ms (window {} ms)",
                target,
                age.num_milliseconds(),
                window.num_milliseconds()
            );
            ConsumeOutcome::Expired(intent)
        }
    }

    pub fn get(&self, target: &str) -> Option<&PendingIntent> {
        self.entries.get(target)
    }

    pub fn remove(&mut self, target: &str) -> Option<PendingIntent> {
        self.entries.remove(target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuilds the map from a stored blob. Missing or unreadable blobs load
    /// as an empty map.
    pub fn deserialize(blob: Option<&str>) -> Self {
        let Some(blob) = blob else {
            return Self::new();
        };
        match serde_json::from_str(blob) {
            Ok(map) => map,
            Err(e) => {
                warn!("Discarding unreadable pending intents: {}", e);
                Self::new()
            }
        }
    }
}
