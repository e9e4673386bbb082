use crate::error::{Result, TraceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub type Timestamp = DateTime<Utc>;

/// Title of a page, the node key of the navigation graph.
///
/// Titles compare as exact strings. Whitespace and case are left alone, so
/// the host is expected to hand over one canonical spelling per page.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageTitle(String);

impl PageTitle {
    pub fn new(title: impl Into<String>) -> Result<Self> {
        let title = title.into();
        if title.is_empty() {
            return Err(TraceError::InvalidTitle(title));
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PageTitle {
    type Error = TraceError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for PageTitle {
    type Error = TraceError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PageTitle> for String {
    fn from(title: PageTitle) -> Self {
        title.0
    }
}

impl Borrow<str> for PageTitle {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PageTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A confirmed navigation from one page to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: PageTitle,
    pub to: PageTitle,
    // Entries written without a time load as the Unix epoch
    #[serde(default)]
    pub observed_at: Timestamp,
}

impl Edge {
    pub fn new(from: PageTitle, to: PageTitle, observed_at: Timestamp) -> Self {
        Self {
            from,
            to,
            observed_at,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}
