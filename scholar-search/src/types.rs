//! Core types: the collected [`Record`] and the result [`SortOrder`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Title used when a result entry has no heading anchor.
pub const NO_TITLE: &str = "No title";

/// One collected publication candidate.
///
/// Numeric fields use `None` for "unknown" and are never negative.
/// Records are produced by the collector and treated as read-only
/// afterwards; ranking attaches scores alongside rather than inside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Title text, or [`NO_TITLE`] when absent.
    pub title: String,
    /// Raw `href` of the title anchor.
    pub primary_link: Option<String>,
    /// Absolute URL, with root-relative results links made absolute.
    pub source_link: Option<String>,
    /// Direct document (usually PDF) link, if the entry offers one.
    pub document_link: Option<String>,
    /// Result snippet, possibly empty.
    pub snippet: String,
    /// The authors / venue / year line, possibly empty.
    pub authors_and_year_text: String,
    /// "Cited by" count.
    pub citation_count: Option<u64>,
    /// Four-digit year found in the authors line.
    pub publication_year: Option<i32>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            title: NO_TITLE.to_string(),
            primary_link: None,
            source_link: None,
            document_link: None,
            snippet: String::new(),
            authors_and_year_text: String::new(),
            citation_count: None,
            publication_year: None,
        }
    }
}

impl Record {
    /// Create a record with only a title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Whether the title is a real one rather than the [`NO_TITLE`] sentinel.
    pub fn has_title(&self) -> bool {
        !self.title.is_empty() && self.title != NO_TITLE
    }

    /// The most useful link for a reader: document, then source, then primary.
    pub fn best_link(&self) -> Option<&str> {
        self.document_link
            .as_deref()
            .or(self.source_link.as_deref())
            .or(self.primary_link.as_deref())
    }
}

/// Result ordering requested from the results source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Source's own relevance ordering.
    #[default]
    Relevance,
    /// Newest first.
    Date,
}

impl SortOrder {
    /// Value of the `scisbd` query parameter.
    pub fn query_value(&self) -> &'static str {
        match self {
            Self::Relevance => "0",
            Self::Date => "1",
        }
    }

    /// Lowercase name used in config files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(Self::Relevance),
            "date" => Ok(Self::Date),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}
