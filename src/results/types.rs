//! Result type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single record returned by a search engine
///
/// Engines do not guarantee a URL for every record, so `url` is optional and
/// must be checked per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResultRecord {
    /// Title of the result
    pub title: String,
    /// The URL of the result, when the engine supplied one
    pub url: Option<String>,
    /// Content snippet/description
    pub content: Option<String>,
    /// Engine that returned this result
    pub engine: String,
    /// 1-based position in the engine's result list
    pub position: u32,
}

impl RawResultRecord {
    /// Create a new record with a URL
    pub fn new(url: impl Into<String>, title: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: Some(url.into()),
            content: None,
            engine: engine.into(),
            position: 0,
        }
    }

    /// Create a record that carries no URL
    pub fn without_url(title: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            content: None,
            engine: engine.into(),
            position: 0,
        }
    }

    /// Add content to the record
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the position
    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    /// The URL if present and not blank
    pub fn usable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// Human-readable rendering of a result list, produced by the search stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormattedResults(String);

impl FormattedResults {
    /// Render records as numbered text blocks separated by blank lines
    pub fn from_records(records: &[RawResultRecord]) -> Self {
        let blocks: Vec<String> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let mut block = format!("{}. {}", i + 1, record.title.trim());
                if let Some(url) = record.usable_url() {
                    block.push_str(&format!("\n   URL: {}", url));
                }
                if let Some(content) = record.content.as_deref().map(str::trim) {
                    if !content.is_empty() {
                        block.push_str(&format!("\n   {}", content));
                    }
                }
                block
            })
            .collect();

        Self(blocks.join("\n\n"))
    }

    /// Wrap already formatted text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FormattedResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
