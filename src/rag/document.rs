//! Document fragments stored in and returned from the vector store

use serde::{Deserialize, Serialize};

/// A chunk of page text plus where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The chunk text
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

/// Provenance and ranking information for a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// URL of the page the chunk was cut from
    pub source: String,
    /// Page title, when the page had one
    pub title: Option<String>,
    /// 0-based chunk number within the page
    pub chunk_index: usize,
    /// Cosine similarity to the query; set by retrieval
    pub score: Option<f32>,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: DocumentMetadata::default(),
        }
    }

    /// Set the source URL
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.source = source.into();
        self
    }

    /// Set the page title
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.metadata.title = title;
        self
    }

    /// Set the chunk index
    pub fn with_chunk_index(mut self, index: usize) -> Self {
        self.metadata.chunk_index = index;
        self
    }
}
