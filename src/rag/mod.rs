//! Retrieval index over web pages
//!
//! Pages are fetched, reduced to text, split into overlapping chunks,
//! embedded, and kept in an in-memory [`VectorStore`] for the duration of a
//! single pipeline run.

mod document;
mod embeddings;
mod loader;
mod splitter;
mod store;
mod web_rag;

pub use document::{Document, DocumentMetadata};
pub use embeddings::{EmbeddingFactory, EmbeddingService, HashingEmbeddings, OpenAiEmbeddings};
pub use loader::{html_to_text, LoadedPage, PageLoader};
pub use splitter::TextSplitter;
pub use store::{cosine_similarity, VectorStore};
pub use web_rag::WebRag;

use async_trait::async_trait;

/// Capability to index a set of URLs and query the resulting index
#[async_trait]
pub trait Rag: Send + Sync {
    /// Fetch and index the given URLs
    async fn create_rag(&self, urls: &[String]) -> anyhow::Result<VectorStore>;

    /// Return the documents most relevant to the query, best first
    async fn search_rag(&self, query: &str, store: &VectorStore) -> anyhow::Result<Vec<Document>>;
}
