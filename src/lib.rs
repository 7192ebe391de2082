//! RagSearch-RS: web search with retrieval-augmented results
//!
//! A query is sent to a web search engine, the URLs in the results are
//! fetched and indexed into an in-memory vector store, and the passages most
//! relevant to the query are returned alongside the search results.

pub mod config;
pub mod engines;
pub mod network;
pub mod pipeline;
pub mod rag;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use engines::Engine;
pub use pipeline::{Pipeline, PipelineError, PipelineOutput};
pub use results::{FormattedResults, RawResultRecord};
pub use search::{Search, WebSearch};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
