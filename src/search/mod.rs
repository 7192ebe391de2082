//! Web search stage
//!
//! The pipeline talks to search through the [`WebSearch`] trait; [`Search`]
//! is the engine-backed implementation.

mod executor;

pub use executor::Search;

use crate::results::{FormattedResults, RawResultRecord};
use async_trait::async_trait;

/// Capability to search the web for a query
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Return a human-readable summary plus the raw records behind it
    async fn search_web(&self, query: &str)
        -> anyhow::Result<(FormattedResults, Vec<RawResultRecord>)>;
}
