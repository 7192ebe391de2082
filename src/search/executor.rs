//! Engine-backed web search

use super::WebSearch;
use crate::config::SearchSettings;
use crate::engines::{Engine, RequestParams};
use crate::network::HttpClient;
use crate::results::{FormattedResults, RawResultRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info};

/// Search executor that runs a query against a single engine
pub struct Search {
    /// HTTP client for making requests
    client: HttpClient,
    /// The engine used for every query
    engine: Arc<dyn Engine>,
    /// Search settings (result limit, language, safe search)
    settings: SearchSettings,
}

impl Search {
    /// Create a new search executor
    pub fn new(client: HttpClient, engine: Arc<dyn Engine>, settings: SearchSettings) -> Self {
        Self {
            client,
            engine,
            settings,
        }
    }

    /// Name of the engine behind this executor
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    fn timeout(&self) -> Duration {
        let secs = if self.settings.timeout > 0.0 {
            self.settings.timeout
        } else {
            self.engine.timeout()
        };
        self.client.effective_timeout(Duration::from_secs_f64(secs))
    }

    /// Run the query and return the raw records, truncated to the configured limit
    pub async fn execute(&self, query: &str) -> Result<Vec<RawResultRecord>> {
        let engine_name = self.engine_name().to_string();
        let params = RequestParams::from_settings(query, &self.settings);
        let request = self
            .engine
            .request(&params)
            .with_context(|| format!("failed to build request for {}", engine_name))?;

        let engine_timeout = self.timeout();
        debug!(
            "Searching engine {} with timeout {:?}",
            engine_name, engine_timeout
        );

        let start = Instant::now();
        let response = timeout(
            engine_timeout,
            self.client.execute_with_timeout(request, engine_timeout),
        )
        .await
        .map_err(|_| anyhow::anyhow!("search engine {} timed out", engine_name))??;

        let mut results = self
            .engine
            .response(response)
            .with_context(|| format!("search engine {} failed", engine_name))?;
        results.truncate(self.settings.max_results);

        info!(
            "Engine {} returned {} results in {:?}",
            engine_name,
            results.len(),
            start.elapsed()
        );

        Ok(results)
    }
}

#[async_trait]
impl WebSearch for Search {
    async fn search_web(&self, query: &str) -> Result<(FormattedResults, Vec<RawResultRecord>)> {
        let records = self.execute(query).await?;
        Ok((FormattedResults::from_records(&records), records))
    }
}
