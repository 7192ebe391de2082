//! Settings structures for RagSearch-RS configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Main settings structure, deserialized from settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub search: SearchSettings,
    pub rag: RagSettings,
    pub ui: UiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            server: ServerSettings::default(),
            outgoing: OutgoingSettings::default(),
            search: SearchSettings::default(),
            rag: RagSettings::default(),
            ui: UiSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (RAGSEARCH_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("RAGSEARCH_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("RAGSEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("RAGSEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("RAGSEARCH_ENGINE") {
            self.search.engine = val;
        }

        // Dedicated variables win over the conventional provider ones
        if let Some(key) = var("RAGSEARCH_SEARCH_API_KEY").or_else(|| var("BRAVE_API_KEY")) {
            if !key.trim().is_empty() {
                self.search.api_key = Some(key);
            }
        }
        if let Some(key) = var("RAGSEARCH_EMBEDDING_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            if !key.trim().is_empty() {
                self.rag.embedding.api_key = Some(key);
            }
        }
        if let Some(val) = var("RAGSEARCH_EMBEDDING_MODEL") {
            self.rag.embedding.model = val;
        }
    }

    /// Reject combinations that would make a pipeline run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.search.max_results == 0 {
            bail!("search.max_results must be greater than zero");
        }
        if self.rag.chunk_size == 0 {
            bail!("rag.chunk_size must be greater than zero");
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            bail!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap,
                self.rag.chunk_size
            );
        }
        if self.rag.top_k == 0 {
            bail!("rag.top_k must be greater than zero");
        }
        if self.rag.fetch_concurrency == 0 {
            bail!("rag.fetch_concurrency must be greater than zero");
        }
        if self.rag.embedding.dimension == 0 {
            bail!("rag.embedding.dimension must be greater than zero");
        }
        Ok(())
    }

    /// Credential used by search engines that require one
    pub fn search_api_key(&self) -> Option<&str> {
        self.search.api_key.as_deref()
    }

    /// Credential used by remote embedding providers
    pub fn embedding_api_key(&self) -> Option<&str> {
        self.rag.embedding.api_key.as_deref()
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name displayed in UI
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "RagSearch".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Maximum request timeout
    pub max_request_timeout: Option<f64>,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            max_request_timeout: Some(30.0),
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Web search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Engine module to use (duckduckgo, brave)
    pub engine: String,
    /// API key for engines backed by a paid API
    pub api_key: Option<String>,
    /// Maximum number of results kept from the engine
    pub max_results: usize,
    /// Search timeout in seconds
    pub timeout: f64,
    /// Language code passed to the engine
    pub lang: String,
    /// Safe search level: 0 = off, 1 = moderate, 2 = strict
    pub safesearch: u8,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            engine: "duckduckgo".to_string(),
            api_key: None,
            max_results: 10,
            timeout: 8.0,
            lang: "en".to_string(),
            safesearch: 1,
        }
    }
}

/// Index building and retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Maximum number of URLs fetched per run
    pub max_urls: usize,
    /// Pages fetched in parallel
    pub fetch_concurrency: usize,
    /// Per-page fetch timeout in seconds
    pub fetch_timeout: f64,
    /// Only the first this-many bytes of a page are downloaded and parsed
    pub max_page_bytes: usize,
    /// Characters per chunk
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,
    /// Number of documents returned by retrieval
    pub top_k: usize,
    pub embedding: EmbeddingSettings,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            max_urls: 10,
            fetch_concurrency: 4,
            fetch_timeout: 10.0,
            max_page_bytes: 2 * 1024 * 1024,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            embedding: EmbeddingSettings::default(),
        }
    }
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// OpenAI when a key is configured, hashing otherwise
    #[default]
    Auto,
    /// OpenAI-compatible `/embeddings` endpoint
    OpenAi,
    /// Local feature-hashing embedder
    Hashing,
}

/// Embedding backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub api_key: Option<String>,
    /// Model name sent to the remote provider
    pub model: String,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Vector size of the hashing embedder
    pub dimension: usize,
    /// Texts per embedding request
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Auto,
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            dimension: 384,
            batch_size: 64,
        }
    }
}

/// UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Page heading
    pub title: String,
    /// Line shown under the heading
    pub subtitle: String,
    /// Sidebar "About" panel
    pub about: String,
    /// Sidebar "Tips" panel, one entry per line
    pub tips: Vec<String>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            title: "Web Search & RAG".to_string(),
            subtitle: "Enter a query to search the web and get enhanced results with RAG"
                .to_string(),
            about: "This app combines web search with Retrieval Augmented Generation (RAG) \
                    to provide enhanced search results based on your query."
                .to_string(),
            tips: vec![
                "For best results, use specific queries".to_string(),
                "The system processes multiple URLs, so it may take a moment".to_string(),
                "Click on the expanders to view detailed RAG results".to_string(),
            ],
        }
    }
}
