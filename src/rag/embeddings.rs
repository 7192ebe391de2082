//! Embedding services

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::network::HttpClient;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Turns text into vectors
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed a batch of texts, one vector per input in input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedding service returned no vector"))
    }

    /// Length of the vectors produced, when known before the first call
    fn dimension(&self) -> Option<usize>;

    fn model_name(&self) -> &str;
}

/// OpenAI-compatible `/embeddings` endpoint
pub struct OpenAiEmbeddings {
    client: HttpClient,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbeddings {
    pub fn new(
        client: HttpClient,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::to_value(EmbeddingRequest {
            model: &self.model,
            input: texts,
        })?;
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {}", self.api_key));
        headers.insert("Accept".to_string(), "application/json".to_string());

        let response = self
            .client
            .post_json(&url, body, headers)
            .await
            .context("embedding request failed")?;

        if !response.is_success() {
            let detail: String = response.text.chars().take(300).collect();
            bail!(
                "embedding API returned HTTP {}: {}",
                response.status,
                detail
            );
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .context("malformed embedding response")?;
        if parsed.data.len() != texts.len() {
            bail!(
                "embedding API returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            );
        }
        parsed.data.sort_by_key(|d| d.index);

        debug!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Decided by the remote model
    fn dimension(&self) -> Option<usize> {
        None
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Local feature-hashing embedder
///
/// Each lower-cased alphanumeric token is hashed into one of `dimension`
/// buckets with a hash-derived sign; the result is L2-normalized. Texts that
/// share words end up close, which is enough for keyword-style retrieval
/// without a remote model.
pub struct HashingEmbeddings {
    dimension: usize,
}

impl HashingEmbeddings {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = md5::compute(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingService for HashingEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    fn model_name(&self) -> &str {
        "feature-hashing"
    }
}

/// Builds the embedding service selected by the settings
pub struct EmbeddingFactory;

impl EmbeddingFactory {
    pub fn create(
        settings: &EmbeddingSettings,
        client: HttpClient,
    ) -> Result<Arc<dyn EmbeddingService>> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty());

        let service: Arc<dyn EmbeddingService> = match (settings.provider, api_key) {
            (EmbeddingProvider::OpenAi, None) => {
                bail!("embedding provider open_ai requires rag.embedding.api_key")
            }
            (EmbeddingProvider::OpenAi, Some(key)) | (EmbeddingProvider::Auto, Some(key)) => {
                Arc::new(OpenAiEmbeddings::new(
                    client,
                    settings.base_url.clone(),
                    key,
                    settings.model.clone(),
                ))
            }
            (EmbeddingProvider::Auto, None) | (EmbeddingProvider::Hashing, _) => {
                Arc::new(HashingEmbeddings::new(settings.dimension))
            }
        };

        info!("Using embedding model: {}", service.model_name());
        Ok(service)
    }
}
