//! Index building and retrieval over fetched web pages

use super::document::Document;
use super::embeddings::{EmbeddingFactory, EmbeddingService};
use super::loader::{LoadedPage, PageLoader};
use super::splitter::TextSplitter;
use super::store::VectorStore;
use super::Rag;
use crate::config::RagSettings;
use crate::network::HttpClient;
use anyhow::{bail, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Builds a vector store from web pages and queries it
pub struct WebRag {
    loader: PageLoader,
    splitter: TextSplitter,
    embedder: Arc<dyn EmbeddingService>,
    settings: RagSettings,
}

impl WebRag {
    /// Create from settings, choosing the embedder they name
    pub fn from_settings(settings: &RagSettings, client: HttpClient) -> Result<Self> {
        let embedder = EmbeddingFactory::create(&settings.embedding, client.clone())?;
        Ok(Self::new(settings.clone(), client, embedder))
    }

    pub fn new(
        settings: RagSettings,
        client: HttpClient,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Self {
        let loader = PageLoader::new(
            client,
            Duration::from_secs_f64(settings.fetch_timeout),
            settings.max_page_bytes,
        );
        let splitter = TextSplitter::new(settings.chunk_size, settings.chunk_overlap);
        Self {
            loader,
            splitter,
            embedder,
            settings,
        }
    }

    /// Fetch pages concurrently; results come back in URL order
    async fn load_pages(&self, urls: &[String]) -> Vec<LoadedPage> {
        let loader = &self.loader;
        let outcomes: Vec<(String, Result<LoadedPage>)> = stream::iter(urls.iter().cloned())
            .map(|url| async move {
                let outcome = loader.load(&url).await;
                (url, outcome)
            })
            .buffered(self.settings.fetch_concurrency.max(1))
            .collect()
            .await;

        outcomes
            .into_iter()
            .filter_map(|(url, outcome)| match outcome {
                Ok(page) => Some(page),
                Err(e) => {
                    warn!("Skipping {}: {:#}", url, e);
                    None
                }
            })
            .collect()
    }

    fn split_pages(&self, pages: &[LoadedPage]) -> Vec<Document> {
        pages
            .iter()
            .flat_map(|page| {
                self.splitter
                    .split_text(&page.text)
                    .into_iter()
                    .enumerate()
                    .map(|(i, chunk)| {
                        Document::new(chunk)
                            .with_source(page.url.clone())
                            .with_title(page.title.clone())
                            .with_chunk_index(i)
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[async_trait]
impl Rag for WebRag {
    async fn create_rag(&self, urls: &[String]) -> Result<VectorStore> {
        let start = Instant::now();
        let urls = &urls[..urls.len().min(self.settings.max_urls)];

        let pages = self.load_pages(urls).await;
        if pages.is_empty() {
            bail!("no content could be loaded from {} URLs", urls.len());
        }

        let documents = self.split_pages(&pages);
        debug!(
            "Split {} pages into {} chunks",
            pages.len(),
            documents.len()
        );

        let texts: Vec<String> = documents.iter().map(|d| d.page_content.clone()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.settings.embedding.batch_size.max(1)) {
            embeddings.extend(self.embedder.embed_documents(batch).await?);
        }

        let mut store = VectorStore::with_dimension(self.embedder.dimension());
        store.add_documents(documents, embeddings)?;

        info!(
            "Indexed {} chunks from {}/{} pages in {:?}",
            store.len(),
            pages.len(),
            urls.len(),
            start.elapsed()
        );
        Ok(store)
    }

    async fn search_rag(&self, query: &str, store: &VectorStore) -> Result<Vec<Document>> {
        if store.is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = self.embedder.embed_query(query).await?;
        store.similarity_search(&query_vector, self.settings.top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embeddings::HashingEmbeddings;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn web_rag(settings: RagSettings) -> WebRag {
        WebRag::new(
            settings,
            HttpClient::new().unwrap(),
            Arc::new(HashingEmbeddings::new(256)),
        )
    }

    async fn mount_page(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_create_and_search() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "/borrow",
            "<html><head><title>Borrowing</title></head><body><nav>Site menu</nav><p>The borrow checker validates references.</p><script>trackVisit();</script></body></html>",
        )
        .await;
        mount_page(
            &server,
            "/cake",
            "<html><body><p>Mix flour, sugar and eggs for the cake.</p></body></html>",
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let urls = vec![
            format!("{}/cake", server.uri()),
            format!("{}/broken", server.uri()),
            format!("{}/borrow", server.uri()),
        ];
        let rag = web_rag(RagSettings::default());

        let store = rag.create_rag(&urls).await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.sources(), vec![urls[0].as_str(), urls[2].as_str()]);

        let results = rag.search_rag("borrow checker", &store).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].metadata.source, urls[2]);
        assert_eq!(results[0].metadata.title.as_deref(), Some("Borrowing"));
        assert!(results[0].page_content.contains("borrow checker"));
        for document in &results {
            assert!(!document.page_content.contains("trackVisit"));
            assert!(!document.page_content.contains("Site menu"));
            assert!(!document.page_content.contains('<'));
        }
    }

    #[tokio::test]
    async fn test_create_fails_when_nothing_loads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let rag = web_rag(RagSettings::default());
        let err = rag
            .create_rag(&[format!("{}/gone", server.uri())])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no content could be loaded"));
    }

    #[tokio::test]
    async fn test_max_urls_and_top_k() {
        let server = MockServer::start().await;
        for i in 0..3 {
            mount_page(
                &server,
                &format!("/page{}", i),
                &format!("<html><body><p>page number {} about rust</p></body></html>", i),
            )
            .await;
        }
        let urls: Vec<String> = (0..3).map(|i| format!("{}/page{}", server.uri(), i)).collect();

        let settings = RagSettings {
            max_urls: 2,
            top_k: 1,
            ..Default::default()
        };
        let rag = web_rag(settings);

        let store = rag.create_rag(&urls).await.unwrap();
        assert_eq!(store.len(), 2);

        let results = rag.search_rag("rust", &store).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_search_empty_store() {
        let rag = web_rag(RagSettings::default());
        assert!(rag
            .search_rag("anything", &VectorStore::new())
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_split_pages_sets_metadata() {
        let settings = RagSettings {
            chunk_size: 20,
            chunk_overlap: 0,
            ..Default::default()
        };
        let rag = web_rag(settings);
        let pages = vec![LoadedPage {
            url: "https://a.example".to_string(),
            title: Some("A".to_string()),
            text: "first paragraph\n\nsecond paragraph".to_string(),
        }];

        let documents = rag.split_pages(&pages);
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[1].metadata.chunk_index, 1);
        assert_eq!(documents[1].metadata.source, "https://a.example");
        assert_eq!(documents[1].page_content, "second paragraph");
    }
}
