//! The search-then-retrieve pipeline

use super::cancel::CancelToken;
use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};
use super::stage::PipelineStage;
use crate::config::Settings;
use crate::engines::EngineLoader;
use crate::network::HttpClient;
use crate::rag::{Document, Rag, WebRag};
use crate::results::{extract_urls, FormattedResults};
use crate::search::{Search, WebSearch};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Wall time spent in one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub time_ms: u64,
}

impl StageTiming {
    fn since(stage: PipelineStage, start: Instant) -> Self {
        Self {
            stage,
            time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Everything a successful run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub run_id: Uuid,
    pub query: String,
    pub formatted_results: FormattedResults,
    pub urls: Vec<String>,
    /// Retrieved passages, most relevant first
    pub documents: Vec<Document>,
    pub timings: Vec<StageTiming>,
    pub completed_at: DateTime<Utc>,
}

/// Runs a query through search, URL extraction, indexing and retrieval
pub struct Pipeline {
    search: Arc<dyn WebSearch>,
    rag: Arc<dyn Rag>,
}

impl Pipeline {
    pub fn new(search: Arc<dyn WebSearch>, rag: Arc<dyn Rag>) -> Self {
        Self { search, rag }
    }

    /// Build the configured engine-backed search and web index
    pub fn from_settings(settings: &Settings, client: HttpClient) -> anyhow::Result<Self> {
        let client = client.with_language(&settings.search.lang);
        let engine = EngineLoader::load(&settings.search).context("failed to load search engine")?;
        let search = Search::new(client.clone(), engine, settings.search.clone());
        info!("Using search engine: {}", search.engine_name());

        let rag = WebRag::from_settings(&settings.rag, client)
            .context("failed to set up retrieval")?;
        Ok(Self::new(Arc::new(search), Arc::new(rag)))
    }

    /// Run the pipeline once
    ///
    /// Exactly one terminal event (`Done` or `Failed`) is reported, after
    /// all stage events.
    pub async fn run(
        &self,
        query: &str,
        reporter: &dyn ProgressReporter,
        cancel: CancelToken,
    ) -> Result<PipelineOutput, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", run_id = %run_id, query = %query.trim());

        let result = self
            .run_stages(run_id, query, reporter, &cancel)
            .instrument(span)
            .await;

        match &result {
            Ok(_) => reporter.report(ProgressEvent::Done),
            Err(e) => {
                match e.stage() {
                    Some(stage) => info!("Run stopped at {}: {}", stage, e),
                    None => info!("Run stopped: {}", e),
                }
                reporter.report(ProgressEvent::Failed {
                    message: e.to_string(),
                    detail: e.detail(),
                })
            }
        }
        result
    }

    async fn run_stages(
        &self,
        run_id: Uuid,
        query: &str,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<PipelineOutput, PipelineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::EmptyQuery);
        }
        info!("Starting run");
        let mut timings = Vec::with_capacity(3);

        enter(reporter, cancel, PipelineStage::Searching, "Searching the web...")?;
        let start = Instant::now();
        let (formatted_results, records) =
            guarded(cancel, PipelineStage::Searching, self.search.search_web(query)).await?;
        timings.push(StageTiming::since(PipelineStage::Searching, start));
        if records.is_empty() {
            return Err(PipelineError::EmptySearchResult);
        }

        enter(reporter, cancel, PipelineStage::ExtractingUrls, "Extracting URLs...")?;
        let urls = extract_urls(&records);
        debug!("Extracted {} URLs from {} records", urls.len(), records.len());
        if urls.is_empty() {
            return Err(PipelineError::NoExtractableUrls);
        }

        enter(
            reporter,
            cancel,
            PipelineStage::BuildingIndex,
            format!("Processing {} URLs for RAG...", urls.len()),
        )?;
        let start = Instant::now();
        let store = guarded(cancel, PipelineStage::BuildingIndex, self.rag.create_rag(&urls)).await?;
        timings.push(StageTiming::since(PipelineStage::BuildingIndex, start));

        enter(
            reporter,
            cancel,
            PipelineStage::Retrieving,
            "Retrieving enhanced results...",
        )?;
        let start = Instant::now();
        let documents = guarded(
            cancel,
            PipelineStage::Retrieving,
            self.rag.search_rag(query, &store),
        )
        .await?;
        timings.push(StageTiming::since(PipelineStage::Retrieving, start));
        drop(store);

        enter(reporter, cancel, PipelineStage::Presenting, "Done")?;
        info!(
            "Run finished with {} URLs and {} passages",
            urls.len(),
            documents.len()
        );

        Ok(PipelineOutput {
            run_id,
            query: query.to_string(),
            formatted_results,
            urls,
            documents,
            timings,
            completed_at: Utc::now(),
        })
    }
}

/// Report entering a stage, unless the run has been cancelled
fn enter(
    reporter: &dyn ProgressReporter,
    cancel: &CancelToken,
    stage: PipelineStage,
    status: impl Into<String>,
) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    reporter.report(ProgressEvent::stage(stage, status));
    Ok(())
}

/// Await a collaborator call, giving up as soon as cancellation is requested
async fn guarded<T, F>(cancel: &CancelToken, stage: PipelineStage, call: F) -> Result<T, PipelineError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        result = call => result.map_err(|e| PipelineError::collaborator(stage, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cancel::CancelHandle;
    use crate::pipeline::progress::NoopReporter;
    use crate::rag::VectorStore;
    use crate::results::RawResultRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressReporter for Recorder {
        fn report(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct FakeSearch {
        records: Vec<RawResultRecord>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeSearch {
        fn returning(records: Vec<RawResultRecord>) -> Self {
            Self {
                records,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl WebSearch for FakeSearch {
        async fn search_web(
            &self,
            _query: &str,
        ) -> anyhow::Result<(FormattedResults, Vec<RawResultRecord>)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("search backend unreachable");
            }
            Ok((
                FormattedResults::from_records(&self.records),
                self.records.clone(),
            ))
        }
    }

    #[derive(Default)]
    struct FakeRag {
        documents: Vec<Document>,
        fail_create: bool,
        fail_search: bool,
        slow_create: bool,
        create_calls: AtomicUsize,
        search_calls: AtomicUsize,
        seen_urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Rag for FakeRag {
        async fn create_rag(&self, urls: &[String]) -> anyhow::Result<VectorStore> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_urls.lock().unwrap() = urls.to_vec();
            if self.slow_create {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.fail_create {
                anyhow::bail!("no content could be loaded from {} URLs", urls.len());
            }
            Ok(VectorStore::new())
        }

        async fn search_rag(
            &self,
            _query: &str,
            _store: &VectorStore,
        ) -> anyhow::Result<Vec<Document>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_search {
                anyhow::bail!("embedding service returned 401");
            }
            Ok(self.documents.clone())
        }
    }

    fn records() -> Vec<RawResultRecord> {
        vec![
            RawResultRecord::new("https://a.example", "A", "fake"),
            RawResultRecord::without_url("No link", "fake"),
            RawResultRecord::new("https://b.example", "B", "fake"),
        ]
    }

    fn documents() -> Vec<Document> {
        vec![
            Document::new("first passage").with_source("https://a.example"),
            Document::new("second passage").with_source("https://b.example"),
        ]
    }

    fn pipeline(search: &Arc<FakeSearch>, rag: &Arc<FakeRag>) -> Pipeline {
        Pipeline::new(search.clone(), rag.clone())
    }

    #[tokio::test]
    async fn test_successful_run() {
        let search = Arc::new(FakeSearch::returning(records()));
        let rag = Arc::new(FakeRag {
            documents: documents(),
            ..Default::default()
        });
        let recorder = Recorder::default();

        let output = pipeline(&search, &rag)
            .run("  rust ownership ", &recorder, CancelToken::none())
            .await
            .unwrap();

        assert_eq!(output.query, "rust ownership");
        assert_eq!(output.urls, vec!["https://a.example", "https://b.example"]);
        assert_eq!(*rag.seen_urls.lock().unwrap(), output.urls);
        assert_eq!(output.documents, documents());
        assert!(output.formatted_results.as_str().contains("1. A"));
        let stages: Vec<_> = output.timings.iter().map(|t| t.stage).collect();
        assert_eq!(
            stages,
            vec![
                PipelineStage::Searching,
                PipelineStage::BuildingIndex,
                PipelineStage::Retrieving
            ]
        );

        let events = recorder.events();
        let progress: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Stage { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0.0, 0.3, 0.5, 0.8, 1.0]);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(events.last(), Some(&ProgressEvent::Done));
        assert!(events.contains(&ProgressEvent::stage(
            PipelineStage::BuildingIndex,
            "Processing 2 URLs for RAG..."
        )));
    }

    #[test]
    fn test_from_settings_builds_default_pipeline() {
        let settings = Settings::default();
        assert!(Pipeline::from_settings(&settings, HttpClient::new().unwrap()).is_ok());

        let mut brave_without_key = Settings::default();
        brave_without_key.search.engine = "brave".to_string();
        assert!(Pipeline::from_settings(&brave_without_key, HttpClient::new().unwrap()).is_err());
    }

    #[tokio::test]
    async fn test_empty_search_result_skips_index() {
        let search = Arc::new(FakeSearch::returning(Vec::new()));
        let rag = Arc::new(FakeRag::default());
        let recorder = Recorder::default();

        let err = pipeline(&search, &rag)
            .run("nothing", &recorder, CancelToken::none())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::EmptySearchResult));
        assert_eq!(rag.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            recorder.events().last(),
            Some(&ProgressEvent::Failed {
                message: "No search results found.".to_string(),
                detail: None,
            })
        );
    }

    #[tokio::test]
    async fn test_no_urls_skips_index() {
        let search = Arc::new(FakeSearch::returning(vec![
            RawResultRecord::without_url("Answer box", "fake"),
            RawResultRecord::new("  ", "Blank", "fake"),
        ]));
        let rag = Arc::new(FakeRag::default());

        let err = pipeline(&search, &rag)
            .run("q", &NoopReporter, CancelToken::none())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoExtractableUrls));
        assert_eq!(err.to_string(), "No valid URLs found in search results.");
        assert_eq!(rag.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_query_never_searches() {
        let search = Arc::new(FakeSearch::returning(records()));
        let rag = Arc::new(FakeRag::default());

        let err = pipeline(&search, &rag)
            .run("   ", &NoopReporter, CancelToken::none())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::EmptyQuery));
        assert_eq!(err.stage(), Some(PipelineStage::Idle));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_failure_is_collaborator_error() {
        let search = Arc::new(FakeSearch {
            fail: true,
            ..FakeSearch::returning(records())
        });
        let rag = Arc::new(FakeRag::default());

        let err = pipeline(&search, &rag)
            .run("q", &NoopReporter, CancelToken::none())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Searching));
        assert_eq!(err.to_string(), "Error: search backend unreachable");
    }

    #[tokio::test]
    async fn test_index_failure_reports_error_without_output() {
        let search = Arc::new(FakeSearch::returning(records()));
        let rag = Arc::new(FakeRag {
            fail_create: true,
            ..Default::default()
        });
        let recorder = Recorder::default();

        let err = pipeline(&search, &rag)
            .run("q", &recorder, CancelToken::none())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::BuildingIndex));
        assert_eq!(rag.search_calls.load(Ordering::SeqCst), 0);

        let events = recorder.events();
        assert!(!events.contains(&ProgressEvent::Done));
        match events.last() {
            Some(ProgressEvent::Failed { message, detail }) => {
                assert_eq!(message, "Error: no content could be loaded from 2 URLs");
                assert!(detail.is_some());
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retrieval_failure() {
        let search = Arc::new(FakeSearch::returning(records()));
        let rag = Arc::new(FakeRag {
            fail_search: true,
            ..Default::default()
        });

        let err = pipeline(&search, &rag)
            .run("q", &NoopReporter, CancelToken::none())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::Retrieving));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_success() {
        let search = Arc::new(FakeSearch::returning(records()));
        let rag = Arc::new(FakeRag::default());
        let recorder = Recorder::default();

        let output = pipeline(&search, &rag)
            .run("q", &recorder, CancelToken::none())
            .await
            .unwrap();

        assert!(output.documents.is_empty());
        assert_eq!(recorder.events().last(), Some(&ProgressEvent::Done));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let search = Arc::new(FakeSearch::returning(records()));
        let rag = Arc::new(FakeRag::default());
        let handle = CancelHandle::new();
        handle.cancel();

        let err = pipeline(&search, &rag)
            .run("q", &NoopReporter, handle.token())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
        assert_eq!(rag.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_during_index_build() {
        let search = Arc::new(FakeSearch::returning(records()));
        let rag = Arc::new(FakeRag {
            slow_create: true,
            ..Default::default()
        });
        let handle = CancelHandle::new();
        let pipeline = pipeline(&search, &rag);
        let recorder = Recorder::default();

        let canceller = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            pipeline.run("q", &recorder, handle.token()),
        )
        .await
        .expect("cancellation should end the run")
        .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled));
        assert_eq!(rag.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(rag.search_calls.load(Ordering::SeqCst), 0);
        assert!(matches!(
            recorder.events().last(),
            Some(ProgressEvent::Failed { .. })
        ));
    }
}
