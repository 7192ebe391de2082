//! HTTP request handlers

use super::state::AppState;
use super::templates::{ErrorView, Templates};
use crate::pipeline::{
    CancelGuard, CancelHandle, CancelToken, ChannelReporter, PipelineError, PipelineOutput,
    ProgressEvent, TracingReporter,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Redirect, Response,
    },
    Json,
};
use futures::stream;
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query
    pub q: Option<String>,
    /// Output format
    pub format: Option<String>,
}

impl SearchParams {
    /// The trimmed query, if one was given
    fn query(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
    }
}

/// HTTP status for a failed run in the JSON format
fn error_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::EmptyQuery => StatusCode::BAD_REQUEST,
        PipelineError::EmptySearchResult | PipelineError::NoExtractableUrls => StatusCode::NOT_FOUND,
        PipelineError::Collaborator { .. } => StatusCode::BAD_GATEWAY,
        PipelineError::Cancelled => StatusCode::REQUEST_TIMEOUT,
    }
}

fn page_context(state: &AppState, query: &str, live: bool) -> Context {
    let mut ctx = Context::new();
    ctx.insert("instance_name", state.instance_name());
    ctx.insert("ui", state.ui());
    ctx.insert("query", query);
    ctx.insert("live", &live);
    ctx.insert("output", &Option::<PipelineOutput>::None);
    ctx.insert("error", &Option::<ErrorView>::None);
    ctx
}

fn render_page(state: &AppState, ctx: &Context) -> Response {
    match state.templates.render("index.html", ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Home page handler
///
/// With `q` set, the page starts streaming a run for it on load.
pub async fn index(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.query().unwrap_or_default();
    render_page(&state, &page_context(&state, &query, true))
}

/// Search handler; runs the pipeline to completion before responding
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let query = match params.query() {
        Some(q) => q,
        None => return Redirect::to("/").into_response(),
    };

    let result = state
        .pipeline
        .run(&query, &TracingReporter, CancelToken::none())
        .await;

    match params.format.as_deref() {
        Some("json") => match result {
            Ok(output) => Json(output).into_response(),
            Err(e) => (
                error_status(&e),
                Json(serde_json::json!({
                    "error": e.to_string(),
                    "detail": e.detail(),
                })),
            )
                .into_response(),
        },
        _ => {
            let mut ctx = page_context(&state, &query, false);
            match &result {
                Ok(output) => ctx.insert("output", output),
                Err(e) => ctx.insert("error", &ErrorView::from(e)),
            }
            render_page(&state, &ctx)
        }
    }
}

/// A running pipeline seen as a sequence of server-sent events
struct RunStream {
    events: UnboundedReceiver<ProgressEvent>,
    run: Option<JoinHandle<Result<PipelineOutput, PipelineError>>>,
    templates: Arc<Templates>,
    // Cancels the run when the client goes away
    _guard: CancelGuard,
}

impl RunStream {
    async fn next_event(&mut self) -> Option<Result<Event, axum::Error>> {
        loop {
            match self.events.recv().await {
                // the terminal event is built from the run's result
                Some(event) if event.is_terminal() => continue,
                Some(event) => return Some(Event::default().event("progress").json_data(&event)),
                None => {
                    let run = self.run.take()?;
                    return Some(Ok(self.finish(run.await)));
                }
            }
        }
    }

    fn finish(
        &self,
        joined: Result<Result<PipelineOutput, PipelineError>, tokio::task::JoinError>,
    ) -> Event {
        let rendered = match joined {
            Ok(Ok(output)) => self
                .templates
                .render_results(&output)
                .map(|html| ("done", html)),
            Ok(Err(e)) => self.templates.render_error(&e).map(|html| ("failed", html)),
            Err(e) => {
                tracing::error!("Pipeline task failed: {}", e);
                Ok((
                    "failed",
                    "<div class=\"error\" role=\"alert\"><p class=\"message\">Internal error</p></div>"
                        .to_string(),
                ))
            }
        };

        match rendered {
            Ok((name, html)) => Event::default().event(name).data(html.replace('\r', "")),
            Err(e) => {
                tracing::error!("Template error: {}", e);
                Event::default().event("failed").data("Template error")
            }
        }
    }
}

/// Stream a run's progress, then its rendered results or error
pub async fn stream(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = match params.query() {
        Some(q) => q,
        None => return (StatusCode::BAD_REQUEST, "Missing query").into_response(),
    };

    let (reporter, events) = ChannelReporter::channel();
    let handle = CancelHandle::new();
    let token = handle.token();
    let pipeline = state.pipeline.clone();
    let run = tokio::spawn(async move { pipeline.run(&query, &reporter, token).await });

    let run_stream = RunStream {
        events,
        run: Some(run),
        templates: state.templates.clone(),
        _guard: handle.drop_guard(),
    };
    let events = stream::unfold(run_stream, |mut s| async move {
        let event = s.next_event().await?;
        Some((event, s))
    });

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
