//! HTTP client for engine requests and page fetches

use super::user_agent::{accept_html, accept_language, generate_user_agent};
use crate::config::OutgoingSettings;
use crate::engines::{EngineRequest, EngineResponse, HttpMethod, RequestBody};
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP client wrapper shared by the search and index stages
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    max_timeout: Option<Duration>,
    user_agent: String,
    accept_language: String,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs_f64(settings.request_timeout))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            client,
            default_timeout: Duration::from_secs_f64(settings.request_timeout),
            max_timeout: settings.max_request_timeout.map(Duration::from_secs_f64),
            user_agent: generate_user_agent(),
            accept_language: accept_language("en"),
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// Send `Accept-Language` for the given search language
    pub fn with_language(mut self, lang: &str) -> Self {
        self.accept_language = accept_language(lang);
        self
    }

    /// Clamp a requested timeout to the configured maximum
    pub fn effective_timeout(&self, requested: Duration) -> Duration {
        match self.max_timeout {
            Some(max) => requested.min(max),
            None => requested,
        }
    }

    /// Execute an engine request
    pub async fn execute(&self, request: EngineRequest) -> Result<EngineResponse> {
        self.execute_with_timeout(request, self.default_timeout).await
    }

    /// Execute an engine request with custom timeout
    pub async fn execute_with_timeout(
        &self,
        request: EngineRequest,
        timeout: Duration,
    ) -> Result<EngineResponse> {
        let response = self.send(request, timeout).await?;
        Self::parse_response(response, None).await
    }

    /// GET a URL, reading at most `max_bytes` of the body
    ///
    /// Reading stops once the limit is reached; the rest of the body is never
    /// downloaded.
    pub async fn get_capped(
        &self,
        url: &str,
        timeout: Duration,
        max_bytes: usize,
    ) -> Result<EngineResponse> {
        let response = self.send(EngineRequest::get(url), timeout).await?;
        Self::parse_response(response, Some(max_bytes)).await
    }

    /// POST with JSON body and extra headers
    pub async fn post_json(
        &self,
        url: &str,
        json: serde_json::Value,
        headers: HashMap<String, String>,
    ) -> Result<EngineResponse> {
        let mut request = EngineRequest::post(url).json(json);
        request.headers = headers;
        self.execute(request).await
    }

    async fn send(&self, request: EngineRequest, timeout: Duration) -> Result<Response> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder.timeout(self.effective_timeout(timeout));

        // Defaults first, then settings, then the request's own headers
        let mut headers: HashMap<String, String> = HashMap::new();
        headers.insert("User-Agent".to_string(), self.user_agent.clone());
        headers.insert("Accept".to_string(), accept_html().to_string());
        headers.insert("Accept-Language".to_string(), self.accept_language.clone());
        headers.insert("DNT".to_string(), "1".to_string());
        headers.extend(self.extra_headers.clone());
        headers.extend(request.headers);

        for (key, value) in &headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(body) = request.data {
            req_builder = match body {
                RequestBody::Form(data) => req_builder.form(&data),
                RequestBody::Json(json) => req_builder.json(&json),
            };
        }

        req_builder
            .send()
            .await
            .with_context(|| format!("request to {} failed", request.url))
    }

    /// Parse response into EngineResponse, optionally capping the body size
    async fn parse_response(mut response: Response, limit: Option<usize>) -> Result<EngineResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.as_str().to_lowercase(), v.to_string());
            }
        }

        let text = match limit {
            None => response.text().await?,
            Some(limit) => {
                let mut body = Vec::new();
                while let Some(chunk) = response.chunk().await? {
                    let room = limit - body.len();
                    if chunk.len() >= room {
                        body.extend_from_slice(&chunk[..room]);
                        break;
                    }
                    body.extend_from_slice(&chunk);
                }
                decode_truncated(body)
            }
        };

        Ok(EngineResponse {
            status,
            headers,
            text,
            url,
        })
    }
}

/// Decode a body that may have been cut in the middle of a character
fn decode_truncated(mut body: Vec<u8>) -> String {
    if let Err(e) = std::str::from_utf8(&body) {
        if e.error_len().is_none() {
            body.truncate(e.valid_up_to());
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
