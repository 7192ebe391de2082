//! Engine traits and types

use crate::config::SearchSettings;
use crate::results::RawResultRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for building a search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestParams {
    /// Search query string
    pub query: String,
    /// Language code
    pub lang: String,
    /// Safe search level
    pub safesearch: u8,
    /// Number of results wanted
    pub count: usize,
}

impl RequestParams {
    /// Create new request parameters
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            lang: "en".to_string(),
            safesearch: 0,
            count: 10,
        }
    }

    /// Create request parameters from search settings
    pub fn from_settings(query: impl Into<String>, settings: &SearchSettings) -> Self {
        Self {
            query: query.into(),
            lang: settings.lang.clone(),
            safesearch: settings.safesearch,
            count: settings.max_results,
        }
    }
}

/// HTTP request to be made on behalf of an engine
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// URL to request
    pub url: String,
    /// HTTP method
    pub method: HttpMethod,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// POST body data
    pub data: Option<RequestBody>,
}

impl EngineRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: HashMap::new(),
            data: None,
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url)
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add form data (sets content-type to form-urlencoded)
    pub fn form(mut self, data: HashMap<String, String>) -> Self {
        self.data = Some(RequestBody::Form(data));
        self
    }

    /// Add JSON body
    pub fn json(mut self, data: serde_json::Value) -> Self {
        self.data = Some(RequestBody::Json(data));
        self
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Request body types
#[derive(Debug, Clone)]
pub enum RequestBody {
    Form(HashMap<String, String>),
    Json(serde_json::Value),
}

/// HTTP response from an engine or page request
#[derive(Debug)]
pub struct EngineResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers (lower-case names)
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl EngineResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Check if response indicates CAPTCHA
    pub fn is_captcha(&self) -> bool {
        self.text.contains("captcha")
            || self.text.contains("CAPTCHA")
            || self.text.contains("unusual traffic")
            || self.text.contains("automated requests")
    }

    /// Value of the Content-Type header, if any
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Fail with a descriptive error unless the response is usable
    pub fn ensure_success(&self) -> anyhow::Result<()> {
        if self.is_rate_limited() {
            anyhow::bail!("too many requests (HTTP 429) from {}", self.url);
        }
        if !self.is_success() {
            anyhow::bail!("HTTP error: {} from {}", self.status, self.url);
        }
        Ok(())
    }
}

/// Main engine trait that all search engines must implement
pub trait Engine: Send + Sync {
    /// Engine name
    fn name(&self) -> &str;

    /// Short description of the engine
    fn about(&self) -> EngineAbout {
        EngineAbout::default()
    }

    /// Default timeout in seconds
    fn timeout(&self) -> f64 {
        5.0
    }

    /// Build the HTTP request for a search
    fn request(&self, params: &RequestParams) -> anyhow::Result<EngineRequest>;

    /// Parse the HTTP response into result records
    fn response(&self, response: EngineResponse) -> anyhow::Result<Vec<RawResultRecord>>;

    /// Optional initialization (called once on startup)
    fn init(&mut self, _settings: &SearchSettings) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Engine metadata
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineAbout {
    /// Website URL
    pub website: Option<String>,
    /// Whether it uses the official API
    pub use_official_api: bool,
    /// Whether an API key is required
    pub require_api_key: bool,
    /// Result format (HTML, JSON, XML)
    pub results: String,
}

impl EngineAbout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    pub fn official_api(mut self, uses: bool) -> Self {
        self.use_official_api = uses;
        self
    }

    pub fn api_key_required(mut self, required: bool) -> Self {
        self.require_api_key = required;
        self
    }

    pub fn results_format(mut self, format: impl Into<String>) -> Self {
        self.results = format.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, text: &str) -> EngineResponse {
        EngineResponse {
            status,
            headers: HashMap::new(),
            text: text.to_string(),
            url: "https://example.com".to_string(),
        }
    }

    #[test]
    fn test_ensure_success() {
        assert!(response(200, "ok").ensure_success().is_ok());

        let err = response(429, "").ensure_success().unwrap_err();
        assert!(err.to_string().contains("429"));

        let err = response(503, "").ensure_success().unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_captcha_detection() {
        assert!(response(200, "Please solve this CAPTCHA").is_captcha());
        assert!(!response(200, "<html>results</html>").is_captcha());
    }

    #[test]
    fn test_request_builder() {
        let request = EngineRequest::post("https://example.com/search")
            .header("X-Test", "1")
            .param("q", "rust");

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.headers.get("X-Test").map(String::as_str), Some("1"));
        assert_eq!(request.params.get("q").map(String::as_str), Some("rust"));
    }
}
