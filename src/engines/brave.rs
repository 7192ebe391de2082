//! Brave Search API engine implementation

use super::traits::*;
use crate::config::SearchSettings;
use crate::results::RawResultRecord;
use anyhow::Result as AnyhowResult;
use serde::Deserialize;

/// Brave web search through the official API
pub struct Brave {
    api_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    url: Option<String>,
    description: Option<String>,
}

impl Brave {
    pub fn new() -> Self {
        Self {
            api_url: "https://api.search.brave.com/res/v1/web/search".to_string(),
            api_key: None,
        }
    }

    /// Point the engine at a different API endpoint
    pub fn with_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the subscription token
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

impl Default for Brave {
    fn default() -> Self {
        Self::new()
    }
}

/// Brave snippets contain `<strong>` highlighting
fn strip_tags(text: &str) -> String {
    scraper::Html::parse_fragment(text)
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}

impl Engine for Brave {
    fn name(&self) -> &str {
        "brave"
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://search.brave.com")
            .official_api(true)
            .api_key_required(true)
            .results_format("JSON")
    }

    fn init(&mut self, settings: &SearchSettings) -> AnyhowResult<()> {
        if let Some(ref key) = settings.api_key {
            self.api_key = Some(key.clone());
        }
        Ok(())
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<EngineRequest> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Brave search requires search.api_key"))?;

        let safesearch = match params.safesearch {
            2 => "strict",
            1 => "moderate",
            _ => "off",
        };

        // The API caps count at 20
        let request = EngineRequest::get(&self.api_url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .param("q", params.query.clone())
            .param("count", params.count.clamp(1, 20).to_string())
            .param("safesearch", safesearch)
            .param("search_lang", params.lang.split('-').next().unwrap_or("en"));

        Ok(request)
    }

    fn response(&self, response: EngineResponse) -> AnyhowResult<Vec<RawResultRecord>> {
        response.ensure_success()?;

        let parsed: BraveResponse = response.json()?;
        let results = parsed
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                let title = strip_tags(&r.title);
                let mut record = match r.url {
                    Some(url) => RawResultRecord::new(url, title, self.name()),
                    None => RawResultRecord::without_url(title, self.name()),
                };
                if let Some(description) = r.description {
                    record = record.with_content(strip_tags(&description));
                }
                record.with_position((i + 1) as u32)
            })
            .collect();

        Ok(results)
    }
}
