//! DuckDuckGo search engine implementation

use super::traits::*;
use crate::results::RawResultRecord;
use anyhow::Result as AnyhowResult;
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

/// DuckDuckGo web search engine (HTML endpoint, no credentials needed)
pub struct DuckDuckGo {
    html_url: String,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self::with_url("https://html.duckduckgo.com/html/")
    }

    /// Point the engine at a different HTML endpoint
    pub fn with_url(html_url: impl Into<String>) -> Self {
        Self {
            html_url: html_url.into(),
        }
    }

    fn parse_html_results(&self, html: &str) -> Vec<RawResultRecord> {
        let document = Html::parse_document(html);
        let mut results = Vec::new();

        // DuckDuckGo HTML result selectors
        let result_selector = Selector::parse("div.result").unwrap();
        let title_selector = Selector::parse("a.result__a").unwrap();
        let snippet_selector = Selector::parse("a.result__snippet, div.result__snippet").unwrap();

        let mut position = 1u32;

        for element in document.select(&result_selector) {
            // Ads are marked with an extra class
            if element.value().classes().any(|c| c == "result--ad") {
                continue;
            }

            let title_elem = match element.select(&title_selector).next() {
                Some(t) => t,
                None => continue,
            };

            let title = title_elem.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                continue;
            }

            let url = match title_elem.value().attr("href").and_then(resolve_href) {
                Some(url) => url,
                None => continue,
            };

            let snippet = element
                .select(&snippet_selector)
                .next()
                .map(|s| s.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty());

            let mut result = RawResultRecord::new(url, title, self.name());
            if let Some(content) = snippet {
                result = result.with_content(content);
            }
            results.push(result.with_position(position));
            position += 1;
        }

        results
    }
}

/// Turn a result href into the target URL
///
/// Result links are usually wrapped in a `/l/?uddg=<target>` redirect; links that
/// stay on duckduckgo.com otherwise are dropped.
fn resolve_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    let on_ddg = parsed
        .host_str()
        .map(|h| h.ends_with("duckduckgo.com"))
        .unwrap_or(false);

    if !on_ddg {
        return Some(absolute);
    }

    parsed
        .query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())
        .filter(|target| !target.is_empty())
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn about(&self) -> EngineAbout {
        EngineAbout::new()
            .website("https://duckduckgo.com")
            .official_api(false)
            .results_format("HTML")
    }

    fn request(&self, params: &RequestParams) -> AnyhowResult<EngineRequest> {
        let mut form_data = HashMap::new();
        form_data.insert("q".to_string(), params.query.clone());
        form_data.insert("b".to_string(), String::new());

        // DuckDuckGo region codes look like "us-en"; anything else means no region
        let kl = if params.lang.contains('-') {
            params.lang.to_lowercase()
        } else {
            "wt-wt".to_string()
        };
        form_data.insert("kl".to_string(), kl);

        let kp = match params.safesearch {
            2 => "1",  // Strict
            1 => "-1", // Moderate
            _ => "-2", // Off
        };
        form_data.insert("kp".to_string(), kp.to_string());

        Ok(EngineRequest::post(&self.html_url).form(form_data))
    }

    fn response(&self, response: EngineResponse) -> AnyhowResult<Vec<RawResultRecord>> {
        response.ensure_success()?;

        if response.is_captcha() {
            return Err(anyhow::anyhow!("DuckDuckGo returned a CAPTCHA challenge"));
        }

        Ok(self.parse_html_results(&response.text))
    }
}
