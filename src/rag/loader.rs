//! Page fetching and readable-text extraction

use crate::network::HttpClient;
use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node, Selector};
use std::time::Duration;
use url::Url;

/// Elements whose text never belongs to the readable content
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "svg", "form", "template",
    "iframe",
];

/// Elements that start a new paragraph in the extracted text
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "aside", "h1", "h2", "h3", "h4", "h5", "h6",
    "li", "ul", "ol", "pre", "blockquote", "table", "tr", "br", "dd", "dt", "figcaption",
];

static INLINE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\u{a0}]+").unwrap());
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// A fetched page reduced to its text
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// Fetches pages and extracts their readable text
#[derive(Clone)]
pub struct PageLoader {
    client: HttpClient,
    timeout: Duration,
    max_bytes: usize,
}

impl PageLoader {
    pub fn new(client: HttpClient, timeout: Duration, max_bytes: usize) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }

    /// Fetch a single page
    ///
    /// At most `max_bytes` of the body are read; longer pages are indexed from
    /// their first `max_bytes`.
    pub async fn load(&self, url: &str) -> Result<LoadedPage> {
        let parsed = Url::parse(url).with_context(|| format!("invalid URL {}", url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("unsupported URL scheme {} for {}", parsed.scheme(), url);
        }

        let response = self
            .client
            .get_capped(url, self.timeout, self.max_bytes)
            .await?;
        response.ensure_success()?;

        let content_type = response
            .content_type()
            .map(|ct| ct.to_ascii_lowercase())
            .unwrap_or_else(|| "text/html".to_string());
        let body = response.text.as_str();

        let (title, text) = if content_type.contains("html") {
            html_to_text(body)
        } else if content_type.starts_with("text/") {
            (None, normalize_whitespace(body))
        } else {
            bail!("unsupported content type {} for {}", content_type, url);
        };

        if text.is_empty() {
            bail!("no readable text on {}", url);
        }

        Ok(LoadedPage {
            url: url.to_string(),
            title,
            text,
        })
    }
}

/// Extract the title and the visible body text of an HTML document
pub fn html_to_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").unwrap();
    let body_selector = Selector::parse("body").unwrap();

    let title = document
        .select(&title_selector)
        .next()
        .map(|t| normalize_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let root = match document.select(&body_selector).next() {
        Some(body) => body,
        None => document.root_element(),
    };

    let mut raw = String::new();
    for node in root.descendants() {
        match node.value() {
            Node::Element(element) if BLOCK_TAGS.contains(&element.name()) => {
                raw.push_str("\n\n");
            }
            Node::Text(text) => {
                let skipped = node.ancestors().any(|a| {
                    a.value()
                        .as_element()
                        .map(|e| SKIPPED_TAGS.contains(&e.name()))
                        .unwrap_or(false)
                });
                if !skipped {
                    raw.push_str(text);
                }
            }
            _ => {}
        }
    }

    (title, normalize_whitespace(&raw))
}

/// Collapse runs of spaces, trim every line and keep at most one blank line in a row
fn normalize_whitespace(text: &str) -> String {
    let spaced = INLINE_SPACE.replace_all(text, " ");
    let lines: Vec<&str> = spaced.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}
