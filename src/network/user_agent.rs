//! User agent and default header values

use rand::seq::SliceRandom;

/// Desktop browser user agents; `{os}` is filled in per request client
const TEMPLATES: &[&str] = &[
    "Mozilla/5.0 ({os}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 ({os}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 ({os}; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 ({os}; rv:126.0) Gecko/20100101 Firefox/126.0",
];

const OS_STRINGS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
];

/// Generate a random but realistic user agent string
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let template = TEMPLATES.choose(&mut rng).copied().unwrap_or(TEMPLATES[0]);
    let os = OS_STRINGS.choose(&mut rng).copied().unwrap_or(OS_STRINGS[0]);
    template.replace("{os}", os)
}

/// Accept header for page and HTML engine requests
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,text/plain;q=0.8,*/*;q=0.5"
}

/// Accept-Language header for a language code
pub fn accept_language(lang: &str) -> String {
    let base = lang.split('-').next().unwrap_or_default();
    if base.is_empty() || base == "all" || base == "en" {
        "en-US,en;q=0.9".to_string()
    } else {
        format!("{},en-US;q=0.8,en;q=0.7", base)
    }
}
