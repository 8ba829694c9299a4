//! DuckDuckGo news search
//!
//! Two requests per search: the landing page yields a `vqd` token, which the
//! `news.js` JSON endpoint requires.

use async_trait::async_trait;
use chrono::DateTime;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::api::NewsSearch;
use crate::error::{NewsletterError, Result};
use crate::model::NewsItem;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Default service root
pub const DEFAULT_BASE_URL: &str = "https://duckduckgo.com";

const USER_AGENT: &str = concat!("stock-newsletter/", env!("CARGO_PKG_VERSION"));

static VQD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"vqd=(?:"([^"]+)"|'([^']+)'|([^&"']+)&)"#).expect("vqd regex is valid")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"));

/// Raw `news.js` response
#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<RawNewsItem>,
}

#[derive(Debug, Deserialize)]
struct RawNewsItem {
    #[serde(default)]
    date: Option<i64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    source: String,
}

/// Pull the `vqd` token out of the landing page
fn extract_vqd(body: &str) -> Option<String> {
    let caps = VQD.captures(body)?;
    (1..=3)
        .find_map(|i| caps.get(i))
        .map(|m| m.as_str().to_string())
}

/// Drop markup and decode the entities DuckDuckGo uses in excerpts
fn clean_text(text: &str) -> String {
    TAG.replace_all(text, "")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

fn into_items(response: NewsResponse, max_results: usize) -> Vec<NewsItem> {
    response
        .results
        .into_iter()
        .filter(|raw| !raw.title.trim().is_empty())
        .take(max_results)
        .map(|raw| NewsItem {
            source: raw.source.trim().to_string(),
            headline: clean_text(&raw.title),
            snippet: clean_text(&raw.excerpt),
            published_at: raw.date.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            url: raw.url,
        })
        .collect()
}

/// News search against DuckDuckGo with client-side rate limiting
pub struct DuckDuckGoNewsClient {
    client: Client,
    base_url: Url,
    rate_limiter: SharedRateLimiter,
}

impl DuckDuckGoNewsClient {
    /// Create a client allowing `rate_limit` requests per minute
    pub fn new(rate_limit: u32) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, rate_limit)
    }

    /// Create a client against another service root
    pub fn with_base_url(base_url: &str, rate_limit: u32) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| NewsletterError::Config(format!("invalid search URL {base_url}: {e}")))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NewsletterError::Config(format!("failed to build HTTP client: {e}")))?;
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| NewsletterError::Config(format!("invalid search path {path}: {e}")))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> std::result::Result<String, String> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        response.text().await.map_err(|e| format!("failed to read response: {e}"))
    }
}

#[async_trait]
impl NewsSearch for DuckDuckGoNewsClient {
    async fn search(&self, asset: &str, max_results: usize) -> Result<Vec<NewsItem>> {
        let unavailable = |reason: String| {
            warn!(asset, %reason, "News search failed");
            NewsletterError::SearchUnavailable {
                asset: asset.to_string(),
                reason,
            }
        };

        let landing = self.endpoint("/", &[("q", asset)])?;
        let page = self.get_text(landing).await.map_err(unavailable)?;
        let vqd = extract_vqd(&page).ok_or_else(|| unavailable("no vqd token in search page".to_string()))?;

        let news = self.endpoint(
            "/news.js",
            &[
                ("l", "us-en"),
                ("o", "json"),
                ("noamp", "1"),
                ("q", asset),
                ("vqd", &vqd),
                ("p", "-1"),
            ],
        )?;
        let body = self.get_text(news).await.map_err(unavailable)?;
        let response: NewsResponse = serde_json::from_str(&body)
            .map_err(|e| unavailable(format!("invalid news response: {e}")))?;

        let items = into_items(response, max_results);
        debug!(asset, found = items.len(), "News search done");
        Ok(items)
    }
}
