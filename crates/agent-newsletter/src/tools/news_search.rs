//! News search tool and the per-run ledger of what it found

use agent_core::{Error as AgentError, Result as AgentResult};
use agent_tools::{Tool, optional_str, required_str};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

use crate::api::NewsSearch;
use crate::model::{INSUFFICIENT_INFORMATION, NewsCoverage};

/// Name the model uses to call [`NewsSearchTool`]
pub const NEWS_TOOL_NAME: &str = "duckduckgo_news";

/// Record of every news search made during one run, keyed by asset
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct NewsLedger {
    tracked: Arc<Vec<String>>,
    coverage: Arc<Mutex<BTreeMap<String, NewsCoverage>>>,
}

impl NewsLedger {
    /// Ledger for a run analysing `assets`
    pub fn new(assets: &[String]) -> Self {
        Self {
            tracked: Arc::new(assets.iter().map(|a| a.to_ascii_uppercase()).collect()),
            coverage: Arc::default(),
        }
    }

    /// Tracked asset a search refers to (`BTC-USD` and `btc` both count as `BTC`)
    fn resolve(&self, asset: &str) -> String {
        let asset = asset.trim().to_ascii_uppercase();
        self.tracked
            .iter()
            .find(|tracked| {
                **tracked == asset
                    || asset
                        .strip_prefix(tracked.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            })
            .cloned()
            .unwrap_or(asset)
    }

    fn update(&self, asset: &str, apply: impl FnOnce(&mut NewsCoverage)) -> String {
        let key = self.resolve(asset);
        let mut coverage = self.coverage.lock().unwrap_or_else(PoisonError::into_inner);
        apply(coverage.entry(key.clone()).or_default());
        key
    }

    /// Record a search that returned `items` results
    pub fn record_success(&self, asset: &str, items: usize) -> String {
        self.update(asset, |seen| {
            seen.searches += 1;
            seen.items += items;
        })
    }

    /// Record a failed search
    pub fn record_failure(&self, asset: &str, reason: impl Into<String>) -> String {
        let reason = reason.into();
        self.update(asset, |seen| {
            seen.searches += 1;
            seen.failures.push(reason);
        })
    }

    /// Coverage so far
    pub fn snapshot(&self) -> BTreeMap<String, NewsCoverage> {
        self.coverage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Search recent news for one asset at a time
pub struct NewsSearchTool {
    search: Arc<dyn NewsSearch>,
    ledger: NewsLedger,
    max_results: usize,
}

impl NewsSearchTool {
    pub fn new(search: Arc<dyn NewsSearch>, ledger: NewsLedger, max_results: usize) -> Self {
        Self {
            search,
            ledger,
            max_results,
        }
    }
}

#[async_trait]
impl Tool for NewsSearchTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let asset = required_str(NEWS_TOOL_NAME, &params, "asset")?;
        let query = optional_str(&params, "query").unwrap_or(asset);

        match self.search.search(query, self.max_results).await {
            Ok(items) => {
                let count = items.len();
                let key = self.ledger.record_success(asset, count);
                info!(asset = %key, query, found = count, "News search");

                let mut result = json!({
                    "asset": key,
                    "query": query,
                    "count": count,
                    "items": items,
                });
                if count == 0 {
                    result["note"] = json!(format!(
                        "No news found for {key}. Report this asset as '{INSUFFICIENT_INFORMATION}' with SCORE: N/A."
                    ));
                }
                Ok(result)
            }
            Err(err) => {
                let key = self.ledger.record_failure(asset, err.to_string());
                warn!(asset = %key, query, error = %err, "News search failed");
                Err(AgentError::ToolFailed {
                    tool: NEWS_TOOL_NAME.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        NEWS_TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Search recent news articles about one asset. Call it once per asset. \
         Returns headline, source, snippet, date and URL for each article."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "asset": {
                    "type": "string",
                    "description": "Ticker of the asset the news is for (e.g., 'AAPL', 'BTC')"
                },
                "query": {
                    "type": "string",
                    "description": "Optional search text; defaults to the asset ticker"
                }
            },
            "required": ["asset"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockNewsSearch;
    use crate::error::NewsletterError;
    use crate::model::NewsItem;

    fn item(headline: &str) -> NewsItem {
        NewsItem {
            source: "Reuters".to_string(),
            headline: headline.to_string(),
            snippet: String::new(),
            published_at: None,
            url: "https://example.com".to_string(),
        }
    }

    fn assets() -> Vec<String> {
        vec!["AAPL".to_string(), "BTC".to_string()]
    }

    #[test]
    fn test_ledger_resolves_tracked_assets() {
        let ledger = NewsLedger::new(&assets());
        assert_eq!(ledger.record_success("btc-usd", 3), "BTC");
        assert_eq!(ledger.record_success("aapl", 0), "AAPL");
        assert_eq!(ledger.record_failure("Bitcoin", "timeout"), "BITCOIN");

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot["BTC"].items, 3);
        assert!(!snapshot["AAPL"].has_news());
        assert!(snapshot["BITCOIN"].all_failed());
    }

    #[tokio::test]
    async fn test_search_records_items() {
        let mut search = MockNewsSearch::new();
        search
            .expect_search()
            .withf(|query, max| query == "Apple earnings" && *max == 5)
            .times(1)
            .returning(|_, _| Ok(vec![item("Apple beats"), item("iPhone sales up")]));

        let ledger = NewsLedger::new(&assets());
        let tool = NewsSearchTool::new(Arc::new(search), ledger.clone(), 5);

        let value = tool
            .execute(json!({"asset": "AAPL", "query": "Apple earnings"}))
            .await
            .unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["items"][0]["headline"], "Apple beats");
        assert!(value.get("note").is_none());
        assert_eq!(ledger.snapshot()["AAPL"].items, 2);
    }

    #[tokio::test]
    async fn test_empty_search_adds_note() {
        let mut search = MockNewsSearch::new();
        search.expect_search().returning(|_, _| Ok(Vec::new()));

        let tool = NewsSearchTool::new(Arc::new(search), NewsLedger::new(&assets()), 10);
        let value = tool.execute(json!({"asset": "BTC"})).await.unwrap();

        assert_eq!(value["count"], 0);
        assert!(value["note"].as_str().unwrap().contains(INSUFFICIENT_INFORMATION));
    }

    #[tokio::test]
    async fn test_failed_search_is_recorded() {
        let mut search = MockNewsSearch::new();
        search.expect_search().returning(|asset, _| {
            Err(NewsletterError::SearchUnavailable {
                asset: asset.to_string(),
                reason: "HTTP 503".to_string(),
            })
        });

        let ledger = NewsLedger::new(&assets());
        let tool = NewsSearchTool::new(Arc::new(search), ledger.clone(), 10);
        let err = tool.execute(json!({"asset": "BTC"})).await.unwrap_err();

        assert!(matches!(err, AgentError::ToolFailed { ref tool, .. } if tool == NEWS_TOOL_NAME));
        assert!(ledger.snapshot()["BTC"].all_failed());
    }
}
