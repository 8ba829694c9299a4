//! Clients for the market-data and news services

pub mod duckduckgo;
pub mod yahoo;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::config::PriceWindow;
use crate::error::Result;
use crate::model::{NewsItem, PriceSeries};

pub use duckduckgo::DuckDuckGoNewsClient;
pub use yahoo::YahooFinanceClient;

/// Daily price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Bars for `ticker` within `window`
    ///
    /// A ticker with no rows in the window is `DataUnavailable`.
    async fn fetch(&self, ticker: &str, window: PriceWindow) -> Result<PriceSeries>;
}

/// News search, news category only
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// Up to `max_results` recent news items about `asset`
    ///
    /// An empty list is a valid answer; service failures are `SearchUnavailable`.
    async fn search(&self, asset: &str, max_results: usize) -> Result<Vec<NewsItem>>;
}

/// Search every asset individually, one call per asset
///
/// Failures are kept per asset.
pub async fn search_all<S>(
    search: &S,
    assets: &[String],
    max_results: usize,
) -> BTreeMap<String, Result<Vec<NewsItem>>>
where
    S: NewsSearch + ?Sized,
{
    let mut results = BTreeMap::new();
    for asset in assets {
        let found = search.search(asset, max_results).await;
        results.insert(asset.clone(), found);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NewsletterError;

    #[tokio::test]
    async fn test_search_all_queries_each_asset() {
        let mut search = MockNewsSearch::new();
        search
            .expect_search()
            .withf(|asset, max| asset == "AAPL" && *max == 10)
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        search
            .expect_search()
            .withf(|asset, max| asset == "BTC" && *max == 10)
            .times(1)
            .returning(|asset, _| {
                Err(NewsletterError::SearchUnavailable {
                    asset: asset.to_string(),
                    reason: "HTTP 503".to_string(),
                })
            });

        let assets = vec!["AAPL".to_string(), "BTC".to_string()];
        let results = search_all(&search, &assets, 10).await;

        assert!(results["AAPL"].as_ref().unwrap().is_empty());
        assert!(results["BTC"].is_err());
    }
}
