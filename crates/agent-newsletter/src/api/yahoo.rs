//! Yahoo Finance price history

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use time::OffsetDateTime;
use tracing::{debug, info};
use yahoo_finance_api as yahoo;

use crate::api::MarketDataSource;
use crate::config::PriceWindow;
use crate::error::{NewsletterError, Result};
use crate::model::{PriceBar, PriceSeries};

/// Yahoo Finance API client
///
/// A connector is created per call; nothing is cached between runs.
#[derive(Debug, Default, Clone)]
pub struct YahooFinanceClient;

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self
    }
}

fn to_offset(ticker: &str, date: NaiveDate) -> Result<OffsetDateTime> {
    let timestamp = date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
    timestamp
        .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
        .ok_or_else(|| NewsletterError::DataUnavailable {
            ticker: ticker.to_string(),
            reason: format!("invalid date {date}"),
        })
}

fn to_bar(quote: &yahoo::Quote) -> Option<PriceBar> {
    #[allow(clippy::cast_possible_wrap)]
    let date = DateTime::from_timestamp(quote.timestamp as i64, 0)?.date_naive();
    (quote.close.is_finite() && quote.close > 0.0).then(|| PriceBar {
        date,
        open: quote.open,
        high: quote.high,
        low: quote.low,
        close: quote.close,
        adj_close: quote.adjclose,
        volume: quote.volume,
    })
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn fetch(&self, ticker: &str, window: PriceWindow) -> Result<PriceSeries> {
        let unavailable = |reason: String| NewsletterError::DataUnavailable {
            ticker: ticker.to_string(),
            reason,
        };

        let provider = yahoo::YahooConnector::new().map_err(|e| unavailable(e.to_string()))?;
        let start = to_offset(ticker, window.start)?;
        let end = to_offset(ticker, window.end)?;

        debug!(ticker, %window, "Fetching price history");
        let response = provider
            .get_quote_history(ticker, start, end)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let quotes = response.quotes().map_err(|e| unavailable(e.to_string()))?;

        let bars: Vec<PriceBar> = quotes
            .iter()
            .filter_map(to_bar)
            .filter(|bar| bar.date >= window.start && bar.date < window.end)
            .collect();

        if bars.is_empty() {
            return Err(unavailable(format!("no price rows from {window}")));
        }

        info!(ticker, rows = bars.len(), "Fetched price history");
        Ok(PriceSeries::new(ticker, bars))
    }
}
