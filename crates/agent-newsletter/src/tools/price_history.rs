//! Tool for fetching daily price history

use agent_core::Result as AgentResult;
use agent_tools::{Tool, required_str};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use crate::api::MarketDataSource;
use crate::config::PriceWindow;
use crate::error::Result;
use crate::model::PriceSeries;

/// Name the model uses to call [`PriceHistoryTool`]
pub const PRICE_TOOL_NAME: &str = "yahoo_finance_history";

/// Daily prices for a ticker over the configured window
pub struct PriceHistoryTool {
    source: Arc<dyn MarketDataSource>,
    window: PriceWindow,
    prefetched: Option<PriceSeries>,
}

impl PriceHistoryTool {
    pub fn new(source: Arc<dyn MarketDataSource>, window: PriceWindow) -> Self {
        Self {
            source,
            window,
            prefetched: None,
        }
    }

    /// Answer requests for the series' ticker without calling the source
    #[must_use]
    pub fn with_prefetched(mut self, series: PriceSeries) -> Self {
        self.prefetched = Some(series);
        self
    }

    async fn series(&self, ticker: &str) -> Result<PriceSeries> {
        if let Some(series) = self
            .prefetched
            .as_ref()
            .filter(|series| series.ticker.eq_ignore_ascii_case(ticker))
        {
            debug!(ticker, "Serving prefetched price history");
            return Ok(series.clone());
        }
        self.source.fetch(ticker, self.window).await
    }
}

fn series_json(series: &PriceSeries) -> Value {
    let rows: Vec<Value> = series
        .bars
        .iter()
        .map(|bar| {
            json!({
                "date": bar.date.to_string(),
                "open": bar.open,
                "high": bar.high,
                "low": bar.low,
                "close": bar.close,
                "adj_close": bar.adj_close,
                "volume": bar.volume,
            })
        })
        .collect();

    json!({
        "ticker": series.ticker,
        "summary": series.summary().map(|summary| summary.to_string()),
        "rows": rows,
    })
}

#[async_trait]
impl Tool for PriceHistoryTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let ticker = required_str(PRICE_TOOL_NAME, &params, "ticker")?.to_ascii_uppercase();
        let series = self.series(&ticker).await?;
        Ok(series_json(&series))
    }

    fn name(&self) -> &'static str {
        PRICE_TOOL_NAME
    }

    fn description(&self) -> &'static str {
        "Fetch the daily price history (open, high, low, close, volume) of a ticker over \
         the analysis window, together with a summary of the move."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Ticker symbol (e.g., 'AAPL', 'BTC-USD')"
                }
            },
            "required": ["ticker"]
        })
    }
}
