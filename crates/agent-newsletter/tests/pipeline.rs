//! End-to-end runs of the research pipeline against scripted agents

use agent_llm::testing::{ScriptedProvider, ScriptedReply};
use agent_newsletter::api::{MarketDataSource, NewsSearch};
use agent_newsletter::model::{NewsItem, PriceBar, PriceSeries, Trend};
use agent_newsletter::{
    AgentLimits, Degradation, NewsletterConfig, NewsletterError, NewsletterPipeline, PriceWindow,
    Result,
};
use agent_workflow::Process;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::{Arc, Mutex};

struct StubMarket;

#[async_trait]
impl MarketDataSource for StubMarket {
    async fn fetch(&self, ticker: &str, _window: PriceWindow) -> Result<PriceSeries> {
        let bars = (1..=5)
            .map(|day| {
                let close = 180.0 + f64::from(day) * 2.0;
                PriceBar {
                    date: NaiveDate::from_ymd_opt(2024, 10, day).unwrap(),
                    open: close - 1.0,
                    high: close + 1.5,
                    low: close - 2.0,
                    close,
                    adj_close: close,
                    volume: 50_000_000,
                }
            })
            .collect();
        Ok(PriceSeries::new(ticker, bars))
    }
}

/// News for AAPL, nothing for anything else, or a failure for `failing`
#[derive(Default)]
struct StubNews {
    failing: Option<&'static str>,
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl NewsSearch for StubNews {
    async fn search(&self, asset: &str, max_results: usize) -> Result<Vec<NewsItem>> {
        self.queries.lock().unwrap().push(asset.to_string());

        if self.failing == Some(asset) {
            return Err(NewsletterError::SearchUnavailable {
                asset: asset.to_string(),
                reason: "HTTP 503".to_string(),
            });
        }
        if asset != "AAPL" {
            return Ok(Vec::new());
        }
        let items = vec![
            NewsItem {
                source: "Reuters".to_string(),
                headline: "Apple iPhone demand beats expectations".to_string(),
                snippet: "Strong upgrade cycle.".to_string(),
                published_at: None,
                url: "https://example.com/1".to_string(),
            },
            NewsItem {
                source: "Bloomberg".to_string(),
                headline: "Apple services revenue hits record".to_string(),
                snippet: String::new(),
                published_at: None,
                url: "https://example.com/2".to_string(),
            },
        ];
        Ok(items.into_iter().take(max_results).collect())
    }
}

const TREND: &str = "AAPL, price UP\nThe stock made higher highs and higher lows all week.";

const SENTIMENT: &str = "\
MARKET: Risk appetite is healthy.

ASSET: AAPL
SUMMARY: iPhone demand and services growth lift the outlook.
FORECAST: UP
SCORE: 74

ASSET: BTC
SUMMARY: Bitcoin is rallying on ETF inflows.
FORECAST: UP
SCORE: 81";

const NEWSLETTER: &str = "\
# Apple Keeps Climbing

## Executive Summary
- AAPL trended up over the window.
- News sentiment on Apple is positive at 74.
- There was not enough Bitcoin news to score it.

## Introduction
Apple heads into the quarter with momentum.

## Main Analysis
The price analyst reports AAPL, price UP. iPhone demand and services revenue
lead the news flow.

## Conclusion
Price and news agree.

Prediction: UP
";

fn config(process: Process, limits: AgentLimits) -> Arc<NewsletterConfig> {
    Arc::new(
        NewsletterConfig::builder()
            .api_key("sk-test")
            .process(process)
            .limits(limits)
            .build()
            .unwrap(),
    )
}

fn pipeline_with(
    process: Process,
    provider: Arc<ScriptedProvider>,
    news: Arc<StubNews>,
    limits: AgentLimits,
) -> NewsletterPipeline {
    NewsletterPipeline::builder(config(process, limits))
        .provider(provider)
        .market_data(Arc::new(StubMarket))
        .news_search(news)
        .current_date(NaiveDate::from_ymd_opt(2024, 10, 9).unwrap())
        .build()
        .unwrap()
}

fn pipeline(
    provider: Arc<ScriptedProvider>,
    news: Arc<StubNews>,
    limits: AgentLimits,
) -> NewsletterPipeline {
    pipeline_with(Process::Sequential, provider, news, limits)
}

fn news_turns() -> Vec<ScriptedReply> {
    vec![
        ScriptedReply::tool("duckduckgo_news", json!({"asset": "AAPL"})),
        ScriptedReply::tool("duckduckgo_news", json!({"asset": "BTC"})),
        ScriptedReply::text(SENTIMENT),
    ]
}

#[tokio::test]
async fn test_full_run_produces_typed_newsletter() {
    let mut script = vec![ScriptedReply::text(TREND)];
    script.extend(news_turns());
    script.push(ScriptedReply::text(NEWSLETTER));

    let provider = Arc::new(ScriptedProvider::new(script));
    let news = Arc::new(StubNews::default());
    let run = pipeline(provider.clone(), news.clone(), AgentLimits::default())
        .research(" aapl ")
        .await
        .unwrap();

    assert_eq!(run.ticker, "AAPL");
    assert_eq!(run.assets, vec!["AAPL".to_string(), "BTC".to_string()]);
    assert_eq!(run.trend.label, Trend::Up);
    assert_eq!(run.newsletter.direction, Trend::Up);
    assert_eq!(run.newsletter.executive_summary.len(), 3);
    assert_eq!(run.price_summary.rows, 5);
    assert!(run.degradations.is_empty());
    assert_eq!(run.supervisor_iterations, 3);

    // Each asset searched individually
    assert_eq!(*news.queries.lock().unwrap(), vec!["AAPL", "BTC"]);

    // BTC had no news, so its block is the insufficient-information one
    let aapl = run.sentiment.block("AAPL").unwrap();
    assert_eq!(aapl.score.unwrap().value(), 74);
    let btc = run.sentiment.block("BTC").unwrap();
    assert!(btc.is_insufficient());
    assert!(btc.score.is_none());

    // The writer ran last and saw both reports
    let requests = provider.requests();
    assert_eq!(requests.len(), 5);
    assert_eq!(provider.remaining(), 0);
    let writer_prompt = requests[4].last_user_text().unwrap();
    assert!(writer_prompt.contains("AAPL, price UP"));
    assert!(writer_prompt.contains("ASSET: BTC"));
    assert!(writer_prompt.contains("SCORE: N/A"));

    // The news analyst was told the date
    assert!(requests[1].last_user_text().unwrap().contains("2024-10-09"));
}

#[tokio::test]
async fn test_manager_chooses_dispatch_order() {
    // The manager is asked once, while both analysts are ready
    let mut script = vec![ScriptedReply::text("news_sentiment")];
    script.extend(news_turns());
    script.push(ScriptedReply::text(TREND));
    script.push(ScriptedReply::text(NEWSLETTER));

    let provider = Arc::new(ScriptedProvider::new(script));
    let run = pipeline_with(
        Process::Hierarchical,
        provider.clone(),
        Arc::new(StubNews::default()),
        AgentLimits::default(),
    )
    .research("AAPL")
    .await
    .unwrap();

    assert_eq!(run.supervisor_iterations, 3);
    assert_eq!(provider.remaining(), 0);

    let requests = provider.requests();
    assert_eq!(requests.len(), 6);
    assert!(requests[0].last_user_text().unwrap().contains("price_trend"));
    assert!(requests[1].last_user_text().unwrap().contains("The current date is"));
    assert!(requests[4].last_user_text().unwrap().contains("stock price history"));
}

#[tokio::test]
async fn test_malformed_newsletter_is_retried() {
    let mut script = vec![ScriptedReply::text(TREND)];
    script.extend(news_turns());
    script.push(ScriptedReply::text("Apple looks great, buy it."));
    script.push(ScriptedReply::text(NEWSLETTER));

    let provider = Arc::new(ScriptedProvider::new(script));
    let run = pipeline(provider.clone(), Arc::new(StubNews::default()), AgentLimits::default())
        .research("AAPL")
        .await
        .unwrap();

    assert_eq!(run.newsletter.direction, Trend::Up);
    assert_eq!(run.supervisor_iterations, 4);

    let retry_prompt = provider.requests()[5].last_user_text().unwrap();
    assert!(retry_prompt.contains("Your previous answer was rejected"));
}

#[tokio::test]
async fn test_failed_news_search_aborts_before_writer() {
    let mut script = vec![ScriptedReply::text(TREND)];
    script.extend(news_turns());
    script.push(ScriptedReply::text(NEWSLETTER));

    let provider = Arc::new(ScriptedProvider::new(script));
    let news = Arc::new(StubNews {
        failing: Some("BTC"),
        ..StubNews::default()
    });
    let err = pipeline(provider.clone(), news, AgentLimits::default())
        .research("AAPL")
        .await
        .unwrap_err();

    assert_eq!(err.category(), "SearchUnavailable");
    assert!(matches!(err, NewsletterError::SearchUnavailable { ref asset, .. } if asset == "BTC"));
    // The writer's reply was never requested
    assert_eq!(provider.requests().len(), 4);
    assert_eq!(provider.remaining(), 1);
}

#[tokio::test]
async fn test_iteration_exhaustion_is_a_degradation() {
    let limits = AgentLimits {
        price_trend: 2,
        ..AgentLimits::default()
    };
    let mut script = vec![
        ScriptedReply::tool("yahoo_finance_history", json!({"ticker": "AAPL"})),
        ScriptedReply::text(TREND),
    ];
    script.extend(news_turns());
    script.push(ScriptedReply::text(NEWSLETTER));

    let provider = Arc::new(ScriptedProvider::new(script));
    let run = pipeline(provider, Arc::new(StubNews::default()), limits)
        .research("AAPL")
        .await
        .unwrap();

    assert!(run.is_degraded());
    assert_eq!(
        run.degradations,
        vec![Degradation::AgentIterationExhausted {
            stage: "price_trend".to_string(),
            iterations: 2,
        }]
    );
    assert_eq!(run.trend.label, Trend::Up);
}

#[tokio::test]
async fn test_blank_ticker_is_a_validation_error() {
    let provider = Arc::new(ScriptedProvider::default());
    let err = pipeline(provider.clone(), Arc::new(StubNews::default()), AgentLimits::default())
        .research("")
        .await
        .unwrap_err();

    assert_eq!(err.category(), "ValidationError");
    assert_eq!(err.user_message(), "Please fill the ticker field");
    assert!(provider.requests().is_empty());
}
