//! News-sentiment analyst
//!
//! The analyst never delegates. Its report is checked against the run's
//! [`NewsLedger`], so an asset without news always ends up with the
//! insufficient-information block whatever the model claims.

use agent_core::Error as AgentError;
use agent_runtime::{AgentRuntime, ToolAgent};
use agent_tools::ToolRegistry;
use std::sync::Arc;
use tracing::debug;

use crate::agents::Stage;
use crate::error::NewsletterError;
use crate::model::SentimentReport;
use crate::prompts::StagePrompt;
use crate::tools::{NEWS_TOOL_NAME, NewsLedger, NewsSearchTool};

/// Analyst with the news search tool
pub fn news_analyst(
    runtime: &AgentRuntime,
    prompt: &StagePrompt,
    max_iterations: usize,
    news: NewsSearchTool,
) -> ToolAgent {
    let tools = ToolRegistry::new().with_tool(Arc::new(news));
    runtime.tool_agent(prompt.persona.clone(), max_iterations, tools)
}

/// Parse and reconcile the report, accepting its canonical rendering
///
/// Parse problems are retryable. Searches that all failed are not: they
/// surface as a failure of the news tool.
pub fn sentiment_validator(
    assets: Vec<String>,
    ledger: NewsLedger,
) -> impl Fn(&str) -> agent_core::Result<String> + Send + Sync + 'static {
    let agent = Stage::NewsSentiment.agent_name();
    move |raw: &str| {
        let report = SentimentReport::parse(raw).map_err(|err| err.into_agent_error(agent))?;
        let coverage = ledger.snapshot();
        debug!(?coverage, "Reconciling sentiment report");

        match report.reconcile(&assets, &coverage, agent) {
            Ok(report) => Ok(report.to_string()),
            Err(NewsletterError::Parse { source, .. }) => Err(source.into_agent_error(agent)),
            Err(err @ NewsletterError::SearchUnavailable { .. }) => Err(AgentError::ToolFailed {
                tool: NEWS_TOOL_NAME.to_string(),
                reason: err.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::INSUFFICIENT_INFORMATION;

    const REPORT: &str = "\
MARKET: Risk appetite is steady.

ASSET: AAPL
SUMMARY: iPhone demand beat expectations.
FORECAST: UP
SCORE: 72

ASSET: BTC
SUMMARY: ETF inflows keep coming.
FORECAST: UP
SCORE: 64";

    fn assets() -> Vec<String> {
        vec!["AAPL".to_string(), "BTC".to_string()]
    }

    #[test]
    fn test_accepts_canonical_report() {
        let ledger = NewsLedger::new(&assets());
        ledger.record_success("AAPL", 10);
        ledger.record_success("BTC", 4);

        let accepted = sentiment_validator(assets(), ledger)(REPORT).unwrap();
        let report = SentimentReport::parse(&accepted).unwrap();
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.block("BTC").unwrap().score.unwrap().value(), 64);
    }

    #[test]
    fn test_asset_without_news_is_forced_insufficient() {
        let ledger = NewsLedger::new(&assets());
        ledger.record_success("AAPL", 10);
        ledger.record_success("BTC", 0);

        let accepted = sentiment_validator(assets(), ledger)(REPORT).unwrap();
        assert!(accepted.contains(INSUFFICIENT_INFORMATION));

        let report = SentimentReport::parse(&accepted).unwrap();
        let btc = report.block("BTC").unwrap();
        assert!(btc.is_insufficient());
        assert!(btc.score.is_none());
    }

    #[test]
    fn test_missing_block_is_retryable() {
        let ledger = NewsLedger::new(&assets());
        ledger.record_success("AAPL", 10);
        ledger.record_success("BTC", 3);

        let only_aapl = REPORT.split("\n\nASSET: BTC").next().unwrap();
        let err = sentiment_validator(assets(), ledger)(only_aapl).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_failed_searches_are_not_retryable() {
        let ledger = NewsLedger::new(&assets());
        ledger.record_success("AAPL", 10);
        ledger.record_failure("BTC", "HTTP 503");

        let err = sentiment_validator(assets(), ledger)(REPORT).unwrap_err();
        assert!(!err.is_retryable());
        assert!(matches!(err, AgentError::ToolFailed { ref tool, .. } if tool == NEWS_TOOL_NAME));
    }
}
