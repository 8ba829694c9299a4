//! The research pipeline
//!
//! One call to [`NewsletterPipeline::research`] is one run:
//!
//! 1. validate the ticker
//! 2. fetch the price history (no rows aborts before any agent runs)
//! 3. build fresh agents, tools and news ledger for the run
//! 4. run the price-trend, news-sentiment and newsletter tasks under the
//!    configured supervisor
//! 5. parse every stage's accepted output into typed results

use agent_core::{Agent, Context, Error as AgentError};
use agent_llm::LLMProvider;
use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
use agent_runtime::{AgentRuntime, RuntimeConfig};
use agent_workflow::{
    LlmSupervisor, MANAGER_SYSTEM_PROMPT, Process, SequentialSupervisor, Supervisor, Task, Workflow,
    WorkflowError, WorkflowOutput,
};
use chrono::{Local, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::agents::{
    Stage, news_analyst, newsletter_validator, newsletter_writer, price_analyst,
    sentiment_validator, trend_validator,
};
use crate::api::{DuckDuckGoNewsClient, MarketDataSource, NewsSearch, YahooFinanceClient};
use crate::config::NewsletterConfig;
use crate::engine::{Degradation, NewsletterRun};
use crate::error::{NewsletterError, ParseError, Result};
use crate::model::{Newsletter, PriceSeries, SentimentReport, TickerRequest, TrendAnalysis};
use crate::prompts::{NewsletterPrompts, PromptVars};
use crate::tools::{NEWS_TOOL_NAME, NewsLedger, NewsSearchTool, PriceHistoryTool};

/// Stock newsletter research pipeline
pub struct NewsletterPipeline {
    config: Arc<NewsletterConfig>,
    runtime: AgentRuntime,
    market: Arc<dyn MarketDataSource>,
    news: Arc<dyn NewsSearch>,
    prompts: NewsletterPrompts,
    current_date: Option<NaiveDate>,
}

impl NewsletterPipeline {
    pub fn builder(config: Arc<NewsletterConfig>) -> NewsletterPipelineBuilder {
        NewsletterPipelineBuilder::new(config)
    }

    /// Pipeline against OpenAI, Yahoo Finance and DuckDuckGo
    pub fn from_config(config: Arc<NewsletterConfig>) -> Result<Self> {
        let llm = &config.llm;
        let provider = OpenAIProvider::with_config(
            OpenAIConfig::new(llm.api_key.clone())
                .with_api_base(llm.api_base.clone())
                .with_timeout(llm.timeout_secs),
        )?;
        let news = DuckDuckGoNewsClient::new(config.news_rate_limit)?;

        Self::builder(config)
            .provider(Arc::new(provider))
            .market_data(Arc::new(YahooFinanceClient::new()))
            .news_search(Arc::new(news))
            .build()
    }

    pub fn config(&self) -> &NewsletterConfig {
        &self.config
    }

    /// Research `ticker` and write its newsletter
    pub async fn research(&self, ticker: &str) -> Result<NewsletterRun> {
        let ticker = TickerRequest::parse(ticker)?;
        let run_id = Uuid::new_v4();
        let span = info_span!("research", %run_id, ticker = %ticker);

        self.run(ticker, run_id).instrument(span).await
    }

    async fn run(&self, ticker: TickerRequest, run_id: Uuid) -> Result<NewsletterRun> {
        let started_at = Utc::now();
        let assets = ticker.with_reference(&self.config.reference_asset);
        info!(?assets, process = %self.config.process, "Research started");

        let series = self.fetch_prices(&ticker).await?;
        let price_summary = series.summary().ok_or_else(|| NewsletterError::DataUnavailable {
            ticker: ticker.to_string(),
            reason: format!("no price rows from {}", self.config.window),
        })?;
        info!(rows = series.len(), change_pct = price_summary.change_pct, "Market data fetched");

        let today = self.current_date.unwrap_or_else(|| Local::now().date_naive());
        let vars = PromptVars::new(ticker.as_str(), &self.config.reference_asset, assets.clone())
            .current_date(today.to_string())
            .window(self.config.window.to_string())
            .price_summary(price_summary.to_string());

        let mut context = Context::new()
            .with_ticker(ticker.as_str())
            .with_run_id(run_id.to_string())
            .with_current_date(today.to_string());

        let ledger = NewsLedger::new(&assets);
        let workflow = self.workflow(&ticker, &assets, &vars, series, &ledger, &context)?;

        let output = workflow
            .run(&mut context)
            .await
            .map_err(|err| failure(err, &assets, &ledger))?;

        let trend = TrendAnalysis::parse(stage_output(&output, Stage::PriceTrend)?, ticker.as_str())
            .map_err(|source| parse_failure(Stage::PriceTrend, source))?;
        let sentiment = SentimentReport::parse(stage_output(&output, Stage::NewsSentiment)?)
            .map_err(|source| parse_failure(Stage::NewsSentiment, source))?;
        let newsletter = Newsletter::parse(stage_output(&output, Stage::Newsletter)?)
            .map_err(|source| parse_failure(Stage::Newsletter, source))?;

        let degradations: Vec<Degradation> =
            output.outputs.iter().filter_map(Degradation::from_output).collect();
        info!(
            trend = %trend.label,
            direction = %newsletter.direction,
            supervisor_iterations = output.supervisor_iterations,
            degraded = degradations.len(),
            "Research finished"
        );

        Ok(NewsletterRun {
            run_id,
            ticker: ticker.to_string(),
            assets,
            started_at,
            finished_at: Utc::now(),
            price_summary,
            trend,
            sentiment,
            newsletter,
            supervisor_iterations: output.supervisor_iterations,
            degradations,
        })
    }

    async fn fetch_prices(&self, ticker: &TickerRequest) -> Result<PriceSeries> {
        let series = self.market.fetch(ticker.as_str(), self.config.window).await?;
        if series.is_empty() {
            return Err(NewsletterError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: format!("no price rows from {}", self.config.window),
            });
        }
        Ok(series)
    }

    /// Fresh agents, tools and tasks for one run
    fn workflow(
        &self,
        ticker: &TickerRequest,
        assets: &[String],
        vars: &PromptVars,
        series: PriceSeries,
        ledger: &NewsLedger,
        context: &Context,
    ) -> Result<Workflow> {
        let limits = &self.config.limits;
        let price_prompt = self.prompts.stage(Stage::PriceTrend, vars)?;
        let news_prompt = self.prompts.stage(Stage::NewsSentiment, vars)?;
        let writer_prompt = self.prompts.stage(Stage::Newsletter, vars)?;

        let prices = PriceHistoryTool::new(self.market.clone(), self.config.window)
            .with_prefetched(series);
        let news = NewsSearchTool::new(self.news.clone(), ledger.clone(), self.config.news_results);

        let price_agent: Arc<dyn Agent> = Arc::new(price_analyst(
            &self.runtime,
            &price_prompt,
            limits.price_trend,
            prices,
        ));
        let news_agent: Arc<dyn Agent> = Arc::new(news_analyst(
            &self.runtime,
            &news_prompt,
            limits.news_sentiment,
            news,
        ));
        let writer: Arc<dyn Agent> = Arc::new(newsletter_writer(
            &self.runtime,
            &writer_prompt,
            limits.newsletter,
            vec![price_agent.clone(), news_agent.clone()],
            context,
        ));

        let supervisor: Arc<dyn Supervisor> = match self.config.process {
            Process::Sequential => Arc::new(SequentialSupervisor),
            Process::Hierarchical => Arc::new(LlmSupervisor::new(Arc::new(
                self.runtime.simple_agent("manager", MANAGER_SYSTEM_PROMPT),
            ))),
        };

        let workflow = Workflow::builder()
            .agent(price_agent)
            .agent(news_agent)
            .agent(writer)
            .task(
                Task::new(
                    Stage::PriceTrend.task_id(),
                    Stage::PriceTrend.agent_name(),
                    price_prompt.description,
                    price_prompt.expected_output,
                )
                .with_validator(trend_validator(ticker.as_str())),
            )
            .task(
                Task::new(
                    Stage::NewsSentiment.task_id(),
                    Stage::NewsSentiment.agent_name(),
                    news_prompt.description,
                    news_prompt.expected_output,
                )
                .with_validator(sentiment_validator(assets.to_vec(), ledger.clone())),
            )
            .task(
                Task::new(
                    Stage::Newsletter.task_id(),
                    Stage::Newsletter.agent_name(),
                    writer_prompt.description,
                    writer_prompt.expected_output,
                )
                .with_context([Stage::PriceTrend.task_id(), Stage::NewsSentiment.task_id()])
                .with_validator(newsletter_validator()),
            )
            .supervisor(supervisor)
            .supervisor_budget(limits.supervisor_budget)
            .max_task_attempts(limits.task_attempts)
            .build()
            .map_err(|err| NewsletterError::PipelineAborted(err.to_string()))?;

        Ok(workflow)
    }
}

fn stage_output(output: &WorkflowOutput, stage: Stage) -> Result<&str> {
    output
        .get(stage.task_id())
        .map(|task| task.output.as_str())
        .ok_or_else(|| NewsletterError::PipelineAborted(format!("{stage} produced no output")))
}

fn parse_failure(stage: Stage, source: ParseError) -> NewsletterError {
    NewsletterError::Parse {
        stage: stage.to_string(),
        source,
    }
}

/// Map a failed workflow to the error class the user sees
fn failure(err: WorkflowError, assets: &[String], ledger: &NewsLedger) -> NewsletterError {
    warn!(error = %err, "Workflow aborted");

    let news_failed = matches!(
        &err,
        WorkflowError::TaskFailed {
            source: AgentError::ToolFailed { tool, .. },
            ..
        } if tool == NEWS_TOOL_NAME
    );
    if news_failed {
        let coverage = ledger.snapshot();
        let failed = assets.iter().find_map(|asset| {
            coverage
                .get(asset)
                .filter(|seen| seen.all_failed())
                .map(|seen| (asset, seen))
        });
        if let Some((asset, seen)) = failed {
            return NewsletterError::SearchUnavailable {
                asset: asset.clone(),
                reason: seen.failures.last().cloned().unwrap_or_default(),
            };
        }
    }

    NewsletterError::PipelineAborted(err.to_string())
}

/// Builder for [`NewsletterPipeline`]
pub struct NewsletterPipelineBuilder {
    config: Arc<NewsletterConfig>,
    provider: Option<Arc<dyn LLMProvider>>,
    market: Option<Arc<dyn MarketDataSource>>,
    news: Option<Arc<dyn NewsSearch>>,
    current_date: Option<NaiveDate>,
}

impl NewsletterPipelineBuilder {
    pub fn new(config: Arc<NewsletterConfig>) -> Self {
        Self {
            config,
            provider: None,
            market: None,
            news: None,
            current_date: None,
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn market_data(mut self, source: Arc<dyn MarketDataSource>) -> Self {
        self.market = Some(source);
        self
    }

    pub fn news_search(mut self, search: Arc<dyn NewsSearch>) -> Self {
        self.news = Some(search);
        self
    }

    /// Fix the date given to the news analyst instead of using today
    pub fn current_date(mut self, date: NaiveDate) -> Self {
        self.current_date = Some(date);
        self
    }

    pub fn build(self) -> Result<NewsletterPipeline> {
        self.config.validate()?;

        let provider = self
            .provider
            .ok_or_else(|| NewsletterError::Config("LLM provider not set".to_string()))?;
        let market = self
            .market
            .ok_or_else(|| NewsletterError::Config("market data source not set".to_string()))?;
        let news = self
            .news
            .ok_or_else(|| NewsletterError::Config("news search not set".to_string()))?;

        let llm = &self.config.llm;
        let runtime = AgentRuntime::new(
            provider,
            RuntimeConfig {
                model: llm.model.clone(),
                max_tokens: llm.max_tokens,
                temperature: Some(llm.temperature),
            },
        );

        Ok(NewsletterPipeline {
            config: self.config,
            runtime,
            market,
            news,
            prompts: NewsletterPrompts::new()?,
            current_date: self.current_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockMarketDataSource, MockNewsSearch};
    use crate::error::ValidationError;
    use agent_llm::testing::ScriptedProvider;

    fn config() -> Arc<NewsletterConfig> {
        Arc::new(
            NewsletterConfig::builder()
                .api_key("sk-test")
                .process(Process::Sequential)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_builder_requires_sources() {
        let err = NewsletterPipeline::builder(config())
            .provider(Arc::new(ScriptedProvider::default()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, NewsletterError::Config(_)));
    }

    #[tokio::test]
    async fn test_blank_ticker_runs_nothing() {
        let provider = Arc::new(ScriptedProvider::default());
        let pipeline = NewsletterPipeline::builder(config())
            .provider(provider.clone())
            .market_data(Arc::new(MockMarketDataSource::new()))
            .news_search(Arc::new(MockNewsSearch::new()))
            .build()
            .unwrap();

        let err = pipeline.research("   ").await.unwrap_err();
        assert!(matches!(err, NewsletterError::Validation(ValidationError::EmptyTicker)));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_market_data_aborts_before_agents() {
        let mut market = MockMarketDataSource::new();
        market
            .expect_fetch()
            .times(1)
            .returning(|ticker, _| Ok(PriceSeries::new(ticker, Vec::new())));
        let provider = Arc::new(ScriptedProvider::default());

        let pipeline = NewsletterPipeline::builder(config())
            .provider(provider.clone())
            .market_data(Arc::new(market))
            .news_search(Arc::new(MockNewsSearch::new()))
            .build()
            .unwrap();

        let err = pipeline.research("zzzz").await.unwrap_err();
        assert_eq!(err.category(), "DataUnavailable");
        assert!(err.user_message().contains("ZZZZ"));
        assert!(provider.requests().is_empty());
    }

    #[test]
    fn test_all_failed_news_maps_to_search_unavailable() {
        let assets = vec!["AAPL".to_string(), "BTC".to_string()];
        let ledger = NewsLedger::new(&assets);
        ledger.record_success("AAPL", 4);
        ledger.record_failure("BTC", "HTTP 503");

        let err = WorkflowError::TaskFailed {
            task: "news_sentiment".to_string(),
            attempts: 1,
            source: AgentError::ToolFailed {
                tool: NEWS_TOOL_NAME.to_string(),
                reason: "News search unavailable for BTC: HTTP 503".to_string(),
            },
        };
        match failure(err, &assets, &ledger) {
            NewsletterError::SearchUnavailable { asset, reason } => {
                assert_eq!(asset, "BTC");
                assert_eq!(reason, "HTTP 503");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = WorkflowError::SupervisorBudgetExhausted { budget: 15 };
        assert_eq!(failure(err, &assets, &ledger).category(), "PipelineAborted");
    }
}
