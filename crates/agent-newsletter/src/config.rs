//! Configuration for the newsletter pipeline
//!
//! One [`NewsletterConfig`] is built at startup (usually with
//! [`NewsletterConfig::from_env`]) and shared read-only by every run.

use agent_utils::{env_any, env_parse_or, require_env};
use agent_workflow::Process;
use chrono::NaiveDate;
use std::fmt;
use std::net::SocketAddr;

use crate::error::{NewsletterError, Result};

/// Asset whose news is always analysed next to the requested ticker
pub const DEFAULT_REFERENCE_ASSET: &str = "BTC";

/// Default OpenAI-compatible endpoint
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default model for agents and the manager
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default address of the web form
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Credentials and model settings for the LLM service
#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl LlmSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Fixed date range for price history, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for PriceWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 10, 9).unwrap_or_default(),
        }
    }
}

impl fmt::Display for PriceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Iteration and retry limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentLimits {
    /// Price-trend agent iterations
    pub price_trend: usize,

    /// News-sentiment agent iterations
    pub news_sentiment: usize,

    /// Newsletter writer iterations
    pub newsletter: usize,

    /// Total dispatches the manager may make
    pub supervisor_budget: usize,

    /// Attempts per task, including the first
    pub task_attempts: usize,
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self {
            price_trend: 5,
            news_sentiment: 10,
            newsletter: 5,
            supervisor_budget: 15,
            task_attempts: 2,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct NewsletterConfig {
    pub llm: LlmSettings,

    /// Always-included sentiment asset
    pub reference_asset: String,

    pub window: PriceWindow,

    /// Search results per asset
    pub news_results: usize,

    /// News requests per minute
    pub news_rate_limit: u32,

    pub process: Process,

    pub limits: AgentLimits,

    /// Web form address
    pub bind: SocketAddr,
}

impl NewsletterConfig {
    /// Create a new configuration builder
    pub fn builder() -> NewsletterConfigBuilder {
        NewsletterConfigBuilder::default()
    }

    /// Read the configuration from the environment
    ///
    /// Call [`agent_utils::load_env_file`] first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        let api_key = require_env(&["OPENAI_API_KEY", "OPEN_API_KEY"])?;
        let defaults = PriceWindow::default();

        let mut builder = Self::builder()
            .api_key(api_key)
            .api_base(env_any(&["OPENAI_API_BASE"]).unwrap_or_else(|| DEFAULT_API_BASE.to_string()))
            .model(env_any(&["OPENAI_MODEL"]).unwrap_or_else(|| DEFAULT_MODEL.to_string()))
            .window(
                env_parse_or("NEWSLETTER_WINDOW_START", defaults.start)?,
                env_parse_or("NEWSLETTER_WINDOW_END", defaults.end)?,
            )
            .news_results(env_parse_or("NEWSLETTER_NEWS_RESULTS", 10usize)?)
            .process(env_parse_or("NEWSLETTER_PROCESS", Process::Hierarchical)?)
            .bind(env_parse_or(
                "NEWSLETTER_BIND",
                DEFAULT_BIND
                    .parse::<SocketAddr>()
                    .map_err(|e| NewsletterError::Config(format!("invalid bind address: {e}")))?,
            )?);

        if let Some(asset) = env_any(&["NEWSLETTER_REFERENCE_ASSET"]) {
            builder = builder.reference_asset(asset);
        }

        builder.build()
    }

    /// Check the configuration for values no run could work with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(NewsletterError::Config(msg.to_string()));

        if self.llm.api_key.trim().is_empty() {
            return invalid("LLM API key is empty");
        }
        if self.llm.model.trim().is_empty() {
            return invalid("LLM model is empty");
        }
        if self.reference_asset.trim().is_empty() {
            return invalid("reference asset is empty");
        }
        if self.window.start >= self.window.end {
            return invalid("price window start must be before its end");
        }
        if self.news_results == 0 {
            return invalid("news result cap must be greater than 0");
        }
        if self.news_rate_limit == 0 {
            return invalid("news rate limit must be greater than 0");
        }

        let limits = &self.limits;
        if [
            limits.price_trend,
            limits.news_sentiment,
            limits.newsletter,
            limits.supervisor_budget,
            limits.task_attempts,
        ]
        .contains(&0)
        {
            return invalid("iteration limits must be greater than 0");
        }

        Ok(())
    }
}

/// Builder for NewsletterConfig
#[derive(Debug, Default)]
pub struct NewsletterConfigBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    reference_asset: Option<String>,
    window: Option<PriceWindow>,
    news_results: Option<usize>,
    news_rate_limit: Option<u32>,
    process: Option<Process>,
    limits: Option<AgentLimits>,
    bind: Option<SocketAddr>,
}

impl NewsletterConfigBuilder {
    /// Set the LLM API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the LLM API base URL
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the always-included asset
    pub fn reference_asset(mut self, asset: impl Into<String>) -> Self {
        self.reference_asset = Some(asset.into());
        self
    }

    /// Set the price window
    pub fn window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.window = Some(PriceWindow { start, end });
        self
    }

    /// Set the search result cap per asset
    pub fn news_results(mut self, results: usize) -> Self {
        self.news_results = Some(results);
        self
    }

    /// Set the news requests per minute
    pub fn news_rate_limit(mut self, per_minute: u32) -> Self {
        self.news_rate_limit = Some(per_minute);
        self
    }

    /// Set the dispatch process
    pub fn process(mut self, process: Process) -> Self {
        self.process = Some(process);
        self
    }

    /// Set iteration and retry limits
    pub fn limits(mut self, limits: AgentLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Set the web form address
    pub fn bind(mut self, bind: SocketAddr) -> Self {
        self.bind = Some(bind);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<NewsletterConfig> {
        let mut llm = LlmSettings::new(self.api_key.unwrap_or_default());
        if let Some(base) = self.api_base {
            llm.api_base = base;
        }
        if let Some(model) = self.model {
            llm.model = model;
        }
        if let Some(temperature) = self.temperature {
            llm.temperature = temperature;
        }

        let bind = match self.bind {
            Some(bind) => bind,
            None => DEFAULT_BIND
                .parse()
                .map_err(|e| NewsletterError::Config(format!("invalid bind address: {e}")))?,
        };

        let config = NewsletterConfig {
            llm,
            reference_asset: self
                .reference_asset
                .unwrap_or_else(|| DEFAULT_REFERENCE_ASSET.to_string())
                .trim()
                .to_uppercase(),
            window: self.window.unwrap_or_default(),
            news_results: self.news_results.unwrap_or(10),
            news_rate_limit: self.news_rate_limit.unwrap_or(20),
            process: self.process.unwrap_or_default(),
            limits: self.limits.unwrap_or_default(),
            bind,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = NewsletterConfig::builder().api_key("sk-test").build().unwrap();

        assert_eq!(config.reference_asset, "BTC");
        assert_eq!(config.window.start, date(2024, 1, 1));
        assert_eq!(config.window.end, date(2024, 10, 9));
        assert_eq!(config.news_results, 10);
        assert_eq!(config.process, Process::Hierarchical);
        assert_eq!(config.limits, AgentLimits::default());
        assert_eq!(config.limits.news_sentiment, 10);
        assert_eq!(config.limits.supervisor_budget, 15);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.bind.port(), 8501);
    }

    #[test]
    fn test_reference_asset_is_normalised() {
        let config = NewsletterConfig::builder()
            .api_key("sk-test")
            .reference_asset(" eth ")
            .build()
            .unwrap();
        assert_eq!(config.reference_asset, "ETH");
    }

    #[test]
    fn test_validation() {
        assert!(NewsletterConfig::builder().build().is_err());
        assert!(
            NewsletterConfig::builder()
                .api_key("sk-test")
                .reference_asset("  ")
                .build()
                .is_err()
        );
        assert!(
            NewsletterConfig::builder()
                .api_key("sk-test")
                .window(date(2024, 10, 9), date(2024, 1, 1))
                .build()
                .is_err()
        );
        assert!(
            NewsletterConfig::builder()
                .api_key("sk-test")
                .limits(AgentLimits {
                    newsletter: 0,
                    ..AgentLimits::default()
                })
                .build()
                .is_err()
        );
        assert!(NewsletterConfig::builder().api_key("sk-test").news_results(0).build().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = NewsletterConfig::builder().api_key("sk-secret").build().unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_env() {
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
            std::env::set_var("OPEN_API_KEY", "sk-from-alias");
            std::env::set_var("NEWSLETTER_PROCESS", "sequential");
            std::env::set_var("NEWSLETTER_WINDOW_START", "2024-02-01");
        }

        let config = NewsletterConfig::from_env().unwrap();
        assert_eq!(config.llm.api_key, "sk-from-alias");
        assert_eq!(config.process, Process::Sequential);
        assert_eq!(config.window.start, date(2024, 2, 1));

        unsafe {
            std::env::remove_var("OPEN_API_KEY");
            std::env::remove_var("NEWSLETTER_PROCESS");
            std::env::remove_var("NEWSLETTER_WINDOW_START");
        }
    }
}
