//! Prompt templates for the newsletter agents
//!
//! Templates are grouped into:
//! - `personas`: role, goal and backstory of each agent
//! - `tasks`: task description and expected output of each stage
//!
//! Every template is named `<stage>.<part>`, e.g. `price_trend.goal`.

mod personas;
mod tasks;

use agent_prompt::{PromptRegistry, Result};
use agent_runtime::Persona;
use serde::Serialize;

use crate::agents::Stage;
use crate::model::INSUFFICIENT_INFORMATION;
use crate::tools::{NEWS_TOOL_NAME, PRICE_TOOL_NAME};

/// Register every newsletter template with `registry`
pub fn register_prompts(registry: &PromptRegistry) -> Result<()> {
    registry.register_all(personas::price_analyst()?);
    registry.register_all(personas::news_analyst()?);
    registry.register_all(personas::newsletter_writer()?);

    registry.register_all(tasks::price_trend()?);
    registry.register_all(tasks::news_sentiment()?);
    registry.register_all(tasks::newsletter()?);

    Ok(())
}

/// Variables available to every template
#[derive(Debug, Clone, Serialize)]
pub struct PromptVars {
    pub ticker: String,
    pub reference_asset: String,
    /// Requested ticker plus the reference asset
    pub assets: Vec<String>,
    pub current_date: String,
    pub window: String,
    /// Rendered price summary, empty when unknown
    pub price_summary: String,
    pub price_tool: &'static str,
    pub news_tool: &'static str,
    pub insufficient: &'static str,
}

impl PromptVars {
    pub fn new(ticker: impl Into<String>, reference_asset: impl Into<String>, assets: Vec<String>) -> Self {
        Self {
            ticker: ticker.into(),
            reference_asset: reference_asset.into(),
            assets,
            current_date: String::new(),
            window: String::new(),
            price_summary: String::new(),
            price_tool: PRICE_TOOL_NAME,
            news_tool: NEWS_TOOL_NAME,
            insufficient: INSUFFICIENT_INFORMATION,
        }
    }

    #[must_use]
    pub fn current_date(mut self, date: impl Into<String>) -> Self {
        self.current_date = date.into();
        self
    }

    #[must_use]
    pub fn window(mut self, window: impl Into<String>) -> Self {
        self.window = window.into();
        self
    }

    #[must_use]
    pub fn price_summary(mut self, summary: impl Into<String>) -> Self {
        self.price_summary = summary.into();
        self
    }
}

/// Rendered persona and task text for one stage
#[derive(Debug, Clone)]
pub struct StagePrompt {
    pub persona: Persona,
    pub description: String,
    pub expected_output: String,
}

/// The registry of newsletter templates
pub struct NewsletterPrompts {
    registry: PromptRegistry,
}

impl NewsletterPrompts {
    /// Registry with every newsletter template
    pub fn new() -> Result<Self> {
        let registry = PromptRegistry::new();
        register_prompts(&registry)?;
        Ok(Self { registry })
    }

    pub fn registry(&self) -> &PromptRegistry {
        &self.registry
    }

    fn part(&self, stage: Stage, part: &str, vars: &PromptVars) -> Result<String> {
        let name = format!("{}.{part}", stage.task_id());
        Ok(self.registry.render(&name, vars)?.trim().to_string())
    }

    /// Render persona and task for `stage`
    pub fn stage(&self, stage: Stage, vars: &PromptVars) -> Result<StagePrompt> {
        Ok(StagePrompt {
            persona: Persona::new(
                stage.agent_name(),
                self.part(stage, "role", vars)?,
                self.part(stage, "goal", vars)?,
                self.part(stage, "backstory", vars)?,
            ),
            description: self.part(stage, "task", vars)?,
            expected_output: self.part(stage, "expected", vars)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> PromptVars {
        PromptVars::new("AAPL", "BTC", vec!["AAPL".to_string(), "BTC".to_string()])
            .current_date("2024-10-09")
            .window("2024-01-01 to 2024-10-09")
    }

    #[test]
    fn test_every_stage_renders() {
        let prompts = NewsletterPrompts::new().unwrap();
        assert_eq!(prompts.registry().len(), 15);

        for stage in Stage::ALL {
            let prompt = prompts.stage(stage, &vars()).unwrap();
            assert_eq!(prompt.persona.name, stage.agent_name());
            assert!(!prompt.description.is_empty());
            assert!(!prompt.expected_output.is_empty());
        }
    }

    #[test]
    fn test_price_trend_prompt() {
        let prompts = NewsletterPrompts::new().unwrap();

        let bare = prompts.stage(Stage::PriceTrend, &vars()).unwrap();
        assert_eq!(bare.persona.role, "Senior Stock Price Analyst");
        assert_eq!(bare.persona.goal, "Find the AAPL stock price and analyze trends");
        assert!(bare.description.contains("from 2024-01-01 to 2024-10-09"));
        assert!(!bare.description.contains("Price history summary"));
        assert!(bare.expected_output.contains("'AAPL, price UP'"));

        let with_summary = prompts
            .stage(Stage::PriceTrend, &vars().price_summary("AAPL closed up 18%"))
            .unwrap();
        assert!(with_summary.description.contains("AAPL closed up 18%"));
        assert!(with_summary.description.contains(PRICE_TOOL_NAME));
    }

    #[test]
    fn test_news_prompt_lists_assets_and_date() {
        let prompts = NewsletterPrompts::new().unwrap();
        let prompt = prompts.stage(Stage::NewsSentiment, &vars()).unwrap();

        assert!(prompt.description.contains("AAPL, BTC"));
        assert!(prompt.description.contains("The current date is 2024-10-09."));
        assert!(prompt.description.contains(INSUFFICIENT_INFORMATION));
        assert!(prompt.expected_output.contains("ASSET: AAPL"));
        assert!(prompt.expected_output.contains("ASSET: BTC"));
    }

    #[test]
    fn test_newsletter_prompt_sections() {
        let prompts = NewsletterPrompts::new().unwrap();
        let prompt = prompts.stage(Stage::Newsletter, &vars()).unwrap();

        assert_eq!(prompt.persona.role, "Senior Stock Analyst Writer");
        for heading in ["Executive Summary", "Introduction", "Main Analysis", "Conclusion"] {
            assert!(prompt.expected_output.contains(&format!("## {heading}")));
        }
    }
}
