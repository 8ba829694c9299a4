//! Price-trend analyst

use agent_runtime::{AgentRuntime, ToolAgent};
use agent_tools::ToolRegistry;
use std::sync::Arc;

use crate::agents::Stage;
use crate::model::TrendAnalysis;
use crate::prompts::StagePrompt;
use crate::tools::PriceHistoryTool;

/// Analyst with the price history tool
pub fn price_analyst(
    runtime: &AgentRuntime,
    prompt: &StagePrompt,
    max_iterations: usize,
    prices: PriceHistoryTool,
) -> ToolAgent {
    let tools = ToolRegistry::new().with_tool(Arc::new(prices));
    runtime.tool_agent(prompt.persona.clone(), max_iterations, tools)
}

/// Accept an answer only if it carries the trend line for `ticker`
pub fn trend_validator(ticker: &str) -> impl Fn(&str) -> agent_core::Result<String> + Send + Sync + 'static {
    let ticker = ticker.to_string();
    move |raw: &str| {
        TrendAnalysis::parse(raw, &ticker)
            .map(|_| raw.trim().to_string())
            .map_err(|err| err.into_agent_error(Stage::PriceTrend.agent_name()))
    }
}
