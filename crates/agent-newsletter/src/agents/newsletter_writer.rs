//! Newsletter writer, the only agent allowed to delegate

use agent_core::{Agent, Context};
use agent_runtime::{AgentRuntime, ToolAgent};
use agent_tools::ToolRegistry;
use std::sync::Arc;

use crate::agents::Stage;
use crate::model::Newsletter;
use crate::prompts::StagePrompt;

/// Writer that can hand work to `coworkers`
pub fn newsletter_writer(
    runtime: &AgentRuntime,
    prompt: &StagePrompt,
    max_iterations: usize,
    coworkers: Vec<Arc<dyn Agent>>,
    context: &Context,
) -> ToolAgent {
    runtime.delegating_agent(
        prompt.persona.clone(),
        max_iterations,
        ToolRegistry::new(),
        coworkers,
        context,
    )
}

/// Accept an answer only if it splits into the four sections
pub fn newsletter_validator() -> impl Fn(&str) -> agent_core::Result<String> + Send + Sync + 'static {
    |raw: &str| {
        Newsletter::parse(raw)
            .map(|letter| letter.markdown)
            .map_err(|err| err.into_agent_error(Stage::Newsletter.agent_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newsletter_validator() {
        let validate = newsletter_validator();

        let letter = "\
# AAPL
## Executive Summary
- one
- two
- three
## Introduction
Intro.
## Main Analysis
Body.
## Conclusion
Prediction: DOWN
";
        assert!(validate(letter).unwrap().ends_with("Prediction: DOWN"));

        let err = validate("Just some prose about Apple.").unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("executive summary"));
    }
}
