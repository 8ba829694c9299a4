//! Simple agent implementation (one LLM call, no tools)

use agent_core::{Agent, CompletionStatus, Context, Result};
use agent_llm::{CompletionRequest, LLMProvider, Message, StopReason};
use async_trait::async_trait;
use std::sync::Arc;

/// Configuration for a simple agent
#[derive(Debug, Clone)]
pub struct SimpleConfig {
    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature for sampling
    pub temperature: f32,
}

impl Default for SimpleConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            max_tokens: 512,
            temperature: 0.0,
        }
    }
}

/// An agent that answers with a single completion
///
/// The workflow manager uses one of these to pick the next task.
pub struct SimpleAgent {
    provider: Arc<dyn LLMProvider>,
    config: SimpleConfig,
    name: String,
}

impl SimpleAgent {
    /// Create a new simple agent
    pub fn new(provider: Arc<dyn LLMProvider>, config: SimpleConfig, name: impl Into<String>) -> Self {
        Self {
            provider,
            config,
            name: name.into(),
        }
    }

    /// Get the agent's configuration
    pub fn config(&self) -> &SimpleConfig {
        &self.config
    }
}

#[async_trait]
impl Agent for SimpleAgent {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        let request = CompletionRequest::builder(&self.config.model)
            .messages(vec![Message::user(input)])
            .system(self.config.system_prompt.clone())
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .build();

        let response = self.provider.complete(request).await?;

        let status = match response.stop_reason {
            StopReason::MaxTokens => CompletionStatus::TokenLimit,
            _ => CompletionStatus::Complete,
        };
        context.set_completion_status(status, 1);

        Ok(response.message.text().unwrap_or_default())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::testing::{ScriptedProvider, ScriptedReply};

    #[tokio::test]
    async fn test_single_completion() {
        let provider = Arc::new(ScriptedProvider::new([ScriptedReply::text("news_sentiment")]));
        let agent = SimpleAgent::new(provider.clone(), SimpleConfig::default(), "manager");

        let mut context = Context::new();
        let answer = agent.process("which task?".to_string(), &mut context).await.unwrap();

        assert_eq!(answer, "news_sentiment");
        assert_eq!(agent.name(), "manager");
        let request = &provider.requests()[0];
        assert!(request.tools.is_none());
        assert_eq!(request.temperature, Some(0.0));
    }
}
