//! Agent executor for running bounded agent loops
//!
//! The AgentExecutor implements the tool-calling loop:
//! 1. Call the LLM with the conversation and the available tools
//! 2. If the model asks for tools, execute them and loop back
//! 3. If the model ends its turn, return its answer
//!
//! The loop is bounded by `max_iterations`. On the last iteration the model
//! is told to answer without tools; whatever it says becomes the best-effort
//! result and the outcome is marked [`CompletionStatus::IterationLimit`].

use agent_core::{CompletionStatus, Result};
use agent_llm::{
    CompletionRequest, LLMProvider, Message, StopReason, ToolChoice, ToolDefinition,
};
use agent_tools::ToolRegistry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const FINAL_ANSWER_NUDGE: &str = "You have reached the limit of reasoning steps. \
Do not call any more tools. Give your best complete final answer now, \
in the expected format.";

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of LLM calls in one run
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            model: "gpt-3.5-turbo".to_string(),
            system_prompt: None,
            max_tokens: 2048,
            temperature: Some(0.7),
        }
    }
}

/// Result of one executor run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// Final (or best-effort) answer
    pub output: String,
    /// How the answer came about
    pub status: CompletionStatus,
    /// LLM calls made
    pub iterations: usize,
}

/// Executes an agent loop: LLM → tool calls → execution → loop back
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
        }
    }

    /// Create a builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    /// Executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Tools this executor offers the model
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// Run the loop for a single user message
    pub async fn run(&self, user_message: String) -> Result<ExecutionOutcome> {
        self.run_conversation(vec![Message::user(user_message)])
            .await
    }

    async fn run_conversation(&self, mut conversation: Vec<Message>) -> Result<ExecutionOutcome> {
        let tools = self.tool_registry.definitions();
        let max_iterations = self.config.max_iterations.max(1);
        let mut last_text: Option<String> = None;

        for iteration in 1..=max_iterations {
            let final_turn = iteration == max_iterations && iteration > 1 && !tools.is_empty();
            if final_turn {
                conversation.push(Message::user(FINAL_ANSWER_NUDGE));
            }

            info!(
                iteration,
                max_iterations,
                model = %self.config.model,
                tool_count = tools.len(),
                final_turn,
                "Agent iteration started"
            );

            let request = self.build_request(&conversation, &tools, final_turn);
            let response = self
                .provider
                .complete(request)
                .await
                .map_err(|e| agent_core::Error::ProcessingFailed(e.to_string()))?;

            info!(
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM response received"
            );

            let text = response.message.text().filter(|t| !t.trim().is_empty());
            if let Some(text) = &text {
                let preview: String = text.chars().take(300).collect();
                debug!(response_preview = %preview, "LLM response content preview");
                last_text = Some(text.clone());
            }

            match response.stop_reason {
                StopReason::EndTurn => {
                    let status = if final_turn {
                        warn!(iteration, "Iteration budget exhausted, returning forced answer");
                        CompletionStatus::IterationLimit
                    } else {
                        info!(iteration, "Agent completed naturally");
                        CompletionStatus::Complete
                    };
                    return Ok(ExecutionOutcome {
                        output: last_text.unwrap_or_default(),
                        status,
                        iterations: iteration,
                    });
                }

                StopReason::MaxTokens => {
                    warn!(iteration, "Hit max tokens in LLM response");
                    return Ok(ExecutionOutcome {
                        output: last_text.unwrap_or_default(),
                        status: CompletionStatus::TokenLimit,
                        iterations: iteration,
                    });
                }

                StopReason::ToolUse if final_turn => {
                    warn!(iteration, "Model kept calling tools on its final turn");
                    break;
                }

                StopReason::ToolUse => {
                    conversation.push(response.message.clone());
                    let results = self.execute_tools(&response.message).await;
                    info!(
                        result_count = results.len(),
                        "Tool execution completed, continuing agent loop"
                    );
                    conversation.extend(results);
                }
            }
        }

        Ok(ExecutionOutcome {
            output: last_text.unwrap_or_default(),
            status: CompletionStatus::IterationLimit,
            iterations: max_iterations,
        })
    }

    fn build_request(
        &self,
        conversation: &[Message],
        tools: &[ToolDefinition],
        final_turn: bool,
    ) -> CompletionRequest {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(conversation.to_vec())
            .max_tokens(self.config.max_tokens);

        if let Some(system) = &self.config.system_prompt {
            builder = builder.system(system.clone());
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }
        if !tools.is_empty() {
            builder = builder.tools(tools.to_vec()).tool_choice(if final_turn {
                ToolChoice::None
            } else {
                ToolChoice::Auto
            });
        }

        builder.build()
    }

    /// Execute every tool call of an assistant message
    ///
    /// Failures, including unknown tools, go back to the model as error
    /// results so it can correct itself within its budget.
    async fn execute_tools(&self, message: &Message) -> Vec<Message> {
        let mut results = Vec::new();

        for call in message.tool_calls() {
            let input_preview: String = call.input.to_string().chars().take(500).collect();
            info!(
                tool_name = %call.name,
                tool_id = %call.id,
                input_preview = %input_preview,
                "Executing tool"
            );

            let Some(tool) = self.tool_registry.get(call.name) else {
                warn!(tool_name = %call.name, "Model requested an unknown tool");
                results.push(Message::tool_error(
                    call.id,
                    format!(
                        "Error: unknown tool '{}'. Available tools: {}",
                        call.name,
                        self.tool_registry.names().join(", ")
                    ),
                ));
                continue;
            };

            let start_time = Instant::now();
            match tool.execute(call.input.clone()).await {
                Ok(result) => {
                    let result_str = result.to_string();
                    info!(
                        tool_name = %call.name,
                        duration_ms = start_time.elapsed().as_millis() as u64,
                        result_length = result_str.len(),
                        "Tool execution succeeded"
                    );
                    results.push(Message::tool_result(call.id, result_str));
                }
                Err(e) => {
                    warn!(
                        tool_name = %call.name,
                        duration_ms = start_time.elapsed().as_millis() as u64,
                        error = %e,
                        "Tool execution failed"
                    );
                    results.push(Message::tool_error(call.id, format!("Error: {e}")));
                }
            }
        }

        results
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            config: ExecutorConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self.provider.ok_or_else(|| {
            agent_core::Error::InitializationFailed("Provider not set".to_string())
        })?;
        if self.config.max_iterations == 0 {
            return Err(agent_core::Error::InitializationFailed(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(AgentExecutor::new(provider, self.tool_registry, self.config))
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::testing::{ScriptedProvider, ScriptedReply};
    use agent_tools::Tool;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct QuoteTool;

    #[async_trait]
    impl Tool for QuoteTool {
        async fn execute(&self, params: Value) -> Result<Value> {
            Ok(json!({"ticker": params["ticker"], "close": 227.5}))
        }

        fn name(&self) -> &str {
            "quote"
        }

        fn description(&self) -> &str {
            "Latest close"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
    }

    fn executor(provider: Arc<ScriptedProvider>, max_iterations: usize) -> AgentExecutor {
        AgentExecutor::builder()
            .provider(provider)
            .tool_registry(Arc::new(ToolRegistry::new().with_tool(Arc::new(QuoteTool))))
            .max_iterations(max_iterations)
            .system_prompt("You are a stock analyst")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(AgentExecutorBuilder::new().build().is_err());
    }

    #[test]
    fn test_builder_rejects_zero_iterations() {
        let provider = Arc::new(ScriptedProvider::default());
        let result = AgentExecutor::builder()
            .provider(provider)
            .max_iterations(0)
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_natural_completion_after_tool_use() {
        let provider = Arc::new(ScriptedProvider::new([
            ScriptedReply::tool("quote", json!({"ticker": "AAPL"})),
            ScriptedReply::text("AAPL, price UP"),
        ]));
        let outcome = executor(provider.clone(), 5)
            .run("Analyze AAPL".to_string())
            .await
            .unwrap();

        assert_eq!(outcome.output, "AAPL, price UP");
        assert_eq!(outcome.status, CompletionStatus::Complete);
        assert_eq!(outcome.iterations, 2);

        // Second request carries the tool result
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let tool_result = requests[1].messages.last().unwrap();
        let json = serde_json::to_string(tool_result).unwrap();
        assert!(json.contains("227.5"));
        assert_eq!(requests[0].system.as_deref(), Some("You are a stock analyst"));
    }

    #[tokio::test]
    async fn test_budget_exhaustion_forces_answer() {
        let provider = Arc::new(ScriptedProvider::new([
            ScriptedReply::tool("quote", json!({"ticker": "AAPL"})),
            ScriptedReply::tool("quote", json!({"ticker": "AAPL"})),
            ScriptedReply::text("AAPL, price SIDEWAYS"),
        ]));
        let outcome = executor(provider.clone(), 3)
            .run("Analyze AAPL".to_string())
            .await
            .unwrap();

        assert_eq!(outcome.output, "AAPL, price SIDEWAYS");
        assert_eq!(outcome.status, CompletionStatus::IterationLimit);
        assert_eq!(outcome.iterations, 3);

        let last = provider.requests().pop().unwrap();
        assert_eq!(last.tool_choice, ToolChoice::None);
        assert!(last.last_user_text().unwrap().contains("limit of reasoning steps"));
    }

    #[tokio::test]
    async fn test_tool_calls_on_final_turn_return_best_effort() {
        let provider = Arc::new(ScriptedProvider::new([
            ScriptedReply::ToolCalls(vec![("quote".to_string(), json!({"ticker": "AAPL"}))]),
            ScriptedReply::tool("quote", json!({"ticker": "AAPL"})),
        ]));
        let outcome = executor(provider, 2)
            .run("Analyze AAPL".to_string())
            .await
            .unwrap();

        assert_eq!(outcome.status, CompletionStatus::IterationLimit);
        assert_eq!(outcome.output, "");
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_model() {
        let provider = Arc::new(ScriptedProvider::new([
            ScriptedReply::tool("nonexistent", json!({})),
            ScriptedReply::text("done"),
        ]));
        let outcome = executor(provider.clone(), 5)
            .run("go".to_string())
            .await
            .unwrap();
        assert_eq!(outcome.output, "done");

        let json = serde_json::to_string(&provider.requests()[1].messages).unwrap();
        assert!(json.contains("unknown tool 'nonexistent'"));
    }

    #[tokio::test]
    async fn test_token_limit_is_degraded() {
        let provider = Arc::new(ScriptedProvider::new([ScriptedReply::Truncated(
            "AAPL, price".to_string(),
        )]));
        let outcome = executor(provider, 5).run("go".to_string()).await.unwrap();
        assert_eq!(outcome.status, CompletionStatus::TokenLimit);
        assert_eq!(outcome.output, "AAPL, price");
    }

    #[tokio::test]
    async fn test_provider_failure_is_error() {
        let provider = Arc::new(ScriptedProvider::new([ScriptedReply::Fail(
            "503".to_string(),
        )]));
        let result = executor(provider, 5).run("go".to_string()).await;
        assert!(matches!(result, Err(agent_core::Error::ProcessingFailed(_))));
    }
}
