//! Runtime for building agents against one shared provider
//!
//! The AgentRuntime holds the LLM provider and model defaults. Every agent it
//! builds gets its own tool registry, so agents never see each other's tools.

use agent_core::{Agent, Context, Result};
use agent_llm::LLMProvider;
use agent_tools::ToolRegistry;
use std::sync::Arc;

use crate::agents::{DelegateWorkTool, Persona, SimpleAgent, SimpleConfig, ToolAgent};
use crate::executor::{AgentExecutor, ExecutorConfig};

/// Model defaults shared by all agents of a runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Model to use
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 2048,
            temperature: Some(0.7),
        }
    }
}

/// Factory for agents sharing a provider
///
/// ```no_run
/// use agent_runtime::{AgentRuntime, Persona};
/// use agent_tools::ToolRegistry;
///
/// # fn example(provider: std::sync::Arc<dyn agent_llm::LLMProvider>) -> agent_core::Result<()> {
/// let runtime = AgentRuntime::builder().provider(provider).build()?;
///
/// let analyst = runtime.tool_agent(
///     Persona::new("price_trend", "Senior Stock Price Analyst", "Find trends", "Experienced"),
///     5,
///     ToolRegistry::new(),
/// );
/// # Ok(())
/// # }
/// ```
pub struct AgentRuntime {
    provider: Arc<dyn LLMProvider>,
    config: RuntimeConfig,
}

impl AgentRuntime {
    /// Create a new agent runtime
    pub fn new(provider: Arc<dyn LLMProvider>, config: RuntimeConfig) -> Self {
        Self { provider, config }
    }

    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    /// Get a reference to the LLM provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Get a reference to the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    fn executor_config(&self, persona: &Persona, max_iterations: usize, can_delegate: bool) -> ExecutorConfig {
        ExecutorConfig {
            max_iterations,
            model: self.config.model.clone(),
            system_prompt: Some(persona.system_prompt(can_delegate)),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Create a tool-using agent that cannot delegate
    pub fn tool_agent(&self, persona: Persona, max_iterations: usize, tools: ToolRegistry) -> ToolAgent {
        let config = self.executor_config(&persona, max_iterations, false);
        let executor = AgentExecutor::new(self.provider.clone(), Arc::new(tools), config);
        ToolAgent::new(executor, persona)
    }

    /// Create a tool-using agent that may delegate work to `coworkers`
    ///
    /// The delegation tool is added to `tools`; delegated runs get a fork of `context`.
    pub fn delegating_agent(
        &self,
        persona: Persona,
        max_iterations: usize,
        tools: ToolRegistry,
        coworkers: Vec<Arc<dyn Agent>>,
        context: &Context,
    ) -> ToolAgent {
        let can_delegate = !coworkers.is_empty();
        if can_delegate {
            tools.register(Arc::new(DelegateWorkTool::new(coworkers, context.fork())));
        }
        let config = self.executor_config(&persona, max_iterations, can_delegate);
        let executor = AgentExecutor::new(self.provider.clone(), Arc::new(tools), config);
        ToolAgent::new(executor, persona)
    }

    /// Create a single-completion agent
    pub fn simple_agent(&self, name: impl Into<String>, system_prompt: impl Into<String>) -> SimpleAgent {
        let config = SimpleConfig {
            model: self.config.model.clone(),
            system_prompt: system_prompt.into(),
            max_tokens: 256,
            temperature: 0.0,
        };
        SimpleAgent::new(self.provider.clone(), config, name)
    }
}

/// Builder for AgentRuntime
pub struct AgentRuntimeBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    config: RuntimeConfig,
}

impl AgentRuntimeBuilder {
    /// Create a new runtime builder
    pub fn new() -> Self {
        Self {
            provider: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<AgentRuntime> {
        let provider = self.provider.ok_or_else(|| {
            agent_core::Error::InitializationFailed("Provider not set".to_string())
        })?;

        Ok(AgentRuntime::new(provider, self.config))
    }
}

impl Default for AgentRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
