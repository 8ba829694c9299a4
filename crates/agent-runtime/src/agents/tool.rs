//! Tool agent implementation (wraps AgentExecutor)

use crate::agents::Persona;
use crate::executor::AgentExecutor;
use agent_core::{Agent, Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

/// An agent that runs the bounded LLM loop with its own tools
///
/// After each run the completion status is written into the [`Context`], so
/// the caller can tell a natural answer from a best-effort one.
pub struct ToolAgent {
    executor: AgentExecutor,
    persona: Persona,
}

impl ToolAgent {
    /// Create a new tool agent
    pub fn new(executor: AgentExecutor, persona: Persona) -> Self {
        Self { executor, persona }
    }

    /// Agent persona
    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Get a reference to the underlying executor
    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }
}

#[async_trait]
impl Agent for ToolAgent {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        info!(agent = %self.persona.name, run_id = ?context.run_id(), "Agent started");

        let outcome = self.executor.run(input).await?;
        context.set_completion_status(outcome.status, outcome.iterations);

        if outcome.status.is_degraded() {
            warn!(
                agent = %self.persona.name,
                status = ?outcome.status,
                iterations = outcome.iterations,
                "Agent returned a best-effort answer"
            );
        }

        Ok(outcome.output)
    }

    fn name(&self) -> &str {
        &self.persona.name
    }

    fn description(&self) -> &str {
        &self.persona.role
    }
}
