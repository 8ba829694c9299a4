//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How an agent's final answer came about
///
/// Anything other than [`CompletionStatus::Complete`] is a soft degradation:
/// the answer is the agent's best effort and callers decide whether to accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// The model ended its turn on its own
    #[default]
    Complete,
    /// The iteration budget ran out while the agent was still working
    IterationLimit,
    /// The completion was cut at the token limit
    TokenLimit,
}

impl CompletionStatus {
    /// Whether the answer is a best-effort degradation
    pub fn is_degraded(self) -> bool {
        !matches!(self, Self::Complete)
    }
}

/// Core trait that all agents must implement
///
/// Input and output are plain text. Agents that produce structured data
/// leave parsing to the caller, which owns the typed contract.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process input and return output
    ///
    /// Implementations may record a [`CompletionStatus`] in the context
    /// (see [`Context::set_completion_status`]) when the answer is degraded.
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Get the agent's name
    fn name(&self) -> &str;

    /// Short description of what the agent is good at
    ///
    /// Used when other agents pick a coworker to delegate to.
    fn description(&self) -> &str {
        ""
    }
}
