//! Tasks and their outputs

use agent_core::CompletionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Checks a raw task output before the task counts as completed
///
/// Returns the accepted output, which may be a normalised rendering of the
/// raw answer; dependent tasks see the accepted text. Return
/// [`agent_core::Error::MalformedOutput`] to have the task retried.
pub type OutputValidator = Arc<dyn Fn(&str) -> agent_core::Result<String> + Send + Sync>;

/// A unit of work for one agent
#[derive(Clone)]
pub struct Task {
    /// Unique id within the workflow
    pub id: String,

    /// Name of the agent that runs the task
    pub agent: String,

    /// What to do
    pub description: String,

    /// What the final answer must look like
    pub expected_output: String,

    /// Ids of tasks whose outputs are passed in as context
    pub context: Vec<String>,

    validator: Option<OutputValidator>,
}

impl Task {
    /// Create a task with no dependencies
    pub fn new(
        id: impl Into<String>,
        agent: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            agent: agent.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            context: Vec::new(),
            validator: None,
        }
    }

    /// Depend on the outputs of other tasks
    pub fn with_context<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.extend(tasks.into_iter().map(Into::into));
        self
    }

    /// Validate the raw output before accepting it
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> agent_core::Result<String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Run the validator, if any, returning the accepted output
    pub fn check(&self, raw: &str) -> agent_core::Result<String> {
        match &self.validator {
            Some(validator) => validator(raw),
            None => Ok(raw.to_string()),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("agent", &self.agent)
            .field("context", &self.context)
            .field("validated", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

/// The accepted output of a completed task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Task id
    pub task: String,

    /// Agent that produced the output
    pub agent: String,

    /// Raw text returned by the agent
    pub raw: String,

    /// Accepted output, as passed to dependent tasks
    pub output: String,

    /// How the agent's loop ended
    pub status: CompletionStatus,

    /// LLM iterations used by the accepted attempt
    pub iterations: usize,

    /// Attempts needed, including the accepted one
    pub attempts: usize,
}
