//! Error types for agent-workflow

use thiserror::Error;

/// Result type alias for agent-workflow
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors raised while building or running a workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The workflow definition is inconsistent
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// The supervisor used up its dispatch budget before every task completed
    #[error("Supervisor budget of {budget} iterations exhausted")]
    SupervisorBudgetExhausted { budget: usize },

    /// A task failed and could not be recovered
    #[error("Task '{task}' failed after {attempts} attempt(s): {source}")]
    TaskFailed {
        task: String,
        attempts: usize,
        #[source]
        source: agent_core::Error,
    },

    /// The supervisor itself failed
    #[error("Supervisor failed: {0}")]
    Supervisor(#[source] agent_core::Error),

    /// Pending tasks remain but none is ready to run
    #[error("Workflow stalled: {pending} task(s) pending, none ready")]
    Stalled { pending: usize },
}

impl WorkflowError {
    /// The agent-level cause, when a task or the supervisor failed
    pub fn agent_error(&self) -> Option<&agent_core::Error> {
        match self {
            Self::TaskFailed { source, .. } | Self::Supervisor(source) => Some(source),
            _ => None,
        }
    }
}

impl From<WorkflowError> for agent_core::Error {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::TaskFailed { source, .. } | WorkflowError::Supervisor(source) => source,
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}
