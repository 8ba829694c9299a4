//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Agent initialization failed
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// A tool invocation failed
    #[error("Tool '{tool}' failed: {reason}")]
    ToolFailed { tool: String, reason: String },

    /// The agent answered, but not in the expected shape
    #[error("Malformed output from '{agent}': {reason}")]
    MalformedOutput { agent: String, reason: String },
}

impl Error {
    /// Whether another attempt at the same work could succeed
    ///
    /// Only malformed output is retryable: the model may comply on a second
    /// try, while transport or data failures will not change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MalformedOutput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        let malformed = Error::MalformedOutput {
            agent: "writer".to_string(),
            reason: "missing conclusion".to_string(),
        };
        assert!(malformed.is_retryable());
        assert!(!Error::ProcessingFailed("boom".to_string()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = Error::ToolFailed {
            tool: "duckduckgo_news".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Tool 'duckduckgo_news' failed: timeout");
    }
}
