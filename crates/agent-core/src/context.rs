//! Execution context for agents
//!
//! The `Context` struct is a run-scoped key-value store. The orchestrator
//! seeds it with the run inputs and agents report back through it.

use crate::CompletionStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Ticker symbol the run was started for
    pub const TICKER: &str = "ticker";
    /// Unique id of the pipeline run
    pub const RUN_ID: &str = "run_id";
    /// Date the run started, ISO-8601
    pub const CURRENT_DATE: &str = "current_date";
    /// How the last agent answer came about
    pub const COMPLETION_STATUS: &str = "completion_status";
    /// Number of reasoning iterations the last agent used
    pub const ITERATIONS: &str = "iterations";
}

/// Context passed to agents during execution
///
/// # Example
///
/// ```
/// use agent_core::Context;
///
/// let ctx = Context::new()
///     .with_ticker("AAPL")
///     .with_run_id("run-123");
///
/// assert_eq!(ctx.ticker(), Some("AAPL"));
/// assert_eq!(ctx.run_id(), Some("run-123"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    // =========== Builder Methods ===========

    /// Set the ticker symbol
    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.insert(keys::TICKER, serde_json::json!(ticker.into()));
        self
    }

    /// Set the run id
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.insert(keys::RUN_ID, serde_json::json!(run_id.into()));
        self
    }

    /// Set the current date
    pub fn with_current_date(mut self, date: impl Into<String>) -> Self {
        self.insert(keys::CURRENT_DATE, serde_json::json!(date.into()));
        self
    }

    // =========== Common Accessors ===========

    /// Get the ticker symbol
    pub fn ticker(&self) -> Option<&str> {
        self.get(keys::TICKER).and_then(|v| v.as_str())
    }

    /// Get the run id
    pub fn run_id(&self) -> Option<&str> {
        self.get(keys::RUN_ID).and_then(|v| v.as_str())
    }

    /// Get the current date
    pub fn current_date(&self) -> Option<&str> {
        self.get(keys::CURRENT_DATE).and_then(|v| v.as_str())
    }

    /// Record how the last agent answer came about
    pub fn set_completion_status(&mut self, status: CompletionStatus, iterations: usize) {
        self.insert(
            keys::COMPLETION_STATUS,
            serde_json::to_value(status).unwrap_or(serde_json::Value::Null),
        );
        self.insert(keys::ITERATIONS, serde_json::json!(iterations));
    }

    /// Take the recorded completion status, leaving the context clean for the next agent
    pub fn take_completion_status(&mut self) -> Option<(CompletionStatus, usize)> {
        let status = self
            .remove(keys::COMPLETION_STATUS)
            .and_then(|v| serde_json::from_value(v).ok())?;
        let iterations = self
            .remove(keys::ITERATIONS)
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;
        Some((status, iterations))
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Insert a typed value into the context
    ///
    /// Serializes the value to JSON before storing.
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::ProcessingFailed(format!("Failed to serialize context value: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value from the context
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::ProcessingFailed(format!(
                        "Failed to deserialize context value: {e}"
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value from the context
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy of this context without any per-agent report
    ///
    /// Used to hand the run inputs to a sub-agent.
    pub fn fork(&self) -> Self {
        let mut forked = self.clone();
        forked.remove(keys::COMPLETION_STATUS);
        forked.remove(keys::ITERATIONS);
        forked
    }
}
