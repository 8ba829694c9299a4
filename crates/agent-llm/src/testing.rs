//! Scripted provider for exercising agent loops without a network
//!
//! Enabled with the `testing` feature. Each call to
//! [`LLMProvider::complete`] pops the next scripted response and records the
//! request, so tests can assert both what the agents said and what they were asked.

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message, Result,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A finished text answer
    Text(String),
    /// A text answer cut at the token limit
    Truncated(String),
    /// One or more tool calls as `(name, input)` pairs
    ToolCalls(Vec<(String, Value)>),
    /// A provider failure
    Fail(String),
}

impl ScriptedReply {
    /// Finished text answer
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Single tool call
    pub fn tool(name: impl Into<String>, input: Value) -> Self {
        Self::ToolCalls(vec![(name.into(), input)])
    }
}

/// Provider that replays a fixed script
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    /// Create a provider that answers with `replies` in order
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of replies not consumed yet
    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let call_index = {
            let mut requests = self
                .requests
                .lock()
                .map_err(|e| LLMError::ProviderError(e.to_string()))?;
            requests.push(request);
            requests.len()
        };

        let reply = self
            .replies
            .lock()
            .map_err(|e| LLMError::ProviderError(e.to_string()))?
            .pop_front()
            .ok_or_else(|| {
                LLMError::ProviderError(format!("script exhausted at call {call_index}"))
            })?;

        let (message, stop_reason) = match reply {
            ScriptedReply::Text(text) => (Message::assistant(text), StopReason::EndTurn),
            ScriptedReply::Truncated(text) => (Message::assistant(text), StopReason::MaxTokens),
            ScriptedReply::ToolCalls(calls) => {
                let blocks = calls
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, input))| ContentBlock::ToolUse {
                        id: format!("call_{call_index}_{i}"),
                        name,
                        input,
                    })
                    .collect();
                (Message::assistant_blocks(blocks), StopReason::ToolUse)
            }
            ScriptedReply::Fail(reason) => return Err(LLMError::RequestFailed(reason)),
        };

        Ok(CompletionResponse {
            message,
            stop_reason,
            usage: TokenUsage::default(),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> CompletionRequest {
        CompletionRequest::builder("test")
            .add_message(Message::user("hi"))
            .build()
    }

    #[tokio::test]
    async fn test_replays_in_order() {
        let provider = ScriptedProvider::new([
            ScriptedReply::tool("duckduckgo_news", json!({"asset": "BTC"})),
            ScriptedReply::text("done"),
        ]);

        let first = provider.complete(request()).await.unwrap();
        assert_eq!(first.stop_reason, StopReason::ToolUse);
        assert_eq!(first.message.tool_calls()[0].name, "duckduckgo_news");

        let second = provider.complete(request()).await.unwrap();
        assert_eq!(second.message.text().as_deref(), Some("done"));

        assert_eq!(provider.requests().len(), 2);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_script_errors() {
        let provider = ScriptedProvider::default();
        let err = provider.complete(request()).await.unwrap_err();
        assert!(err.to_string().contains("script exhausted"));
    }
}
