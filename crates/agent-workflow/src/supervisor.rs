//! Supervisors decide which ready task runs next

use agent_core::{Agent, Context};
use agent_prompt::PromptBuilder;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Result, WorkflowError};
use crate::process::{ReadyTask, RunView};

/// Chooses the next task to dispatch
///
/// Only consulted when more than one task is ready. The returned id should be
/// one of `view.ready`; the workflow falls back to the first ready task
/// otherwise.
#[async_trait]
pub trait Supervisor: Send + Sync {
    /// Pick the id of the next task
    async fn next_task(&self, view: &RunView) -> Result<String>;

    /// Supervisor name, for logs
    fn name(&self) -> &str;
}

fn first_ready(view: &RunView) -> Result<String> {
    view.ready
        .first()
        .map(|task| task.id.clone())
        .ok_or(WorkflowError::Stalled { pending: 0 })
}

/// Dispatches ready tasks in declaration order
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialSupervisor;

#[async_trait]
impl Supervisor for SequentialSupervisor {
    async fn next_task(&self, view: &RunView) -> Result<String> {
        first_ready(view)
    }

    fn name(&self) -> &str {
        "sequential"
    }
}

/// System prompt for the manager model
pub const MANAGER_SYSTEM_PROMPT: &str = "You are a crew manager. You coordinate a team of \
analysts and decide which of their tasks should be worked on next so the team delivers a \
complete, high quality result. Reply with the id of exactly one task and nothing else.";

/// Asks a manager model which ready task to run next
pub struct LlmSupervisor {
    manager: Arc<dyn Agent>,
}

impl LlmSupervisor {
    /// Create a supervisor backed by `manager`
    pub fn new(manager: Arc<dyn Agent>) -> Self {
        Self { manager }
    }

    fn prompt(view: &RunView) -> String {
        let ready = view.ready.iter().map(|task| {
            let retry = if task.attempts > 0 {
                format!(" (retry, {} failed attempt(s))", task.attempts)
            } else {
                String::new()
            };
            format!("{} [agent: {}]{}: {}", task.id, task.agent, retry, task.description)
        });

        let completed = if view.completed.is_empty() {
            "none".to_string()
        } else {
            view.completed.join(", ")
        };

        PromptBuilder::new()
            .text("These tasks are ready to be worked on:")
            .newline()
            .bullets(ready)
            .newline()
            .field("Completed tasks", completed)
            .field(
                "Supervisory iteration",
                format!("{} of {}", view.iteration + 1, view.budget),
            )
            .newline()
            .text("Which task should be done next? Answer with the task id only.")
            .build()
    }

    /// Find the ready task named in the reply
    ///
    /// An exact id wins; otherwise the longest id mentioned anywhere.
    fn parse_choice<'a>(reply: &str, ready: &'a [ReadyTask]) -> Option<&'a ReadyTask> {
        let cleaned = reply.trim().trim_matches(|c: char| c == '`' || c == '"' || c == '\'' || c == '.');
        if let Some(task) = ready.iter().find(|t| t.id.eq_ignore_ascii_case(cleaned)) {
            return Some(task);
        }
        let lower = reply.to_lowercase();
        ready
            .iter()
            .filter(|t| lower.contains(&t.id.to_lowercase()))
            .max_by_key(|t| t.id.len())
    }
}

#[async_trait]
impl Supervisor for LlmSupervisor {
    async fn next_task(&self, view: &RunView) -> Result<String> {
        let mut context = Context::new();
        let reply = self
            .manager
            .process(Self::prompt(view), &mut context)
            .await
            .map_err(WorkflowError::Supervisor)?;

        match Self::parse_choice(&reply, &view.ready) {
            Some(task) => {
                debug!(task = %task.id, "Manager chose task");
                Ok(task.id.clone())
            }
            None => {
                warn!(reply = %reply.trim(), "Manager reply named no ready task, using declaration order");
                first_ready(view)
            }
        }
    }

    fn name(&self) -> &str {
        self.manager.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::testing::{ScriptedProvider, ScriptedReply};
    use agent_runtime::{SimpleAgent, SimpleConfig};

    fn view() -> RunView {
        let ready = |id: &str| ReadyTask {
            id: id.to_string(),
            agent: format!("{id}_agent"),
            description: format!("do {id}"),
            attempts: 0,
        };
        RunView {
            ready: vec![ready("price_trend"), ready("news_sentiment")],
            completed: Vec::new(),
            iteration: 0,
            budget: 15,
        }
    }

    fn manager(replies: Vec<ScriptedReply>) -> (Arc<ScriptedProvider>, LlmSupervisor) {
        let provider = Arc::new(ScriptedProvider::new(replies));
        let agent = SimpleAgent::new(provider.clone(), SimpleConfig::default(), "manager");
        (provider, LlmSupervisor::new(Arc::new(agent)))
    }

    #[tokio::test]
    async fn test_sequential_picks_first_ready() {
        assert_eq!(SequentialSupervisor.next_task(&view()).await.unwrap(), "price_trend");
    }

    #[tokio::test]
    async fn test_llm_supervisor_follows_manager() {
        let (provider, supervisor) = manager(vec![ScriptedReply::text("`news_sentiment`")]);
        assert_eq!(supervisor.next_task(&view()).await.unwrap(), "news_sentiment");

        let prompt = provider.requests()[0].last_user_text().unwrap_or_default();
        assert!(prompt.contains("price_trend [agent: price_trend_agent]: do price_trend"));
        assert!(prompt.contains("Supervisory iteration: 1 of 15"));
    }

    #[tokio::test]
    async fn test_llm_supervisor_finds_id_in_prose() {
        let (_, supervisor) =
            manager(vec![ScriptedReply::text("Let's start with news_sentiment first.")]);
        assert_eq!(supervisor.next_task(&view()).await.unwrap(), "news_sentiment");
    }

    #[tokio::test]
    async fn test_llm_supervisor_falls_back() {
        let (_, supervisor) = manager(vec![ScriptedReply::text("I am not sure")]);
        assert_eq!(supervisor.next_task(&view()).await.unwrap(), "price_trend");
    }

    #[tokio::test]
    async fn test_llm_supervisor_propagates_provider_failure() {
        let (_, supervisor) = manager(vec![ScriptedReply::Fail("connection reset".to_string())]);
        let err = supervisor.next_task(&view()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Supervisor(_)));
    }
}
