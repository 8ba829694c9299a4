//! Delegation tool: lets an agent hand a piece of work to a coworker agent

use agent_core::{Agent, Context, Error, Result};
use agent_llm::tools::schema;
use agent_prompt::PromptBuilder;
use agent_tools::{Tool, optional_str, required_str};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Name under which the delegation tool is registered
pub const DELEGATE_TOOL_NAME: &str = "delegate_work";

/// Tool that forwards a task to one of a fixed set of coworkers
///
/// Coworkers are addressed by agent name or by role, case-insensitively.
/// Each delegated call runs the coworker with its own iteration budget and a
/// fork of the caller's run context.
pub struct DelegateWorkTool {
    coworkers: BTreeMap<String, Arc<dyn Agent>>,
    context: Context,
    description: String,
}

impl DelegateWorkTool {
    pub fn new(coworkers: impl IntoIterator<Item = Arc<dyn Agent>>, context: Context) -> Self {
        let coworkers: BTreeMap<String, Arc<dyn Agent>> = coworkers
            .into_iter()
            .map(|agent| (agent.name().to_string(), agent))
            .collect();

        let roster = coworkers
            .values()
            .map(|agent| match agent.description() {
                "" => agent.name().to_string(),
                role => format!("{} ({role})", agent.name()),
            })
            .collect::<Vec<_>>()
            .join(", ");

        let description = format!(
            "Delegate a specific task to one of the following coworkers: {roster}. \
             Provide the coworker, the task, and all the context they need, \
             since they know nothing about your work."
        );

        Self {
            coworkers,
            context,
            description,
        }
    }

    fn find(&self, wanted: &str) -> Option<&Arc<dyn Agent>> {
        let wanted = wanted.trim();
        self.coworkers.values().find(|agent| {
            agent.name().eq_ignore_ascii_case(wanted)
                || agent.description().eq_ignore_ascii_case(wanted)
        })
    }
}

#[async_trait]
impl Tool for DelegateWorkTool {
    async fn execute(&self, params: Value) -> Result<Value> {
        let coworker = required_str(DELEGATE_TOOL_NAME, &params, "coworker")?;
        let task = required_str(DELEGATE_TOOL_NAME, &params, "task")?;
        let extra = optional_str(&params, "context");

        let agent = self.find(coworker).ok_or_else(|| Error::ToolFailed {
            tool: DELEGATE_TOOL_NAME.to_string(),
            reason: format!(
                "unknown coworker '{coworker}', choose one of: {}",
                self.coworkers.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        })?;

        info!(coworker = %agent.name(), "Delegating work");

        let prompt = PromptBuilder::new()
            .text(task)
            .when(extra.is_some(), "\n\nThis is the context you're working with:\n")
            .text(extra.unwrap_or_default())
            .build();

        let mut context = self.context.fork();
        let answer = agent.process(prompt, &mut context).await?;

        Ok(json!({
            "coworker": agent.name(),
            "answer": answer,
        }))
    }

    fn name(&self) -> &str {
        DELEGATE_TOOL_NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        let names: Vec<&str> = self.coworkers.keys().map(String::as_str).collect();
        schema::object(
            json!({
                "coworker": schema::string_enum("Name of the coworker to delegate to", &names),
                "task": schema::string("The task to delegate"),
                "context": schema::string("Everything the coworker needs to know to do the task"),
            }),
            &["coworker", "task"],
        )
    }
}
