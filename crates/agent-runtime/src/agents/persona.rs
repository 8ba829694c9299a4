//! Agent personas: who an agent is, what it wants, where it comes from

use agent_prompt::PromptBuilder;
use serde::{Deserialize, Serialize};

/// Role, goal and backstory of an agent
///
/// The persona becomes the agent's system prompt. `name` is the stable key
/// used by workflows and delegation; `role` is what the model reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
        }
    }

    /// System prompt for this persona
    pub fn system_prompt(&self, can_delegate: bool) -> String {
        PromptBuilder::new()
            .text(format!("You are {}.", self.role.trim()))
            .newline()
            .text(self.backstory.trim())
            .blank_line()
            .text(format!("Your personal goal is: {}", self.goal.trim()))
            .when(
                can_delegate,
                "\n\nYou can delegate work to your coworkers with the delegate_work tool \
                 when they are better placed to answer part of the task.",
            )
            .blank_line()
            .text("When you have the final answer, reply with it directly and completely.")
            .build()
    }
}
