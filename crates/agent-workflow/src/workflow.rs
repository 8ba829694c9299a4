//! Workflow definition and execution
//!
//! A [`Workflow`] is a set of agents and a set of tasks with context
//! dependencies. Running it drives the state machine in [`crate::process`]:
//! while tasks remain, the supervisor picks one of the ready tasks, the task's
//! agent runs it with its dependencies' outputs as context, and the output is
//! validated. Retryable failures re-queue the task with the failure reason;
//! anything else aborts the run.

use agent_core::{Agent, CompletionStatus, Context};
use agent_prompt::PromptBuilder;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

use crate::error::{Result, WorkflowError};
use crate::process::{RunState, WorkflowStatus};
use crate::supervisor::{SequentialSupervisor, Supervisor};
use crate::task::{Task, TaskOutput};

/// Default number of dispatches a run may use
pub const DEFAULT_SUPERVISOR_BUDGET: usize = 15;

/// Default attempts per task, including the first
pub const DEFAULT_MAX_TASK_ATTEMPTS: usize = 2;

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct WorkflowOutput {
    /// Task outputs in completion order
    pub outputs: Vec<TaskOutput>,

    /// Dispatches used
    pub supervisor_iterations: usize,

    /// Final run status
    pub status: WorkflowStatus,
}

impl WorkflowOutput {
    /// Output of a task by id
    pub fn get(&self, task: &str) -> Option<&TaskOutput> {
        self.outputs.iter().find(|o| o.task == task)
    }

    /// Output of the last task to complete
    pub fn final_output(&self) -> Option<&TaskOutput> {
        self.outputs.last()
    }

    /// Outputs produced by an agent that stopped early
    pub fn degraded(&self) -> impl Iterator<Item = &TaskOutput> {
        self.outputs.iter().filter(|o| o.status.is_degraded())
    }
}

/// A set of agents working through dependent tasks
///
/// # Example
///
/// ```no_run
/// use agent_workflow::{Task, Workflow};
/// use std::sync::Arc;
///
/// # async fn example(analyst: Arc<dyn agent_core::Agent>, writer: Arc<dyn agent_core::Agent>) -> agent_workflow::Result<()> {
/// let workflow = Workflow::builder()
///     .agent(analyst)
///     .agent(writer)
///     .task(Task::new("trend", "analyst", "Analyse AAPL", "AAPL, price UP|DOWN|SIDEWAYS"))
///     .task(Task::new("letter", "writer", "Write", "A newsletter").with_context(["trend"]))
///     .build()?;
///
/// let mut context = agent_core::Context::new();
/// let output = workflow.run(&mut context).await?;
/// println!("{}", output.final_output().map(|o| o.raw.as_str()).unwrap_or_default());
/// # Ok(())
/// # }
/// ```
pub struct Workflow {
    agents: BTreeMap<String, Arc<dyn Agent>>,
    tasks: Vec<Task>,
    supervisor: Arc<dyn Supervisor>,
    supervisor_budget: usize,
    max_task_attempts: usize,
}

impl Workflow {
    /// Create a new workflow builder
    pub fn builder() -> WorkflowBuilder {
        WorkflowBuilder::new()
    }

    /// Tasks in declaration order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Dispatch budget
    pub fn supervisor_budget(&self) -> usize {
        self.supervisor_budget
    }

    /// Run every task to completion
    ///
    /// Agents receive `context` directly, so run-scoped values (ticker, run
    /// id, date) set by the caller are visible to them.
    pub async fn run(&self, context: &mut Context) -> Result<WorkflowOutput> {
        let mut state = RunState::new(&self.tasks);

        while state.status() == WorkflowStatus::Running {
            let ready = state.ready(&self.tasks);
            if ready.is_empty() {
                state.abort();
                return Err(WorkflowError::Stalled {
                    pending: state.pending_count(),
                });
            }

            if state.iterations() >= self.supervisor_budget {
                state.abort();
                warn!(budget = self.supervisor_budget, "Supervisor budget exhausted");
                return Err(WorkflowError::SupervisorBudgetExhausted {
                    budget: self.supervisor_budget,
                });
            }

            let chosen = if ready.len() == 1 {
                ready[0].id.clone()
            } else {
                let view = state.view(ready.clone(), self.supervisor_budget);
                let choice = match self.supervisor.next_task(&view).await {
                    Ok(choice) => choice,
                    Err(err) => {
                        state.abort();
                        return Err(err);
                    }
                };
                if ready.iter().any(|t| t.id == choice) {
                    choice
                } else {
                    warn!(
                        supervisor = self.supervisor.name(),
                        choice = %choice,
                        "Supervisor chose a task that is not ready"
                    );
                    ready[0].id.clone()
                }
            };

            if let Err(err) = self.dispatch(&chosen, &mut state, context).await {
                state.abort();
                return Err(err);
            }
        }

        let supervisor_iterations = state.iterations();
        let status = state.status();
        info!(iterations = supervisor_iterations, "Workflow done");

        Ok(WorkflowOutput {
            outputs: state.into_outputs(),
            supervisor_iterations,
            status,
        })
    }

    async fn dispatch(&self, id: &str, state: &mut RunState, context: &mut Context) -> Result<()> {
        let Some(task) = self.tasks.iter().find(|t| t.id == id) else {
            return Err(WorkflowError::InvalidWorkflow(format!("unknown task '{id}'")));
        };
        let Some(agent) = self.agents.get(&task.agent) else {
            return Err(WorkflowError::InvalidWorkflow(format!(
                "unknown agent '{}'",
                task.agent
            )));
        };
        let Some((attempt, last_failure)) = state.start(id) else {
            return Err(WorkflowError::InvalidWorkflow(format!("task '{id}' is not pending")));
        };

        let prompt = Self::task_prompt(task, state, last_failure.as_deref());
        let span = info_span!("task", task = %task.id, agent = %task.agent, attempt);

        let result = agent.process(prompt, context).instrument(span).await;
        let (status, iterations) = context
            .take_completion_status()
            .unwrap_or((CompletionStatus::Complete, 0));

        match result.and_then(|raw| task.check(&raw).map(|output| (raw, output))) {
            Ok((raw, output)) => {
                info!(task = %task.id, attempt, iterations, ?status, "Task completed");
                state.complete(TaskOutput {
                    task: task.id.clone(),
                    agent: task.agent.clone(),
                    raw,
                    output,
                    status,
                    iterations,
                    attempts: attempt,
                });
                Ok(())
            }
            Err(err) if err.is_retryable() && attempt < self.max_task_attempts => {
                warn!(task = %task.id, attempt, error = %err, "Task output rejected, retrying");
                state.requeue(id, attempt, err.to_string());
                Ok(())
            }
            Err(err) => {
                warn!(task = %task.id, attempt, error = %err, "Task failed");
                Err(WorkflowError::TaskFailed {
                    task: task.id.clone(),
                    attempts: attempt,
                    source: err,
                })
            }
        }
    }

    fn task_prompt(task: &Task, state: &RunState, last_failure: Option<&str>) -> String {
        let context = task
            .context
            .iter()
            .filter_map(|dep| state.output(dep))
            .map(|output| output.output.trim())
            .collect::<Vec<_>>()
            .join("\n\n----------\n\n");

        let mut prompt = PromptBuilder::new()
            .text(task.description.trim())
            .blank_line()
            .text("This is the expected criteria for your final answer: ")
            .text(task.expected_output.trim())
            .newline()
            .text("You MUST return the actual complete content as the final answer, not a summary.");

        if !context.is_empty() {
            prompt = prompt
                .blank_line()
                .text("This is the context you're working with:")
                .newline()
                .text(context);
        }

        if let Some(failure) = last_failure {
            prompt = prompt
                .blank_line()
                .text("Your previous answer was rejected: ")
                .text(failure)
                .newline()
                .text("Fix the problem and answer again in the expected format.");
        }

        prompt.build()
    }
}

/// Builder for [`Workflow`]
pub struct WorkflowBuilder {
    agents: BTreeMap<String, Arc<dyn Agent>>,
    duplicate_agents: Vec<String>,
    tasks: Vec<Task>,
    supervisor: Arc<dyn Supervisor>,
    supervisor_budget: usize,
    max_task_attempts: usize,
}

impl WorkflowBuilder {
    /// Create a builder with a sequential supervisor and default limits
    pub fn new() -> Self {
        Self {
            agents: BTreeMap::new(),
            duplicate_agents: Vec::new(),
            tasks: Vec::new(),
            supervisor: Arc::new(SequentialSupervisor),
            supervisor_budget: DEFAULT_SUPERVISOR_BUDGET,
            max_task_attempts: DEFAULT_MAX_TASK_ATTEMPTS,
        }
    }

    /// Add an agent, addressed by its name
    pub fn agent(mut self, agent: Arc<dyn Agent>) -> Self {
        let name = agent.name().to_string();
        if self.agents.insert(name.clone(), agent).is_some() {
            self.duplicate_agents.push(name);
        }
        self
    }

    /// Add a task
    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Set the supervisor
    pub fn supervisor(mut self, supervisor: Arc<dyn Supervisor>) -> Self {
        self.supervisor = supervisor;
        self
    }

    /// Set the dispatch budget
    pub fn supervisor_budget(mut self, budget: usize) -> Self {
        self.supervisor_budget = budget;
        self
    }

    /// Set the attempts allowed per task
    pub fn max_task_attempts(mut self, attempts: usize) -> Self {
        self.max_task_attempts = attempts;
        self
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(WorkflowError::InvalidWorkflow(msg));

        if let Some(name) = self.duplicate_agents.first() {
            return invalid(format!("duplicate agent '{name}'"));
        }
        if self.tasks.is_empty() {
            return invalid("no tasks".to_string());
        }
        if self.supervisor_budget == 0 {
            return invalid("supervisor budget must be at least 1".to_string());
        }
        if self.max_task_attempts == 0 {
            return invalid("max task attempts must be at least 1".to_string());
        }

        let mut ids = HashSet::new();
        for task in &self.tasks {
            if !ids.insert(task.id.as_str()) {
                return invalid(format!("duplicate task '{}'", task.id));
            }
            if !self.agents.contains_key(&task.agent) {
                return invalid(format!("task '{}' uses unknown agent '{}'", task.id, task.agent));
            }
        }
        for task in &self.tasks {
            if let Some(dep) = task.context.iter().find(|dep| !ids.contains(dep.as_str())) {
                return invalid(format!("task '{}' depends on unknown task '{dep}'", task.id));
            }
        }

        // Kahn's algorithm; whatever never becomes ready is on a cycle
        let mut done: HashSet<&str> = HashSet::new();
        loop {
            let next: Vec<&str> = self
                .tasks
                .iter()
                .filter(|t| !done.contains(t.id.as_str()))
                .filter(|t| t.context.iter().all(|dep| done.contains(dep.as_str())))
                .map(|t| t.id.as_str())
                .collect();
            if next.is_empty() {
                break;
            }
            done.extend(next);
        }
        if let Some(task) = self.tasks.iter().find(|t| !done.contains(t.id.as_str())) {
            return invalid(format!("task '{}' is part of a dependency cycle", task.id));
        }

        Ok(())
    }

    /// Validate and build the workflow
    pub fn build(self) -> Result<Workflow> {
        self.validate()?;
        Ok(Workflow {
            agents: self.agents,
            tasks: self.tasks,
            supervisor: self.supervisor,
            supervisor_budget: self.supervisor_budget,
            max_task_attempts: self.max_task_attempts,
        })
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}
