//! Dispatch process and the run state machine
//!
//! A run keeps one [`TaskState`] per task. Tasks move
//! `Pending -> Running -> Completed`, or back to `Pending` when a retryable
//! failure re-queues them. The run itself is `Running` until every task has
//! completed (`Done`) or a failure ends it (`Aborted`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::task::{Task, TaskOutput};

/// How the next task is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    /// Ready tasks run in declaration order
    Sequential,

    /// A manager model picks among the ready tasks
    #[default]
    Hierarchical,
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

impl FromStr for Process {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "hierarchical" => Ok(Self::Hierarchical),
            other => Err(format!(
                "unknown process '{other}', expected 'sequential' or 'hierarchical'"
            )),
        }
    }
}

/// State of a single task within a run
#[derive(Debug, Clone)]
pub enum TaskState {
    /// Waiting to run; `attempts` counts previous failed attempts
    Pending {
        attempts: usize,
        last_failure: Option<String>,
    },

    /// Dispatched; `attempt` is 1-based
    Running { attempt: usize },

    /// Finished with an accepted output
    Completed(TaskOutput),
}

/// Run-level status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running,
    Done,
    Aborted,
}

/// A task that can be dispatched now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyTask {
    pub id: String,
    pub agent: String,
    pub description: String,
    pub attempts: usize,
}

/// What a supervisor sees when choosing the next task
#[derive(Debug, Clone)]
pub struct RunView {
    /// Tasks whose dependencies are complete, in declaration order
    pub ready: Vec<ReadyTask>,

    /// Ids of completed tasks, in completion order
    pub completed: Vec<String>,

    /// Dispatches used so far
    pub iteration: usize,

    /// Total dispatch budget
    pub budget: usize,
}

/// Mutable state of one workflow run
#[derive(Debug)]
pub(crate) struct RunState {
    ids: Vec<String>,
    states: Vec<TaskState>,
    completion_order: Vec<usize>,
    status: WorkflowStatus,
    iterations: usize,
}

impl RunState {
    pub(crate) fn new(tasks: &[Task]) -> Self {
        Self {
            ids: tasks.iter().map(|t| t.id.clone()).collect(),
            states: tasks
                .iter()
                .map(|_| TaskState::Pending {
                    attempts: 0,
                    last_failure: None,
                })
                .collect(),
            completion_order: Vec::new(),
            status: WorkflowStatus::Running,
            iterations: 0,
        }
    }

    fn index(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|t| t == id)
    }

    pub(crate) fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub(crate) fn iterations(&self) -> usize {
        self.iterations
    }

    pub(crate) fn state(&self, id: &str) -> Option<&TaskState> {
        self.index(id).map(|i| &self.states[i])
    }

    pub(crate) fn is_completed(&self, id: &str) -> bool {
        matches!(self.state(id), Some(TaskState::Completed(_)))
    }

    pub(crate) fn output(&self, id: &str) -> Option<&TaskOutput> {
        match self.state(id) {
            Some(TaskState::Completed(output)) => Some(output),
            _ => None,
        }
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| !matches!(s, TaskState::Completed(_)))
            .count()
    }

    /// Pending tasks whose dependencies have all completed
    pub(crate) fn ready(&self, tasks: &[Task]) -> Vec<ReadyTask> {
        tasks
            .iter()
            .zip(&self.states)
            .filter_map(|(task, state)| match state {
                TaskState::Pending { attempts, .. }
                    if task.context.iter().all(|dep| self.is_completed(dep)) =>
                {
                    Some(ReadyTask {
                        id: task.id.clone(),
                        agent: task.agent.clone(),
                        description: task.description.clone(),
                        attempts: *attempts,
                    })
                }
                _ => None,
            })
            .collect()
    }

    pub(crate) fn view(&self, ready: Vec<ReadyTask>, budget: usize) -> RunView {
        RunView {
            ready,
            completed: self
                .completion_order
                .iter()
                .map(|&i| self.ids[i].clone())
                .collect(),
            iteration: self.iterations,
            budget,
        }
    }

    /// Consume one dispatch and mark the task running
    ///
    /// Returns the 1-based attempt number and the previous failure, if any.
    pub(crate) fn start(&mut self, id: &str) -> Option<(usize, Option<String>)> {
        let i = self.index(id)?;
        let TaskState::Pending {
            attempts,
            last_failure,
        } = &self.states[i]
        else {
            return None;
        };
        let attempt = attempts + 1;
        let last_failure = last_failure.clone();
        self.states[i] = TaskState::Running { attempt };
        self.iterations += 1;
        Some((attempt, last_failure))
    }

    pub(crate) fn complete(&mut self, output: TaskOutput) {
        if let Some(i) = self.index(&output.task) {
            self.states[i] = TaskState::Completed(output);
            self.completion_order.push(i);
        }
        if self.pending_count() == 0 {
            self.status = WorkflowStatus::Done;
        }
    }

    pub(crate) fn requeue(&mut self, id: &str, attempts: usize, failure: String) {
        if let Some(i) = self.index(id) {
            self.states[i] = TaskState::Pending {
                attempts,
                last_failure: Some(failure),
            };
        }
    }

    pub(crate) fn abort(&mut self) {
        self.status = WorkflowStatus::Aborted;
    }

    pub(crate) fn into_outputs(self) -> Vec<TaskOutput> {
        let mut states: Vec<Option<TaskState>> = self.states.into_iter().map(Some).collect();
        self.completion_order
            .iter()
            .filter_map(|&i| match states[i].take() {
                Some(TaskState::Completed(output)) => Some(output),
                _ => None,
            })
            .collect()
    }
}
