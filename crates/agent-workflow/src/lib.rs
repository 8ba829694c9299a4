//! Task orchestration for agent crews
//!
//! A [`Workflow`] runs dependent tasks across several agents. Dispatch order
//! among ready tasks is chosen by a [`Supervisor`]: declaration order for
//! [`Process::Sequential`], or a manager model for [`Process::Hierarchical`].

pub mod error;
pub mod process;
pub mod supervisor;
pub mod task;
pub mod workflow;

pub use error::{Result, WorkflowError};
pub use process::{Process, ReadyTask, RunView, TaskState, WorkflowStatus};
pub use supervisor::{LlmSupervisor, MANAGER_SYSTEM_PROMPT, SequentialSupervisor, Supervisor};
pub use task::{OutputValidator, Task, TaskOutput};
pub use workflow::{
    DEFAULT_MAX_TASK_ATTEMPTS, DEFAULT_SUPERVISOR_BUDGET, Workflow, WorkflowBuilder, WorkflowOutput,
};
