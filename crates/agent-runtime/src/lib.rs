//! Agent runtime: the bounded executor loop, personas, and agent factories

pub mod agents;
pub mod executor;
pub mod runtime;

pub use agents::{
    DELEGATE_TOOL_NAME, DelegateWorkTool, Persona, SimpleAgent, SimpleConfig, ToolAgent,
};
pub use executor::{AgentExecutor, AgentExecutorBuilder, ExecutionOutcome, ExecutorConfig};
pub use runtime::{AgentRuntime, AgentRuntimeBuilder, RuntimeConfig};
