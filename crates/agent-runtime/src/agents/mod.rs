//! Concrete agent implementations
//!
//! - ToolAgent: persona-driven agent with the bounded tool loop
//! - SimpleAgent: single completion, no tools
//! - DelegateWorkTool: hands work from one agent to its coworkers

pub mod delegate;
pub mod persona;
pub mod simple;
pub mod tool;

pub use delegate::{DELEGATE_TOOL_NAME, DelegateWorkTool};
pub use persona::Persona;
pub use simple::{SimpleAgent, SimpleConfig};
pub use tool::ToolAgent;
