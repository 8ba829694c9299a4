//! Tool framework for the newsletter agents
//!
//! Tools are the functions an agent may call during its reasoning loop.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, optional_str, required_str};
