//! Core abstractions for the newsletter agents
//!
//! This crate defines the fundamental traits and types shared by every other
//! crate in the workspace.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::{Agent, CompletionStatus};
pub use context::Context;
pub use error::{Error, Result};
