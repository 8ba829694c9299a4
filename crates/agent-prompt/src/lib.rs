//! Prompt template management
//!
//! - [`PromptTemplate`]: a named Jinja2 template (MiniJinja), strict about missing variables
//! - [`PromptRegistry`]: thread-safe lookup of templates by name
//! - [`PromptBuilder`]: fluent construction for data-shaped prompts

mod builder;
mod error;
mod registry;
mod template;

pub use builder::PromptBuilder;
pub use error::{PromptError, Result};
pub use registry::PromptRegistry;
pub use template::PromptTemplate;
