//! Newsletter engine: runs the three-agent workflow for one ticker

pub mod pipeline;
pub mod result;

pub use pipeline::{NewsletterPipeline, NewsletterPipelineBuilder};
pub use result::{Degradation, NewsletterRun};
