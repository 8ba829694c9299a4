//! Stock newsletter pipeline
//!
//! Three agents research one ticker and write a newsletter about it:
//!
//! - a price-trend analyst reads the daily price history
//! - a news-sentiment analyst scores the news of the ticker and a reference asset
//! - a writer turns both reports into a four-section newsletter
//!
//! A supervisor (a manager model, or plain declaration order) decides the
//! dispatch order. Every agent answer is parsed into typed output before the
//! next stage sees it.
//!
//! ```no_run
//! use agent_newsletter::{NewsletterConfig, NewsletterPipeline};
//! use std::sync::Arc;
//!
//! # async fn example() -> agent_newsletter::Result<()> {
//! let config = Arc::new(NewsletterConfig::from_env()?);
//! let pipeline = NewsletterPipeline::from_config(config)?;
//!
//! let run = pipeline.research("AAPL").await?;
//! println!("{}", run.markdown());
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod prompts;
pub mod tools;
pub mod web;

pub use config::{AgentLimits, DEFAULT_REFERENCE_ASSET, LlmSettings, NewsletterConfig, PriceWindow};
pub use engine::{Degradation, NewsletterPipeline, NewsletterRun};
pub use error::{NewsletterError, ParseError, Result, ValidationError};
