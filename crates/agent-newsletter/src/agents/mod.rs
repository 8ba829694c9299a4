//! The three newsletter agents and the checks on their answers
//!
//! Each stage module builds its agent through the shared
//! [`agent_runtime::AgentRuntime`] and provides the validator that turns the
//! agent's text into typed output.

pub mod news_sentiment;
pub mod newsletter_writer;
pub mod price_trend;

use std::fmt;

pub use news_sentiment::{news_analyst, sentiment_validator};
pub use newsletter_writer::{newsletter_validator, newsletter_writer};
pub use price_trend::{price_analyst, trend_validator};

/// A pipeline stage, one task for one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    PriceTrend,
    NewsSentiment,
    Newsletter,
}

impl Stage {
    /// Stages in declaration order
    pub const ALL: [Stage; 3] = [Stage::PriceTrend, Stage::NewsSentiment, Stage::Newsletter];

    /// Workflow task id
    pub fn task_id(self) -> &'static str {
        match self {
            Self::PriceTrend => "price_trend",
            Self::NewsSentiment => "news_sentiment",
            Self::Newsletter => "newsletter",
        }
    }

    /// Name of the agent running the stage
    pub fn agent_name(self) -> &'static str {
        match self {
            Self::PriceTrend => "price_analyst",
            Self::NewsSentiment => "news_analyst",
            Self::Newsletter => "newsletter_writer",
        }
    }

    /// Stage for a workflow task id
    pub fn from_task_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.task_id() == id)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.task_id())
    }
}
