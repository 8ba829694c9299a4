//! Result of one pipeline run

use agent_core::CompletionStatus;
use agent_workflow::TaskOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::model::{Newsletter, PriceSummary, SentimentReport, TrendAnalysis};

/// A soft failure: the run succeeded, but a stage gave a best-effort answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// The agent ran out of iterations and was forced to answer
    AgentIterationExhausted { stage: String, iterations: usize },

    /// The model stopped at the token limit
    TokenLimit { stage: String },
}

impl Degradation {
    /// Degradation recorded for a task output, if any
    pub fn from_output(output: &TaskOutput) -> Option<Self> {
        match output.status {
            CompletionStatus::Complete => None,
            CompletionStatus::IterationLimit => Some(Self::AgentIterationExhausted {
                stage: output.task.clone(),
                iterations: output.iterations,
            }),
            CompletionStatus::TokenLimit => Some(Self::TokenLimit {
                stage: output.task.clone(),
            }),
        }
    }

    pub fn stage(&self) -> &str {
        match self {
            Self::AgentIterationExhausted { stage, .. } | Self::TokenLimit { stage } => stage,
        }
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AgentIterationExhausted { stage, iterations } => write!(
                f,
                "The {stage} stage used all {iterations} iterations; its answer is a best effort."
            ),
            Self::TokenLimit { stage } => {
                write!(f, "The {stage} stage hit the token limit; its answer may be cut short.")
            }
        }
    }
}

/// Everything one successful run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterRun {
    pub run_id: Uuid,
    pub ticker: String,
    /// Requested ticker plus the reference asset
    pub assets: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub price_summary: PriceSummary,
    pub trend: TrendAnalysis,
    pub sentiment: SentimentReport,
    pub newsletter: Newsletter,
    /// Dispatches the supervisor made
    pub supervisor_iterations: usize,
    pub degradations: Vec<Degradation>,
}

impl NewsletterRun {
    /// The newsletter as written
    pub fn markdown(&self) -> &str {
        &self.newsletter.markdown
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(status: CompletionStatus) -> TaskOutput {
        TaskOutput {
            task: "price_trend".to_string(),
            agent: "price_analyst".to_string(),
            raw: "AAPL, price UP".to_string(),
            output: "AAPL, price UP".to_string(),
            status,
            iterations: 5,
            attempts: 1,
        }
    }

    #[test]
    fn test_degradation_from_status() {
        assert_eq!(Degradation::from_output(&output(CompletionStatus::Complete)), None);

        let exhausted = Degradation::from_output(&output(CompletionStatus::IterationLimit)).unwrap();
        assert_eq!(
            exhausted,
            Degradation::AgentIterationExhausted {
                stage: "price_trend".to_string(),
                iterations: 5
            }
        );
        assert_eq!(exhausted.stage(), "price_trend");
        assert!(exhausted.to_string().contains("all 5 iterations"));

        let truncated = Degradation::from_output(&output(CompletionStatus::TokenLimit)).unwrap();
        assert!(truncated.to_string().contains("token limit"));
    }

    #[test]
    fn test_degradation_serialization() {
        let json = serde_json::to_value(Degradation::TokenLimit {
            stage: "newsletter".to_string(),
        })
        .unwrap();
        assert_eq!(json["kind"], "token_limit");
        assert_eq!(json["stage"], "newsletter");
    }
}
