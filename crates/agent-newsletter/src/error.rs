//! Error types for the newsletter pipeline
//!
//! Failures are grouped into the classes the user sees: validation problems,
//! unavailable market data, unavailable news search, and everything else as an
//! aborted pipeline. Running out of agent iterations is never an error here;
//! it is recorded as a [`crate::engine::Degradation`].

use thiserror::Error;

/// Result type alias for newsletter operations
pub type Result<T> = std::result::Result<T, NewsletterError>;

/// Problems with user input, caught before anything runs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Blank ticker field
    #[error("Please fill the ticker field")]
    EmptyTicker,

    /// Ticker longer than any listed symbol
    #[error("Ticker '{ticker}' is longer than {max} characters")]
    TickerTooLong { ticker: String, max: usize },

    /// Ticker with characters no symbol uses
    #[error("Ticker '{ticker}' contains invalid character '{found}'")]
    InvalidTicker { ticker: String, found: char },
}

/// An agent answered in a shape that cannot be turned into typed output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No `<TICKER>, price <LABEL>` line for the requested ticker
    #[error("no '{ticker}, price UP|DOWN|SIDEWAYS' line found")]
    MissingTrendLine { ticker: String },

    /// A sentiment block lacks a field
    #[error("sentiment block for {asset} has no {field} line")]
    MissingField { asset: String, field: &'static str },

    /// Forecast that is not up, down or sideways
    #[error("unknown forecast '{value}' for {asset}")]
    UnknownForecast { asset: String, value: String },

    /// Score outside 0..=100
    #[error("score {value} for {asset} is outside 0-100")]
    ScoreOutOfRange { asset: String, value: i64 },

    /// Score that is not a number
    #[error("score '{value}' for {asset} is not a number")]
    InvalidScore { asset: String, value: String },

    /// Score missing without the insufficient-information marker
    #[error("{asset} has no score but is not marked as having insufficient information")]
    UnmarkedMissingScore { asset: String },

    /// No block for an asset that had news
    #[error("no sentiment block for {asset}")]
    MissingAsset { asset: String },

    /// Newsletter section not found
    #[error("newsletter has no {0} section")]
    MissingSection(&'static str),

    /// Newsletter section present twice
    #[error("newsletter has more than one {0} section")]
    DuplicateSection(&'static str),

    /// Executive summary with the wrong number of bullets
    #[error("executive summary has {found} bullets, expected 3")]
    BulletCount { found: usize },

    /// Conclusion without an up, down or sideways call
    #[error("conclusion does not state a direction (up, down or sideways)")]
    MissingDirection,
}

impl ParseError {
    /// Wrap as a retryable agent error
    pub fn into_agent_error(self, agent: &str) -> agent_core::Error {
        agent_core::Error::MalformedOutput {
            agent: agent.to_string(),
            reason: self.to_string(),
        }
    }
}

/// Newsletter pipeline errors
#[derive(Debug, Error)]
pub enum NewsletterError {
    /// Bad user input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No price rows for the ticker in the configured window
    #[error("No market data for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    /// News search failed
    #[error("News search unavailable for {asset}: {reason}")]
    SearchUnavailable { asset: String, reason: String },

    /// Agent output that could not be parsed
    #[error("Malformed output from {stage}: {source}")]
    Parse {
        stage: String,
        #[source]
        source: ParseError,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other unrecovered failure
    #[error("Pipeline aborted: {0}")]
    PipelineAborted(String),
}

impl NewsletterError {
    /// Taxonomy name of the error class
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::DataUnavailable { .. } => "DataUnavailable",
            Self::SearchUnavailable { .. } => "SearchUnavailable",
            Self::Parse { .. } | Self::Config(_) | Self::PipelineAborted(_) => "PipelineAborted",
        }
    }

    /// Message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::DataUnavailable { ticker, .. } => format!(
                "No market data is available for {ticker}. Check the ticker symbol and try again."
            ),
            Self::SearchUnavailable { .. } => {
                "The news search service is unavailable right now. Please try again later."
                    .to_string()
            }
            Self::Parse { .. } | Self::Config(_) | Self::PipelineAborted(_) => {
                "The research could not be completed. Please try again later.".to_string()
            }
        }
    }

    /// Whether the user can fix this by changing the input
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<agent_core::Error> for NewsletterError {
    fn from(err: agent_core::Error) -> Self {
        NewsletterError::PipelineAborted(err.to_string())
    }
}

impl From<agent_utils::EnvError> for NewsletterError {
    fn from(err: agent_utils::EnvError) -> Self {
        NewsletterError::Config(err.to_string())
    }
}

impl From<agent_prompt::PromptError> for NewsletterError {
    fn from(err: agent_prompt::PromptError) -> Self {
        NewsletterError::PipelineAborted(err.to_string())
    }
}

impl From<agent_llm::LLMError> for NewsletterError {
    fn from(err: agent_llm::LLMError) -> Self {
        NewsletterError::Config(err.to_string())
    }
}

/// Convert NewsletterError to agent_core::Error
impl From<NewsletterError> for agent_core::Error {
    fn from(err: NewsletterError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}
