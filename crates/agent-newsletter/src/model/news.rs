//! News items returned by the search service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One news search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub source: String,
    pub headline: String,
    pub snippet: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
}

/// What the news searches for one asset produced during a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsCoverage {
    /// Searches attempted
    pub searches: usize,

    /// Items returned across successful searches
    pub items: usize,

    /// Failure reasons of failed searches
    pub failures: Vec<String>,
}

impl NewsCoverage {
    /// Every attempted search failed
    pub fn all_failed(&self) -> bool {
        self.searches > 0 && self.failures.len() == self.searches
    }

    /// Nothing usable was found, whether searched or not
    pub fn has_news(&self) -> bool {
        self.items > 0
    }
}
