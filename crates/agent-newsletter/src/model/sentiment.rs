//! News-sentiment report: one block per asset
//!
//! The agent answers in a line-oriented format:
//!
//! ```text
//! MARKET: <one sentence about the overall market>
//!
//! ASSET: AAPL
//! SUMMARY: <one sentence>
//! FORECAST: UP
//! SCORE: 72
//! ```
//!
//! Assets without news get an insufficient-information block with
//! `SCORE: N/A` instead of a made-up number.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{NewsletterError, ParseError};
use crate::model::{NewsCoverage, Trend};

/// Marker used in the summary of an asset with no usable news
pub const INSUFFICIENT_INFORMATION: &str = "Insufficient information";

/// Fear/positivity score, 0 (extreme fear) to 100 (extreme positivity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SentimentScore(u8);

impl SentimentScore {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for SentimentScore {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("score {value} is outside 0-100"))
    }
}

impl From<SentimentScore> for u8 {
    fn from(score: SentimentScore) -> Self {
        score.0
    }
}

impl fmt::Display for SentimentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sentiment for one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBlock {
    pub asset: String,
    pub summary: String,
    pub forecast: Option<Trend>,
    pub score: Option<SentimentScore>,
}

impl SentimentBlock {
    /// Block for an asset with no usable news
    pub fn insufficient(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            summary: format!("{INSUFFICIENT_INFORMATION}: no recent news was found for this asset."),
            forecast: None,
            score: None,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        self.summary
            .to_lowercase()
            .contains(&INSUFFICIENT_INFORMATION.to_lowercase())
    }

    /// Whether this block is about `asset` (`BTC` also matches `BTC-USD`)
    pub fn is_for(&self, asset: &str) -> bool {
        let asset = asset.to_ascii_uppercase();
        self.asset == asset
            || self
                .asset
                .strip_prefix(&asset)
                .is_some_and(|rest| rest.starts_with('-'))
    }
}

impl fmt::Display for SentimentBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ASSET: {}", self.asset)?;
        writeln!(f, "SUMMARY: {}", self.summary)?;
        match self.forecast {
            Some(trend) => writeln!(f, "FORECAST: {trend}")?,
            None => writeln!(f, "FORECAST: N/A")?,
        }
        match self.score {
            Some(score) => write!(f, "SCORE: {score}"),
            None => write!(f, "SCORE: N/A"),
        }
    }
}

/// Output of the news-sentiment agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub market_summary: Option<String>,
    pub blocks: Vec<SentimentBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Market,
    Asset,
    Summary,
    Forecast,
    Score,
}

impl Field {
    fn classify(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_uppercase();
        if key.contains("SCORE") {
            Some(Self::Score)
        } else if key.contains("FORECAST") || key == "TREND" {
            Some(Self::Forecast)
        } else if key.contains("MARKET") {
            Some(Self::Market)
        } else if key.contains("SUMMARY") {
            Some(Self::Summary)
        } else if key.contains("ASSET") || key == "STOCK" || key == "TICKER" {
            Some(Self::Asset)
        } else {
            None
        }
    }
}

/// Split `**KEY:** value` style lines into key and value
fn split_line(line: &str) -> Option<(&str, String)> {
    let line = line
        .trim()
        .trim_start_matches(|c: char| matches!(c, '*' | '#' | '-' | '>' | '_') || c.is_whitespace());
    let (key, value) = line.split_once(':')?;
    let key = key.trim_matches(|c: char| c == '*' || c == '_' || c.is_whitespace());
    let value = value
        .trim()
        .trim_matches(|c: char| c == '*' || c == '_')
        .trim()
        .to_string();
    Some((key, value))
}

fn normalise_asset(value: &str) -> String {
    value
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_start_matches('$')
        .trim_matches(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
        .to_ascii_uppercase()
}

fn is_not_available(value: &str) -> bool {
    let value = value.trim().to_ascii_uppercase();
    value.is_empty()
        || value.starts_with("N/A")
        || value == "NA"
        || value.starts_with("NONE")
        || value.starts_with("UNKNOWN")
}

fn parse_score(asset: &str, value: &str) -> Result<Option<SentimentScore>, ParseError> {
    if is_not_available(value) {
        return Ok(None);
    }
    let start = value
        .find(|c: char| c.is_ascii_digit() || c == '-')
        .ok_or_else(|| ParseError::InvalidScore {
            asset: asset.to_string(),
            value: value.to_string(),
        })?;
    let rest = &value[start..];
    let end = rest
        .char_indices()
        .skip(1)
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(rest.len(), |(i, _)| i);
    let number: i64 = rest[..end].parse().map_err(|_| ParseError::InvalidScore {
        asset: asset.to_string(),
        value: value.to_string(),
    })?;

    SentimentScore::new(number)
        .map(Some)
        .ok_or_else(|| ParseError::ScoreOutOfRange {
            asset: asset.to_string(),
            value: number,
        })
}

fn parse_forecast(asset: &str, value: &str) -> Result<Option<Trend>, ParseError> {
    if is_not_available(value) {
        return Ok(None);
    }
    let first = value.split_whitespace().next().unwrap_or_default();
    first
        .trim_matches(|c: char| !c.is_ascii_alphabetic())
        .parse()
        .ok()
        .or_else(|| Trend::find_in(value))
        .map(Some)
        .ok_or_else(|| ParseError::UnknownForecast {
            asset: asset.to_string(),
            value: value.to_string(),
        })
}

#[derive(Default)]
struct PartialBlock {
    asset: String,
    summary: Option<String>,
    forecast: Option<String>,
    score: Option<String>,
}

impl PartialBlock {
    fn finish(self) -> Result<SentimentBlock, ParseError> {
        let asset = self.asset;
        let summary = self.summary.filter(|s| !s.is_empty()).ok_or_else(|| {
            ParseError::MissingField {
                asset: asset.clone(),
                field: "SUMMARY",
            }
        })?;
        let insufficient = summary
            .to_lowercase()
            .contains(&INSUFFICIENT_INFORMATION.to_lowercase());

        let score = match &self.score {
            Some(value) => parse_score(&asset, value)?,
            None if insufficient => None,
            None => {
                return Err(ParseError::MissingField {
                    asset,
                    field: "SCORE",
                });
            }
        };
        if score.is_none() && !insufficient {
            return Err(ParseError::UnmarkedMissingScore { asset });
        }

        let forecast = match &self.forecast {
            Some(value) => parse_forecast(&asset, value)?,
            None if insufficient => None,
            None => {
                return Err(ParseError::MissingField {
                    asset,
                    field: "FORECAST",
                });
            }
        };

        Ok(SentimentBlock {
            asset,
            summary,
            forecast,
            score,
        })
    }
}

impl SentimentReport {
    /// Parse every block in the agent output
    ///
    /// Lines that are not `KEY: value` pairs are ignored, so markdown
    /// decoration and prose around the blocks do not matter.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut report = Self::default();
        let mut current: Option<PartialBlock> = None;

        for line in raw.lines() {
            let Some((key, value)) = split_line(line) else {
                continue;
            };
            let Some(field) = Field::classify(key) else {
                continue;
            };

            match (field, current.as_mut()) {
                (Field::Asset, _) => {
                    if let Some(block) = current.take() {
                        report.push(block.finish()?);
                    }
                    current = Some(PartialBlock {
                        asset: normalise_asset(&value),
                        ..PartialBlock::default()
                    });
                }
                (Field::Market, _) => {
                    if report.market_summary.is_none() && !value.is_empty() {
                        report.market_summary = Some(value);
                    }
                }
                (Field::Summary, Some(block)) => block.summary = Some(value),
                (Field::Forecast, Some(block)) => block.forecast = Some(value),
                (Field::Score, Some(block)) => block.score = Some(value),
                (_, None) => {}
            }
        }

        if let Some(block) = current.take() {
            report.push(block.finish()?);
        }

        Ok(report)
    }

    /// Keep the first block per asset
    fn push(&mut self, block: SentimentBlock) {
        if !block.asset.is_empty() && !self.blocks.iter().any(|b| b.asset == block.asset) {
            self.blocks.push(block);
        }
    }

    /// Block for `asset`
    pub fn block(&self, asset: &str) -> Option<&SentimentBlock> {
        self.blocks
            .iter()
            .find(|b| b.asset.eq_ignore_ascii_case(asset))
            .or_else(|| self.blocks.iter().find(|b| b.is_for(asset)))
    }

    /// Align the report with what the news searches actually found
    ///
    /// The result has exactly one block per requested asset, in request order:
    ///
    /// - every search for the asset failed: `SearchUnavailable`
    /// - nothing was found (or never searched): the insufficient-information
    ///   block, whatever the agent wrote
    /// - news was found but the agent wrote no block: `MalformedOutput`
    pub fn reconcile(
        self,
        assets: &[String],
        coverage: &BTreeMap<String, NewsCoverage>,
        stage: &str,
    ) -> Result<Self, NewsletterError> {
        let mut blocks = Vec::with_capacity(assets.len());

        for asset in assets {
            let seen = coverage.get(asset).cloned().unwrap_or_default();

            if seen.all_failed() {
                return Err(NewsletterError::SearchUnavailable {
                    asset: asset.clone(),
                    reason: seen.failures.last().cloned().unwrap_or_default(),
                });
            }

            if !seen.has_news() {
                blocks.push(SentimentBlock::insufficient(asset.clone()));
                continue;
            }

            match self.block(asset) {
                Some(block) => blocks.push(SentimentBlock {
                    asset: asset.clone(),
                    ..block.clone()
                }),
                None => {
                    return Err(NewsletterError::Parse {
                        stage: stage.to_string(),
                        source: ParseError::MissingAsset {
                            asset: asset.clone(),
                        },
                    });
                }
            }
        }

        Ok(Self {
            market_summary: self.market_summary,
            blocks,
        })
    }
}

impl fmt::Display for SentimentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(market) = &self.market_summary {
            writeln!(f, "MARKET: {market}")?;
            writeln!(f)?;
        }
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
                writeln!(f)?;
            }
            write!(f, "{block}")?;
        }
        Ok(())
    }
}
