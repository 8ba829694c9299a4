//! Price-trend labels and analysis

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::ParseError;

/// Direction of a price or sentiment trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Sideways => "SIDEWAYS",
        }
    }

    /// First direction word in free text, if any
    pub fn find_in(text: &str) -> Option<Self> {
        static WORD: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)\b(up(?:ward)?|bullish|down(?:ward)?|bearish|sideways)\b")
                .expect("direction regex is valid")
        });
        WORD.captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|word| word.as_str().parse().ok())
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "upward" | "uptrend" | "bullish" => Ok(Self::Up),
            "down" | "downward" | "downtrend" | "bearish" => Ok(Self::Down),
            "sideways" | "flat" | "neutral" | "range-bound" => Ok(Self::Sideways),
            other => Err(format!("unknown trend '{other}'")),
        }
    }
}

/// Matcher for `<ticker>, price <DIR>`; the ticker must not continue a longer symbol
fn trend_line(ticker: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"(?im)(?:^|[^A-Z0-9.^=\-\n]){}\s*,\s*price\s*[:=]?\s*(UP|DOWN|SIDEWAYS)\b",
        regex::escape(ticker)
    ))
    .ok()
}

/// Output of the price-trend agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub asset: String,
    pub label: Trend,
    pub rationale: String,
}

impl TrendAnalysis {
    /// Parse agent output containing `<TICKER>, price <UP|DOWN|SIDEWAYS>`
    ///
    /// Only a line naming `ticker` counts. Everything else in the output is
    /// kept as the rationale.
    pub fn parse(raw: &str, ticker: &str) -> Result<Self, ParseError> {
        let (line_range, label) = trend_line(ticker)
            .and_then(|pattern| {
                let caps = pattern.captures(raw)?;
                let whole = caps.get(0)?;
                let label = caps[1].parse::<Trend>().ok()?;
                Some((whole.range(), label))
            })
            .ok_or_else(|| ParseError::MissingTrendLine {
                ticker: ticker.to_string(),
            })?;

        let line_start = raw[..line_range.start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = raw[line_range.end..]
            .find('\n')
            .map_or(raw.len(), |i| line_range.end + i);
        let rationale = format!("{}{}", &raw[..line_start], &raw[line_end..])
            .trim()
            .to_string();

        Ok(Self {
            asset: ticker.to_ascii_uppercase(),
            label,
            rationale,
        })
    }

    /// The canonical trend line
    pub fn headline(&self) -> String {
        format!("{}, price {}", self.asset, self.label)
    }
}
