//! Daily price series and its summary

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// One daily bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// Daily bars for one ticker, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Create a series, sorting bars by date
    pub fn new(ticker: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Headline numbers for the series, `None` when it has no bars
    pub fn summary(&self) -> Option<PriceSummary> {
        let first = self.bars.first()?;
        let last = self.bars.last()?;
        let closes: Vec<f64> = self.bars.iter().map(|bar| bar.close).collect();

        let high = self.bars.iter().map(|bar| bar.high).fold(f64::MIN, f64::max);
        let low = self.bars.iter().map(|bar| bar.low).fold(f64::MAX, f64::min);
        #[allow(clippy::cast_precision_loss)]
        let average_volume =
            self.bars.iter().map(|bar| bar.volume as f64).sum::<f64>() / self.bars.len() as f64;
        let change_pct = if first.close == 0.0 {
            0.0
        } else {
            (last.close - first.close) / first.close * 100.0
        };

        Some(PriceSummary {
            ticker: self.ticker.clone(),
            start: first.date,
            end: last.date,
            rows: self.bars.len(),
            first_close: first.close,
            last_close: last.close,
            change_pct,
            high,
            low,
            average_volume,
            sma_20: last_sma(&closes, 20),
            sma_50: last_sma(&closes, 50),
        })
    }
}

fn last_sma(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period {
        return None;
    }
    let mut sma = SimpleMovingAverage::new(period).ok()?;
    closes.iter().fold(None, |_, &close| Some(sma.next(close)))
}

/// Headline numbers of a price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: usize,
    pub first_close: f64,
    pub last_close: f64,
    pub change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub average_volume: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
}

impl fmt::Display for PriceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} daily prices from {} to {} ({} trading days)",
            self.ticker, self.start, self.end, self.rows
        )?;
        writeln!(
            f,
            "Close: {:.2} -> {:.2} ({:+.2}%)",
            self.first_close, self.last_close, self.change_pct
        )?;
        writeln!(f, "Period high: {:.2}, period low: {:.2}", self.high, self.low)?;
        writeln!(f, "Average volume: {:.0}", self.average_volume)?;
        let sma = |value: Option<f64>| value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
        write!(f, "SMA-20: {}, SMA-50: {}", sma(self.sma_20), sma(self.sma_50))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(day)),
            open: close - 1.0,
            high: close + 2.0,
            low: close - 2.0,
            close,
            adj_close: close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_empty_series_has_no_summary() {
        let series = PriceSeries::new("AAPL", Vec::new());
        assert!(series.is_empty());
        assert!(series.summary().is_none());
    }

    #[test]
    fn test_summary_sorts_and_measures() {
        let series = PriceSeries::new("AAPL", vec![bar(2, 110.0), bar(0, 100.0), bar(1, 90.0)]);
        let summary = series.summary().unwrap();

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.first_close, 100.0);
        assert_eq!(summary.last_close, 110.0);
        assert!((summary.change_pct - 10.0).abs() < 1e-9);
        assert_eq!(summary.high, 112.0);
        assert_eq!(summary.low, 88.0);
        assert_eq!(summary.average_volume, 1_000.0);
        assert_eq!(summary.sma_20, None);
        assert!(summary.to_string().contains("SMA-20: n/a"));
    }

    #[test]
    fn test_moving_averages() {
        let bars: Vec<_> = (0..60).map(|day| bar(day, f64::from(day) + 1.0)).collect();
        let summary = PriceSeries::new("AAPL", bars).summary().unwrap();

        // Closes 41..=60 and 11..=60
        assert!((summary.sma_20.unwrap() - 50.5).abs() < 1e-9);
        assert!((summary.sma_50.unwrap() - 35.5).abs() < 1e-9);
    }
}
