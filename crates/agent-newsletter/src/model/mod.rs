//! Typed data flowing through the pipeline

pub mod analysis;
pub mod news;
pub mod newsletter;
pub mod price;
pub mod sentiment;
pub mod ticker;

pub use analysis::{Trend, TrendAnalysis};
pub use news::{NewsCoverage, NewsItem};
pub use newsletter::{EXECUTIVE_SUMMARY_BULLETS, Newsletter};
pub use price::{PriceBar, PriceSeries, PriceSummary};
pub use sentiment::{INSUFFICIENT_INFORMATION, SentimentBlock, SentimentReport, SentimentScore};
pub use ticker::{MAX_TICKER_LEN, TickerRequest};
