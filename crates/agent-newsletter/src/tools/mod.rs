//! Tools the newsletter agents can call

pub mod news_search;
pub mod price_history;

pub use news_search::{NEWS_TOOL_NAME, NewsLedger, NewsSearchTool};
pub use price_history::{PRICE_TOOL_NAME, PriceHistoryTool};
