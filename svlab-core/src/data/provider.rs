//! Price feed trait and structured error types.
//!
//! The PriceFeed trait abstracts over data sources (Yahoo Finance, CSV files,
//! in-memory fixtures) so the orchestrator can swap implementations and tests
//! never touch the network.

use super::period::Period;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw daily OHLCV bar from a price feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adj_close: f64,
}

impl RawBar {
    /// A flat bar where every price field is `close`.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
            adj_close: close,
        }
    }
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no {period} data for '{symbol}'")]
    EmptySeries { symbol: String, period: Period },

    #[error("csv error: {0}")]
    Csv(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Source of daily bars for a ticker.
///
/// Implementations return bars in ascending date order. `Period::OneDay`
/// yields the most recent bar only.
pub trait PriceFeed: Send + Sync {
    /// Human-readable name of this feed.
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` covering `period`.
    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<RawBar>, DataError>;
}

impl<F: PriceFeed + ?Sized> PriceFeed for Box<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<RawBar>, DataError> {
        (**self).fetch(symbol, period)
    }
}

/// Cut a full history down to what `period` asks for.
///
/// `OneDay` keeps the last bar; longer periods keep bars within the
/// calendar lookback of the last date.
pub fn select_period(bars: &[RawBar], period: Period) -> Vec<RawBar> {
    let Some(last) = bars.last() else {
        return Vec::new();
    };
    match period.calendar_lookback() {
        None => vec![last.clone()],
        Some(lookback) => {
            let start = last.date - lookback;
            bars.iter().filter(|b| b.date > start).cloned().collect()
        }
    }
}

/// Close prices of a bar slice.
pub fn closes(bars: &[RawBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
