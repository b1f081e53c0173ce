//! In-memory price feed for tests and offline runs.

use super::period::Period;
use super::provider::{select_period, DataError, PriceFeed, RawBar};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// Serves fixed bar histories keyed by ticker.
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    series: HashMap<String, Vec<RawBar>>,
}

impl StaticFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: impl Into<String>, mut bars: Vec<RawBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        self.series.insert(symbol.into(), bars);
        self
    }

    /// Closes on consecutive calendar days ending at `end`.
    pub fn with_closes(self, symbol: impl Into<String>, end: NaiveDate, closes: &[f64]) -> Self {
        let n = closes.len() as i64;
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| RawBar::from_close(end - Duration::days(n - 1 - i as i64), c))
            .collect();
        self.with_bars(symbol, bars)
    }
}

impl PriceFeed for StaticFeed {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<RawBar>, DataError> {
        let bars = self
            .series
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        Ok(select_period(bars, period))
    }
}
