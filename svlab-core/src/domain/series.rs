//! PriceSeries: columnar daily closes plus derived feature columns.

use crate::data::RawBar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the built-in close column.
pub const CLOSE: &str = "close";

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("column '{name}' has {actual} values, series has {expected} ticks")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("column name '{0}' is reserved")]
    ReservedName(String),
}

/// Ordered daily closes indexed by tick, with optional dates and named columns.
///
/// Every derived column has exactly `len()` entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    dates: Option<Vec<NaiveDate>>,
    close: Vec<f64>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl PriceSeries {
    pub fn from_closes(symbol: impl Into<String>, close: Vec<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            dates: None,
            close,
            columns: BTreeMap::new(),
        }
    }

    /// Build a dated series from provider bars, using the close column.
    pub fn from_bars(symbol: impl Into<String>, bars: &[RawBar]) -> Self {
        Self {
            symbol: symbol.into(),
            dates: Some(bars.iter().map(|b| b.date).collect()),
            close: bars.iter().map(|b| b.close).collect(),
            columns: BTreeMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn closes(&self) -> &[f64] {
        &self.close
    }

    pub fn close(&self, tick: usize) -> Option<f64> {
        self.close.get(tick).copied()
    }

    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.as_ref().and_then(|d| d.first().copied())
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.as_ref().and_then(|d| d.last().copied())
    }

    /// Attach (or replace) a named derived column.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), SeriesError> {
        let name = name.into();
        if name == CLOSE {
            return Err(SeriesError::ReservedName(name));
        }
        if values.len() != self.len() {
            return Err(SeriesError::LengthMismatch {
                name,
                expected: self.len(),
                actual: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Full column by name; `"close"` resolves to the price column.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        if name == CLOSE {
            return Some(&self.close);
        }
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == CLOSE || self.columns.contains_key(name)
    }

    /// Names of the derived columns, sorted.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Look-ahead-free view of ticks `[0, tick]`.
    pub fn history(&self, tick: usize) -> HistoryView<'_> {
        HistoryView {
            series: self,
            end: (tick + 1).min(self.len()),
        }
    }
}

/// The series truncated to `[0, i]`, as handed to strategies.
#[derive(Debug, Clone, Copy)]
pub struct HistoryView<'a> {
    series: &'a PriceSeries,
    end: usize,
}

impl<'a> HistoryView<'a> {
    pub fn len(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    pub fn closes(&self) -> &'a [f64] {
        &self.series.close[..self.end]
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes().last().copied()
    }

    pub fn column(&self, name: &str) -> Option<&'a [f64]> {
        self.series.column(name).map(|c| &c[..self.end])
    }

    /// Value of a column at the current tick.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.column(name).and_then(|c| c.last().copied())
    }
}
