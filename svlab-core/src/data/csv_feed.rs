//! Offline CSV price feed.
//!
//! Accepts Yahoo-style exports: a header row with at least `Date` and `Close`
//! (any case), optionally `Open`, `High`, `Low`, `Volume` and `Adj Close`.
//! Dates are `YYYY-MM-DD`.

use super::period::Period;
use super::provider::{select_period, DataError, PriceFeed, RawBar};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum Source {
    /// One file serves every ticker.
    File(PathBuf),
    /// `{dir}/{TICKER}.csv`
    Directory(PathBuf),
}

/// Price feed backed by CSV files on disk.
#[derive(Debug, Clone)]
pub struct CsvFeed {
    source: Source,
}

impl CsvFeed {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Directory(dir.into()),
        }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        match &self.source {
            Source::File(p) => p.clone(),
            Source::Directory(d) => d.join(format!("{symbol}.csv")),
        }
    }
}

impl PriceFeed for CsvFeed {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<RawBar>, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let bars = read_bars(&path)?;
        Ok(select_period(&bars, period))
    }
}

struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
    adj_close: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, DataError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| DataError::Csv(format!("missing '{name}' column")))
        };
        Ok(Self {
            date: required("date")?,
            close: required("close")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
            adj_close: find("adj close").or_else(|| find("adj_close")),
        })
    }
}

/// Read every bar in a CSV file, sorted by date.
pub fn read_bars(path: &Path) -> Result<Vec<RawBar>, DataError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;
    let headers = reader
        .headers()
        .map_err(|e| DataError::Csv(format!("header: {e}")))?
        .clone();
    let cols = Columns::locate(&headers)?;

    let mut bars = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DataError::Csv(format!("row {}: {e}", line + 1)))?;
        let text = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");
        let number = |idx: usize| -> Result<f64, DataError> {
            text(idx).parse::<f64>().map_err(|_| {
                DataError::ValidationError(format!(
                    "row {}: '{}' is not a number",
                    line + 1,
                    text(idx)
                ))
            })
        };

        let date = NaiveDate::parse_from_str(text(cols.date), "%Y-%m-%d").map_err(|e| {
            DataError::ValidationError(format!("row {}: bad date '{}': {e}", line + 1, text(cols.date)))
        })?;
        let close = number(cols.close)?;
        let optional = |idx: Option<usize>| match idx {
            Some(i) if !text(i).is_empty() => number(i),
            _ => Ok(close),
        };

        bars.push(RawBar {
            date,
            open: optional(cols.open)?,
            high: optional(cols.high)?,
            low: optional(cols.low)?,
            close,
            volume: cols
                .volume
                .and_then(|i| text(i).parse::<f64>().ok())
                .map(|v| v.max(0.0) as u64)
                .unwrap_or(0),
            adj_close: optional(cols.adj_close)?,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}
