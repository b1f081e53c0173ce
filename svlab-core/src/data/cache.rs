//! Parquet cache layer with Hive-style partitioning.
//!
//! Layout: `{cache_dir}/symbol={SYMBOL}/period={PERIOD}.parquet`
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Integrity validation on load (schema check, row count > 0, blake3 hash)
//! - Quarantine for corrupt files ({filename}.quarantined)
//! - Metadata sidecar per symbol and period (hash, date range, source, age)

use super::period::Period;
use super::provider::{DataError, PriceFeed, RawBar};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Metadata sidecar for one cached (symbol, period).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    pub period: Period,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub data_hash: String,
    pub source: String,
    pub cached_at: NaiveDateTime,
}

impl CacheMeta {
    pub fn is_fresh(&self, now: NaiveDateTime, max_age: Duration) -> bool {
        now - self.cached_at < max_age
    }
}

/// The Parquet cache.
pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Directory for a specific symbol: `{cache_dir}/symbol={SYMBOL}/`
    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("symbol={symbol}"))
    }

    fn data_path(&self, symbol: &str, period: Period) -> PathBuf {
        self.symbol_dir(symbol).join(format!("period={period}.parquet"))
    }

    fn meta_path(&self, symbol: &str, period: Period) -> PathBuf {
        self.symbol_dir(symbol).join(format!("period={period}.meta.json"))
    }

    /// Write bars for a symbol and period. Writes are atomic.
    pub fn write(
        &self,
        symbol: &str,
        period: Period,
        source: &str,
        bars: &[RawBar],
    ) -> Result<(), DataError> {
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(DataError::CacheError("no bars to cache".into()));
        };

        let sym_dir = self.symbol_dir(symbol);
        fs::create_dir_all(&sym_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let df = bars_to_dataframe(bars)?;
        let path = self.data_path(symbol, period);
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            symbol: symbol.to_string(),
            period,
            start_date: first.date,
            end_date: last.date,
            bar_count: bars.len(),
            data_hash: hash_bars(bars)?,
            source: source.to_string(),
            cached_at: chrono::Utc::now().naive_utc(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        let meta_path = self.meta_path(symbol, period);
        let meta_tmp = meta_path.with_extension("json.tmp");
        fs::write(&meta_tmp, meta_json)
            .and_then(|_| fs::rename(&meta_tmp, &meta_path))
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        Ok(())
    }

    /// Load cached bars, checking them against the sidecar hash.
    ///
    /// A file that fails validation is quarantined and reported as a miss.
    pub fn load(&self, symbol: &str, period: Period) -> Result<Option<Vec<RawBar>>, DataError> {
        let path = self.data_path(symbol, period);
        let Some(meta) = self.get_meta(symbol, period) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let validated = load_and_validate_parquet(&path).and_then(|bars| {
            if hash_bars(&bars)? == meta.data_hash {
                Ok(bars)
            } else {
                Err(DataError::ValidationError("hash mismatch".into()))
            }
        });

        match validated {
            Ok(bars) => Ok(Some(bars)),
            Err(e) => {
                let quarantine = path.with_extension("parquet.quarantined");
                warn!(path = %path.display(), error = %e, "quarantining corrupt cache file");
                let _ = fs::rename(&path, &quarantine);
                let _ = fs::remove_file(self.meta_path(symbol, period));
                Ok(None)
            }
        }
    }

    /// Metadata for a cached (symbol, period), if present and readable.
    pub fn get_meta(&self, symbol: &str, period: Period) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(symbol, period)).ok()?;
        serde_json::from_str(&content).ok()
    }
}

/// Wraps any feed with a [`ParquetCache`].
///
/// Entries older than `max_age` are refetched. A failed cache write is logged
/// and the freshly fetched bars are still returned.
pub struct CachedFeed<F> {
    inner: F,
    cache: ParquetCache,
    max_age: Duration,
}

impl<F: PriceFeed> CachedFeed<F> {
    pub fn new(inner: F, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache: ParquetCache::new(cache_dir),
            max_age: Duration::days(1),
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn cache(&self) -> &ParquetCache {
        &self.cache
    }
}

impl<F: PriceFeed> PriceFeed for CachedFeed<F> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<RawBar>, DataError> {
        let now = chrono::Utc::now().naive_utc();
        let fresh = self
            .cache
            .get_meta(symbol, period)
            .is_some_and(|m| m.is_fresh(now, self.max_age));
        if fresh {
            if let Some(bars) = self.cache.load(symbol, period)? {
                debug!(symbol, %period, bars = bars.len(), "cache hit");
                return Ok(bars);
            }
        }

        let bars = self.inner.fetch(symbol, period)?;
        if let Err(e) = self.cache.write(symbol, period, self.inner.name(), &bars) {
            warn!(symbol, %period, error = %e, "cache write failed");
        }
        Ok(bars)
    }
}

fn hash_bars(bars: &[RawBar]) -> Result<String, DataError> {
    let bytes = serde_json::to_vec(bars)
        .map_err(|e| DataError::CacheError(format!("hash serialization: {e}")))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn bars_to_dataframe(bars: &[RawBar]) -> Result<DataFrame, DataError> {
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch()).num_days() as i32)
        .collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();
    let adj_closes: Vec<f64> = bars.iter().map(|b| b.adj_close).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
        Column::new("adj_close".into(), adj_closes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<RawBar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }
    dataframe_to_bars(&df)
}

fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<RawBar>, DataError> {
    let column = |name: &str| {
        df.column(name)
            .map_err(|_| DataError::ValidationError(format!("missing column '{name}'")))
    };
    let type_err = |name: &str, e: PolarsError| {
        DataError::ParquetError(format!("{name} column type: {e}"))
    };

    let date_ca = column("date")?.date().map_err(|e| type_err("date", e))?;
    let open_ca = column("open")?.f64().map_err(|e| type_err("open", e))?;
    let high_ca = column("high")?.f64().map_err(|e| type_err("high", e))?;
    let low_ca = column("low")?.f64().map_err(|e| type_err("low", e))?;
    let close_ca = column("close")?.f64().map_err(|e| type_err("close", e))?;
    let vol_ca = column("volume")?.u64().map_err(|e| type_err("volume", e))?;
    let adj_ca = column("adj_close")?.f64().map_err(|e| type_err("adj_close", e))?;

    let n = df.height();
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let date_days = date_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;

        bars.push(RawBar {
            date: epoch() + Duration::days(date_days as i64),
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(0),
            adj_close: adj_ca.get(i).unwrap_or(f64::NAN),
        });
    }

    Ok(bars)
}
