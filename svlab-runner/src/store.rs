//! SQLite market store: daily bars with JSON feature annotations, plus
//! archived backtest and forward-test results.
//!
//! Tables:
//! - `market_data`: one row per `(timestamp, symbol)`, `features` is a JSON object
//! - `backtest_results`: keyed by `(start_timestamp, end_timestamp, symbol, interval)`
//! - `forwardtest_results`: append-only, autoincrement id

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use svlab_core::data::RawBar;
use svlab_core::factory::{create_indicators, FactoryError};
use svlab_core::indicators::fill_missing;

const DATE_FMT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored feature blob is not a JSON object: {0}")]
    NotAnObject(String),

    #[error("bad stored date '{0}'")]
    BadDate(String),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error("store connection lock poisoned")]
    Poisoned,
}

pub type Features = Map<String, Value>;

/// One stored bar with its feature annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRow {
    pub timestamp: NaiveDate,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub features: Features,
}

/// An archived backtest over a dated window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRecord {
    pub start_timestamp: NaiveDate,
    pub end_timestamp: NaiveDate,
    pub symbol: String,
    pub interval: String,
    pub decisions: Vec<f64>,
    pub revenue: f64,
    pub start_capital: f64,
    pub strategy: String,
}

/// An archived backtest over one simulated path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardtestRecord {
    /// Assigned by the store on save.
    pub id: Option<i64>,
    pub start_price: f64,
    pub path: Vec<f64>,
    pub decisions: Vec<f64>,
    pub revenue: f64,
    pub start_capital: f64,
    pub strategy: String,
}

/// Persistent market data with feature annotations.
pub trait MarketStore {
    /// Insert or replace bars for `symbol`. Existing features are kept.
    fn upsert_bars(&self, symbol: &str, bars: &[RawBar]) -> Result<usize, StoreError>;

    /// Rows for `symbol` with `start <= timestamp <= end`, ascending.
    fn fetch_market_data(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MarketRow>, StoreError>;

    /// Merge `f(row)` into every row's features. Returns rows updated.
    fn insert_feature(&self, f: &dyn Fn(&MarketRow) -> Features) -> Result<usize, StoreError>;

    /// Compute a registry indicator over `symbol`'s stored closes and merge
    /// each output column into the matching rows.
    fn attach_indicator(&self, symbol: &str, name: &str) -> Result<usize, StoreError>;

    /// Delete `name` from every row's features. Returns rows changed.
    fn remove_feature(&self, name: &str) -> Result<usize, StoreError>;

    /// Save a backtest, replacing any row with the same key.
    fn save_backtest(&self, record: &BacktestRecord) -> Result<(), StoreError>;

    fn load_backtests(&self, symbol: &str) -> Result<Vec<BacktestRecord>, StoreError>;

    /// Append a forward test. Returns its id.
    fn save_forwardtest(&self, record: &ForwardtestRecord) -> Result<i64, StoreError>;

    fn load_forwardtests(&self, strategy: &str) -> Result<Vec<ForwardtestRecord>, StoreError>;
}

/// [`MarketStore`] over a single SQLite connection.
pub struct SqliteMarketStore {
    conn: Mutex<Connection>,
}

impl SqliteMarketStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open(path.as_ref())?),
        };
        store.init_schema()?;
        info!(path = %path.as_ref().display(), "market store opened");
        Ok(store)
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema()?;
        debug!("in-memory market store opened");
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS market_data (
                timestamp TEXT NOT NULL,
                symbol TEXT NOT NULL,
                open REAL,
                high REAL,
                low REAL,
                close REAL,
                volume INTEGER,
                features TEXT NOT NULL DEFAULT '{}',
                PRIMARY KEY (timestamp, symbol)
            );
            CREATE TABLE IF NOT EXISTS backtest_results (
                start_timestamp TEXT NOT NULL,
                end_timestamp TEXT NOT NULL,
                symbol TEXT NOT NULL,
                interval TEXT NOT NULL,
                decisions TEXT,
                revenue REAL,
                start_capital REAL,
                strategy TEXT NOT NULL,
                PRIMARY KEY (start_timestamp, end_timestamp, symbol, interval)
            );
            CREATE TABLE IF NOT EXISTS forwardtest_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_price REAL,
                path TEXT,
                decisions TEXT,
                revenue REAL,
                start_capital REAL,
                strategy TEXT
            );",
        )?;
        Ok(())
    }

    /// All rows, optionally for one symbol, ordered by symbol then date.
    fn all_rows(conn: &Connection, symbol: Option<&str>) -> Result<Vec<MarketRow>, StoreError> {
        let sql = "SELECT timestamp, symbol, open, high, low, close, volume, features
                   FROM market_data
                   WHERE ?1 IS NULL OR symbol = ?1
                   ORDER BY symbol ASC, timestamp ASC";
        let mut stmt = conn.prepare(sql)?;
        let raw = stmt
            .query_map(params![symbol], raw_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawRow::into_row).collect()
    }

    fn write_features(
        conn: &Connection,
        row: &MarketRow,
        features: &Features,
    ) -> Result<(), StoreError> {
        conn.execute(
            "UPDATE market_data SET features = ?1 WHERE timestamp = ?2 AND symbol = ?3",
            params![
                serde_json::to_string(features)?,
                row.timestamp.format(DATE_FMT).to_string(),
                row.symbol,
            ],
        )?;
        Ok(())
    }

    fn merge_into_rows(
        &self,
        rows_and_features: Vec<(MarketRow, Features)>,
    ) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut updated = 0;
        for (row, new) in rows_and_features {
            let mut merged = row.features.clone();
            merged.extend(new);
            Self::write_features(&tx, &row, &merged)?;
            updated += 1;
        }
        tx.commit()?;
        Ok(updated)
    }
}

struct RawRow {
    timestamp: String,
    symbol: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    features: Option<String>,
}

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        timestamp: row.get(0)?,
        symbol: row.get(1)?,
        open: row.get(2)?,
        high: row.get(3)?,
        low: row.get(4)?,
        close: row.get(5)?,
        volume: row.get(6)?,
        features: row.get(7)?,
    })
}

impl RawRow {
    fn into_row(self) -> Result<MarketRow, StoreError> {
        Ok(MarketRow {
            timestamp: parse_date(&self.timestamp)?,
            symbol: self.symbol,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume.max(0) as u64,
            features: parse_features(self.features.as_deref())?,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(s, DATE_FMT).map_err(|_| StoreError::BadDate(s.to_string()))
}

fn parse_features(blob: Option<&str>) -> Result<Features, StoreError> {
    match blob.map(str::trim) {
        None | Some("") => Ok(Features::new()),
        Some(text) => match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject(text.to_string())),
        },
    }
}

/// JSON value for a float; non-finite values become `null`.
fn number(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

impl MarketStore for SqliteMarketStore {
    fn upsert_bars(&self, symbol: &str, bars: &[RawBar]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO market_data (timestamp, symbol, open, high, low, close, volume, features)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, '{}')
                 ON CONFLICT(timestamp, symbol) DO UPDATE SET
                    open = excluded.open,
                    high = excluded.high,
                    low = excluded.low,
                    close = excluded.close,
                    volume = excluded.volume",
            )?;
            for bar in bars {
                stmt.execute(params![
                    bar.date.format(DATE_FMT).to_string(),
                    symbol,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    i64::try_from(bar.volume).unwrap_or(i64::MAX),
                ])?;
            }
        }
        tx.commit()?;
        debug!(symbol, bars = bars.len(), "bars upserted");
        Ok(bars.len())
    }

    fn fetch_market_data(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MarketRow>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp, symbol, open, high, low, close, volume, features
             FROM market_data
             WHERE symbol = ?1 AND timestamp BETWEEN ?2 AND ?3
             ORDER BY timestamp ASC",
        )?;
        let raw = stmt
            .query_map(
                params![
                    symbol,
                    start.format(DATE_FMT).to_string(),
                    end.format(DATE_FMT).to_string()
                ],
                raw_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawRow::into_row).collect()
    }

    fn insert_feature(&self, f: &dyn Fn(&MarketRow) -> Features) -> Result<usize, StoreError> {
        let rows = {
            let conn = self.lock()?;
            Self::all_rows(&conn, None)?
        };
        let pairs = rows
            .into_iter()
            .map(|row| {
                let new = f(&row);
                (row, new)
            })
            .collect();
        self.merge_into_rows(pairs)
    }

    fn attach_indicator(&self, symbol: &str, name: &str) -> Result<usize, StoreError> {
        let indicators = create_indicators(name)?;
        let rows = {
            let conn = self.lock()?;
            Self::all_rows(&conn, Some(symbol))?
        };
        let closes: Vec<f64> = rows.iter().map(|r| r.close).collect();
        // Warm-up rows are 0, matching the backtest precompute.
        let columns: Vec<(String, Vec<f64>)> = indicators
            .iter()
            .map(|ind| (ind.name().to_string(), fill_missing(ind.compute(&closes))))
            .collect();

        let pairs = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let new: Features = columns
                    .iter()
                    .map(|(col, values)| (col.clone(), number(values[i])))
                    .collect();
                (row, new)
            })
            .collect();
        let updated = self.merge_into_rows(pairs)?;
        info!(symbol, indicator = name, rows = updated, "indicator attached");
        Ok(updated)
    }

    fn remove_feature(&self, name: &str) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let rows = Self::all_rows(&conn, None)?;
        let tx = conn.transaction()?;
        let mut changed = 0;
        for row in rows {
            let mut features = row.features.clone();
            if features.remove(name).is_some() {
                Self::write_features(&tx, &row, &features)?;
                changed += 1;
            }
        }
        tx.commit()?;
        Ok(changed)
    }

    fn save_backtest(&self, record: &BacktestRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO backtest_results
                (start_timestamp, end_timestamp, symbol, interval, decisions, revenue, start_capital, strategy)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.start_timestamp.format(DATE_FMT).to_string(),
                record.end_timestamp.format(DATE_FMT).to_string(),
                record.symbol,
                record.interval,
                serde_json::to_string(&record.decisions)?,
                record.revenue,
                record.start_capital,
                record.strategy,
            ],
        )?;
        Ok(())
    }

    fn load_backtests(&self, symbol: &str) -> Result<Vec<BacktestRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT start_timestamp, end_timestamp, symbol, interval, decisions, revenue, start_capital, strategy
             FROM backtest_results WHERE symbol = ?1
             ORDER BY start_timestamp ASC, end_timestamp ASC, interval ASC",
        )?;
        let raw = stmt
            .query_map(params![symbol], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(start, end, symbol, interval, decisions, revenue, start_capital, strategy)| {
                Ok(BacktestRecord {
                    start_timestamp: parse_date(&start)?,
                    end_timestamp: parse_date(&end)?,
                    symbol,
                    interval,
                    decisions: decisions
                        .map(|d| serde_json::from_str(&d))
                        .transpose()?
                        .unwrap_or_default(),
                    revenue,
                    start_capital,
                    strategy,
                })
            })
            .collect()
    }

    fn save_forwardtest(&self, record: &ForwardtestRecord) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO forwardtest_results (start_price, path, decisions, revenue, start_capital, strategy)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.start_price,
                serde_json::to_string(&record.path)?,
                serde_json::to_string(&record.decisions)?,
                record.revenue,
                record.start_capital,
                record.strategy,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn load_forwardtests(&self, strategy: &str) -> Result<Vec<ForwardtestRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, start_price, path, decisions, revenue, start_capital, strategy
             FROM forwardtest_results WHERE strategy = ?1 ORDER BY id ASC",
        )?;
        let raw = stmt
            .query_map(params![strategy], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(id, start_price, path, decisions, revenue, start_capital, strategy)| {
                let parse = |s: Option<String>| -> Result<Vec<f64>, StoreError> {
                    Ok(s.map(|s| serde_json::from_str(&s)).transpose()?.unwrap_or_default())
                };
                Ok(ForwardtestRecord {
                    id: Some(id),
                    start_price,
                    path: parse(path)?,
                    decisions: parse(decisions)?,
                    revenue,
                    start_capital,
                    strategy,
                })
            })
            .collect()
    }
}

impl SqliteMarketStore {
    /// Number of stored bars for `symbol`.
    pub fn bar_count(&self, symbol: &str) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let n: Option<i64> = conn
            .query_row(
                "SELECT COUNT(*) FROM market_data WHERE symbol = ?1",
                params![symbol],
                |row| row.get(0),
            )
            .optional()?;
        Ok(n.unwrap_or(0).max(0) as usize)
    }
}
