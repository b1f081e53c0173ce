//! Market data: feed trait, periods, Yahoo/CSV/in-memory feeds, Parquet cache.

pub mod cache;
pub mod csv_feed;
pub mod memory;
pub mod period;
pub mod provider;
pub mod yahoo;

pub use cache::{CacheMeta, CachedFeed, ParquetCache};
pub use csv_feed::CsvFeed;
pub use memory::StaticFeed;
pub use period::{ParsePeriodError, Period};
pub use provider::{closes, select_period, DataError, PriceFeed, RawBar};
pub use yahoo::YahooFeed;
