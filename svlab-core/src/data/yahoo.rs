//! Yahoo Finance price feed.
//!
//! Fetches daily bars from Yahoo's v8 chart API using its `range` parameter.
//! Handles rate limiting, retries with exponential backoff and response
//! parsing.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV feed is the fallback when Yahoo is unavailable.

use super::period::Period;
use super::provider::{DataError, PriceFeed, RawBar};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance price feed.
pub struct YahooFeed {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooFeed {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Build the chart API URL for a symbol and period.
    fn chart_url(symbol: &str, period: Period) -> String {
        format!(
            "{CHART_BASE}/{symbol}?range={period}&interval=1d&includeAdjustedClose=true"
        )
    }

    /// Parse the chart API response into RawBars.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<RawBar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            // Bars without a close are holidays or partial sessions
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten().unwrap_or(close);

            bars.push(RawBar {
                date,
                open: field(&quote.open),
                high: field(&quote.high),
                low: field(&quote.low),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
                adj_close: adj_closes
                    .as_ref()
                    .and_then(|v| v.get(i).copied().flatten())
                    .unwrap_or(close),
            });
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(bars)
    }

    /// One HTTP round trip, classified for the retry loop.
    fn attempt(&self, url: &str, symbol: &str) -> Attempt {
        let resp = match self.client.get(url).send() {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Attempt::Retry(DataError::NetworkUnreachable(e.to_string()))
            }
            Err(e) => return Attempt::Done(Err(DataError::NetworkUnreachable(e.to_string()))),
        };

        match resp.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Attempt::Retry(DataError::RateLimited { retry_after_secs })
            }
            reqwest::StatusCode::NOT_FOUND => Attempt::Done(Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })),
            status if !status.is_success() => {
                Attempt::Retry(DataError::Other(format!("HTTP {status} for {symbol}")))
            }
            _ => Attempt::Done(
                resp.json::<ChartResponse>()
                    .map_err(|e| {
                        DataError::ResponseFormatChanged(format!("unparseable chart for {symbol}: {e}"))
                    })
                    .and_then(|chart| Self::parse_response(symbol, chart)),
            ),
        }
    }

    /// Backoff doubles from `base_delay`; the last retryable error is returned.
    fn fetch_with_retry(&self, symbol: &str, period: Period) -> Result<Vec<RawBar>, DataError> {
        let url = Self::chart_url(symbol, period);
        let mut delay = self.base_delay;
        let mut attempt = 0;
        loop {
            match self.attempt(&url, symbol) {
                Attempt::Done(result) => {
                    if let Ok(bars) = &result {
                        debug!(symbol, %period, bars = bars.len(), "yahoo fetch ok");
                    }
                    return result;
                }
                Attempt::Retry(err) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(symbol, attempt, ?delay, error = %err, "retrying yahoo request");
                    std::thread::sleep(delay);
                    delay *= 2;
                }
                Attempt::Retry(err) => return Err(err),
            }
        }
    }
}

enum Attempt {
    Done(Result<Vec<RawBar>, DataError>),
    Retry(DataError),
}

impl PriceFeed for YahooFeed {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<RawBar>, DataError> {
        let bars = self.fetch_with_retry(symbol, period)?;
        // `range=1d` can still return the previous session alongside today
        Ok(match period {
            Period::OneDay => bars.last().cloned().into_iter().collect(),
            _ => bars,
        })
    }
}
