//! History periods understood by every feed.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period '{0}' (expected one of 1d, 1y, 5y, 10y)")]
pub struct ParsePeriodError(pub String);

/// How much history to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    OneDay,
    OneYear,
    FiveYears,
    TenYears,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::OneDay,
        Period::OneYear,
        Period::FiveYears,
        Period::TenYears,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::OneYear => "1y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
        }
    }

    /// Trading-day horizon for simulation. `OneDay` has none.
    pub fn horizon_days(self) -> Option<usize> {
        match self {
            Period::OneDay => None,
            Period::OneYear => Some(252),
            Period::FiveYears => Some(1260),
            Period::TenYears => Some(2520),
        }
    }

    /// Calendar span of history. `None` means "latest bar only".
    pub fn calendar_lookback(self) -> Option<Duration> {
        match self {
            Period::OneDay => None,
            Period::OneYear => Some(Duration::days(365)),
            Period::FiveYears => Some(Duration::days(5 * 365 + 1)),
            Period::TenYears => Some(Duration::days(10 * 365 + 2)),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePeriodError(s.to_string()))
    }
}

impl TryFrom<String> for Period {
    type Error = ParsePeriodError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_periods() {
        assert_eq!("1d".parse::<Period>(), Ok(Period::OneDay));
        assert_eq!("1y".parse::<Period>(), Ok(Period::OneYear));
        assert_eq!("5Y".parse::<Period>(), Ok(Period::FiveYears));
        assert_eq!(" 10y ".parse::<Period>(), Ok(Period::TenYears));
    }

    #[test]
    fn rejects_unknown_period() {
        assert_eq!(
            "2y".parse::<Period>(),
            Err(ParsePeriodError("2y".to_string()))
        );
    }

    #[test]
    fn horizons() {
        assert_eq!(Period::TenYears.horizon_days(), Some(2520));
        assert_eq!(Period::FiveYears.horizon_days(), Some(1260));
        assert_eq!(Period::OneYear.horizon_days(), Some(252));
        assert_eq!(Period::OneDay.horizon_days(), None);
    }

    #[test]
    fn serde_uses_short_names() {
        let json = serde_json::to_string(&Period::FiveYears).unwrap();
        assert_eq!(json, "\"5y\"");
        let back: Period = serde_json::from_str("\"1y\"").unwrap();
        assert_eq!(back, Period::OneYear);
        assert!(serde_json::from_str::<Period>("\"3m\"").is_err());
    }
}
