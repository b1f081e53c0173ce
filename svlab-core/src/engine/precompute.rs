//! Indicator precomputation.
//!
//! All indicators are computed once before the tick loop begins and attached
//! to the series as named columns, in the order given. Undefined entries are
//! replaced with 0 so no NaN reaches a strategy.

use crate::domain::{PriceSeries, SeriesError};
use crate::indicators::{fill_missing, Indicator};

/// Attach every indicator's output to `series`.
///
/// A later indicator with the same name replaces the earlier column.
pub fn precompute_indicators(
    series: &mut PriceSeries,
    indicators: &[Box<dyn Indicator>],
) -> Result<(), SeriesError> {
    for indicator in indicators {
        let values = fill_missing(indicator.compute(series.closes()));
        series.insert_column(indicator.name(), values)?;
    }
    Ok(())
}

/// Longest warmup across a set of indicators.
pub fn compute_warmup(indicators: &[Box<dyn Indicator>]) -> usize {
    indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::resolve_indicators;
    use crate::indicators::{Named, Sma};

    #[test]
    fn precompute_attaches_zero_filled_columns() {
        let mut series = PriceSeries::from_closes("SPY", vec![10.0, 11.0, 12.0, 13.0, 14.0]);
        let indicators: Vec<Box<dyn Indicator>> = vec![Box::new(Sma::new(3))];
        precompute_indicators(&mut series, &indicators).unwrap();

        let col = series.column("sma_3").unwrap();
        assert_eq!(col.len(), 5);
        assert_eq!(col[0], 0.0);
        assert_eq!(col[1], 0.0);
        assert!((col[2] - 11.0).abs() < 1e-10);
    }

    #[test]
    fn precompute_from_registry_names() {
        let closes: Vec<f64> = (0..80).map(|i| 50.0 + (i as f64 * 0.2).cos()).collect();
        let mut series = PriceSeries::from_closes("X", closes);
        let indicators = resolve_indicators(&[
            "indicator_three_ema_crossover",
            "feature_donchian",
            "feature_zscore",
        ])
        .unwrap();
        precompute_indicators(&mut series, &indicators).unwrap();

        let names: Vec<&str> = series.column_names().collect();
        assert_eq!(names.len(), 5);
        for name in names {
            let col = series.column(name).unwrap();
            assert_eq!(col.len(), 80);
            assert!(col.iter().all(|v| v.is_finite()), "{name}");
        }
    }

    #[test]
    fn same_name_replaces_column() {
        let mut series = PriceSeries::from_closes("X", vec![1.0, 2.0, 3.0]);
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Named::new("f", Sma::new(1))),
            Box::new(Named::new("f", Sma::new(2))),
        ];
        precompute_indicators(&mut series, &indicators).unwrap();
        assert_eq!(series.column("f").unwrap(), &[0.0, 1.5, 2.5]);
    }

    #[test]
    fn warmup_is_max_lookback() {
        let indicators: Vec<Box<dyn Indicator>> =
            vec![Box::new(Sma::new(3)), Box::new(Sma::new(20))];
        assert_eq!(compute_warmup(&indicators), 19);
        assert_eq!(compute_warmup(&[]), 0);
    }
}
