//! Feature layer: indicators over a daily close series.
//!
//! Every indicator is a pure function from closes to a same-length column.
//! Raw outputs carry `f64::NAN` where a value is undefined (rolling warmup,
//! shifts, zero denominators); the precompute pass replaces those with 0 via
//! [`fill_missing`] before the engine sees them.
//!
//! Multi-series features (Donchian) are exposed as separate named instances per
//! band, keeping the single-series `Indicator` trait unchanged.

pub mod donchian;
pub mod ema;
pub mod returns;
pub mod rolling;
pub mod three_ema_crossover;

pub use donchian::{Donchian, DonchianBand};
pub use ema::{ema_halflife, ema_span, ewm_mean, Ema, EmaWeighting};
pub use returns::{lag, log_return, pct_return, roc, Lag, LogReturn, PctReturn, Roc};
pub use rolling::{
    rolling_max, rolling_min, rolling_std, rolling_var, sma, zscore, Macd, RollingMax, RollingMin,
    RollingStd, RollingVar, Sma, ZScore,
};
pub use three_ema_crossover::{crossover_score, ThreeEmaCrossover};

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No output value at tick t may depend on closes from tick t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Column name the output is attached under.
    fn name(&self) -> &str;

    /// Number of leading ticks whose output is undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire close series.
    ///
    /// Returns a `Vec<f64>` of the same length as `closes`.
    fn compute(&self, closes: &[f64]) -> Vec<f64>;
}

/// An indicator published under a different column name.
///
/// Registry entries use this so the attached column matches the name the
/// user asked for (`feature_sma` rather than `sma_10`).
pub struct Named<I> {
    name: String,
    inner: I,
}

impl<I: Indicator> Named<I> {
    pub fn new(name: impl Into<String>, inner: I) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

impl<I: Indicator> Indicator for Named<I> {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.inner.lookback()
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        self.inner.compute(closes)
    }
}

/// Replace every non-finite entry with 0.
pub fn fill_missing(mut values: Vec<f64>) -> Vec<f64> {
    for v in values.iter_mut() {
        if !v.is_finite() {
            *v = 0.0;
        }
    }
    values
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_missing_zeroes_undefined() {
        let filled = fill_missing(vec![f64::NAN, 1.0, f64::INFINITY, -2.0]);
        assert_eq!(filled, vec![0.0, 1.0, 0.0, -2.0]);
    }

    #[test]
    fn named_renames_only() {
        let named = Named::new("feature_sma", Sma::new(2));
        assert_eq!(named.name(), "feature_sma");
        assert_eq!(named.lookback(), 1);
        let out = named.compute(&[1.0, 3.0]);
        assert!(out[0].is_nan());
        assert_approx(out[1], 2.0, DEFAULT_EPSILON);
    }

    /// Every catalog indicator must produce the same prefix on a truncated
    /// series as on the full one.
    #[test]
    fn no_lookahead_across_catalog() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0 + i as f64 * 0.1)
            .collect();
        let catalog: Vec<Box<dyn Indicator>> = vec![
            Box::new(PctReturn::new()),
            Box::new(Lag::new(3)),
            Box::new(LogReturn::new()),
            Box::new(Roc::new(10)),
            Box::new(Sma::new(10)),
            Box::new(RollingStd::new(20)),
            Box::new(RollingVar::new(20)),
            Box::new(ZScore::new(20)),
            Box::new(RollingMin::new(20)),
            Box::new(RollingMax::new(20)),
            Box::new(Macd::new(20, 50)),
            Box::new(Ema::span(20.0)),
            Box::new(Ema::halflife(5.0)),
            Box::new(Donchian::new(20, DonchianBand::Upper)),
            Box::new(Donchian::new(20, DonchianBand::Middle)),
            Box::new(Donchian::new(20, DonchianBand::Lower)),
            Box::new(ThreeEmaCrossover::new()),
        ];
        for ind in &catalog {
            let full = ind.compute(&closes);
            assert_eq!(full.len(), closes.len(), "{}", ind.name());
            let cut = 70;
            let partial = ind.compute(&closes[..cut]);
            for t in 0..cut {
                let (a, b) = (full[t], partial[t]);
                assert!(
                    (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-9,
                    "{} differs at {t}: full={a} truncated={b}",
                    ind.name()
                );
            }
        }
    }
}
