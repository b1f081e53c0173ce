//! Rolling-window features: SMA, sample std/variance, z-score, min/max, MACD.
//!
//! A window containing a NaN yields NaN. Lookback: window - 1.

use super::Indicator;

/// Apply `f` to every full window ending at t; earlier ticks are NaN.
fn rolling_apply(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window {
        return out;
    }
    for t in (window - 1)..n {
        let w = &values[t + 1 - window..=t];
        if w.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[t] = f(w);
    }
    out
}

fn mean(w: &[f64]) -> f64 {
    w.iter().sum::<f64>() / w.len() as f64
}

/// Sample variance (ddof = 1). Undefined for a single observation.
fn sample_var(w: &[f64]) -> f64 {
    if w.len() < 2 {
        return f64::NAN;
    }
    let m = mean(w);
    w.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (w.len() - 1) as f64
}

pub fn sma(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, mean)
}

pub fn rolling_var(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, sample_var)
}

pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| sample_var(w).sqrt())
}

/// `(c[t] - sma) / std` over the trailing window. Undefined when std is 0.
pub fn zscore(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| {
        let sd = sample_var(w).sqrt();
        if sd > 0.0 {
            (w[w.len() - 1] - mean(w)) / sd
        } else {
            f64::NAN
        }
    })
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

macro_rules! window_indicator {
    ($(#[$doc:meta])* $ty:ident, $prefix:literal, $func:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $ty {
            window: usize,
            name: String,
        }

        impl $ty {
            pub fn new(window: usize) -> Self {
                assert!(window >= 1, concat!(stringify!($ty), " window must be >= 1"));
                Self {
                    window,
                    name: format!(concat!($prefix, "_{}"), window),
                }
            }
        }

        impl Indicator for $ty {
            fn name(&self) -> &str {
                &self.name
            }

            fn lookback(&self) -> usize {
                self.window - 1
            }

            fn compute(&self, closes: &[f64]) -> Vec<f64> {
                $func(closes, self.window)
            }
        }
    };
}

window_indicator!(
    /// Simple moving average.
    Sma, "sma", sma
);
window_indicator!(
    /// Rolling sample standard deviation.
    RollingStd, "std", rolling_std
);
window_indicator!(
    /// Rolling sample variance.
    RollingVar, "var", rolling_var
);
window_indicator!(
    /// Rolling z-score of the close against its window.
    ZScore, "zscore", zscore
);
window_indicator!(RollingMin, "rolling_min", rolling_min);
window_indicator!(RollingMax, "rolling_max", rolling_max);

/// Moving-average convergence of two SMAs: `sma_fast - sma_slow`.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize) -> Self {
        assert!(fast >= 1 && slow >= 1, "MACD windows must be >= 1");
        Self {
            fast,
            slow,
            name: format!("macd_{fast}_{slow}"),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.fast.max(self.slow) - 1
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let fast = sma(closes, self.fast);
        let slow = sma(closes, self.slow);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_3_known_values() {
        let r = sma(&[10.0, 11.0, 12.0, 13.0, 14.0], 3);
        assert!(r[0].is_nan() && r[1].is_nan());
        assert_approx(r[2], 11.0, DEFAULT_EPSILON);
        assert_approx(r[3], 12.0, DEFAULT_EPSILON);
        assert_approx(r[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sample_variance_uses_n_minus_one() {
        // window [2, 4, 6]: mean 4, squared deviations 4+0+4 = 8, / 2 = 4
        let r = rolling_var(&[2.0, 4.0, 6.0], 3);
        assert_approx(r[2], 4.0, DEFAULT_EPSILON);
        let s = rolling_std(&[2.0, 4.0, 6.0], 3);
        assert_approx(s[2], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn single_observation_variance_is_missing() {
        assert!(rolling_var(&[1.0, 2.0], 1).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn zscore_known_value() {
        // window [2, 4, 6]: (6 - 4) / 2 = 1
        let z = zscore(&[2.0, 4.0, 6.0], 3);
        assert_approx(z[2], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zscore_flat_window_is_missing() {
        let z = zscore(&[5.0; 4], 3);
        assert!(z.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rolling_extremes() {
        let closes = [3.0, 1.0, 4.0, 1.0, 5.0];
        let lo = rolling_min(&closes, 2);
        let hi = rolling_max(&closes, 2);
        assert_eq!(&lo[1..], &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(&hi[1..], &[3.0, 4.0, 4.0, 5.0]);
    }

    #[test]
    fn nan_in_window_poisons_only_that_window() {
        let r = sma(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(r[1].is_nan() && r[2].is_nan());
        assert_approx(r[3], 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn macd_is_difference_of_smas() {
        let closes: Vec<f64> = (1..=6).map(|v| v as f64).collect();
        let m = Macd::new(2, 4).compute(&closes);
        assert!(m[2].is_nan());
        // sma2[3] = 3.5, sma4[3] = 2.5
        assert_approx(m[3], 1.0, DEFAULT_EPSILON);
        assert_eq!(Macd::new(2, 4).lookback(), 3);
    }

    #[test]
    fn window_names() {
        assert_eq!(Sma::new(10).name(), "sma_10");
        assert_eq!(RollingStd::new(20).name(), "std_20");
        assert_eq!(ZScore::new(5).lookback(), 4);
    }
}
