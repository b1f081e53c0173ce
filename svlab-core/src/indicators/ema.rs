//! Exponentially weighted moving average.
//!
//! Adjusted weighting: at tick t the mean is
//! `Σ (1-α)^k · c[t-k] / Σ (1-α)^k` over every observation seen so far, so the
//! series is defined from the very first close (no SMA seed, no warmup).
//! `α = 2 / (span + 1)` or `α = 1 - exp(-ln 2 / halflife)`.
//! A NaN close contributes no weight but still ages earlier observations.

use super::Indicator;

/// How the smoothing factor is specified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmaWeighting {
    Span(f64),
    Halflife(f64),
}

impl EmaWeighting {
    pub fn alpha(&self) -> f64 {
        match *self {
            EmaWeighting::Span(span) => 2.0 / (span + 1.0),
            EmaWeighting::Halflife(h) => 1.0 - (-std::f64::consts::LN_2 / h).exp(),
        }
    }
}

/// Adjusted exponentially weighted mean with smoothing factor `alpha`.
pub fn ewm_mean(values: &[f64], alpha: f64) -> Vec<f64> {
    let decay = 1.0 - alpha;
    let mut num = 0.0;
    let mut den = 0.0;
    values
        .iter()
        .map(|&v| {
            num *= decay;
            den *= decay;
            if !v.is_nan() {
                num += v;
                den += 1.0;
            }
            if den > 0.0 {
                num / den
            } else {
                f64::NAN
            }
        })
        .collect()
}

pub fn ema_span(values: &[f64], span: f64) -> Vec<f64> {
    ewm_mean(values, EmaWeighting::Span(span).alpha())
}

pub fn ema_halflife(values: &[f64], halflife: f64) -> Vec<f64> {
    ewm_mean(values, EmaWeighting::Halflife(halflife).alpha())
}

#[derive(Debug, Clone)]
pub struct Ema {
    weighting: EmaWeighting,
    name: String,
}

impl Ema {
    pub fn span(span: f64) -> Self {
        assert!(span >= 1.0, "EMA span must be >= 1");
        Self {
            weighting: EmaWeighting::Span(span),
            name: format!("ema_{span}"),
        }
    }

    pub fn halflife(halflife: f64) -> Self {
        assert!(halflife > 0.0, "EMA halflife must be > 0");
        Self {
            weighting: EmaWeighting::Halflife(halflife),
            name: format!("ema_hl_{halflife}"),
        }
    }

    pub fn weighting(&self) -> EmaWeighting {
        self.weighting
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        ewm_mean(closes, self.weighting.alpha())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn span_3_known_values() {
        // alpha = 0.5, decay = 0.5
        // t0: 10
        // t1: (11 + 0.5*10) / 1.5 = 16 / 1.5 = 10.6667
        // t2: (12 + 0.5*11 + 0.25*10) / 1.75 = 20 / 1.75 = 11.4286
        let r = ema_span(&[10.0, 11.0, 12.0], 3.0);
        assert_approx(r[0], 10.0, DEFAULT_EPSILON);
        assert_approx(r[1], 16.0 / 1.5, DEFAULT_EPSILON);
        assert_approx(r[2], 20.0 / 1.75, DEFAULT_EPSILON);
    }

    #[test]
    fn span_1_equals_close() {
        let r = ema_span(&[100.0, 200.0, 300.0], 1.0);
        assert_eq!(r, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn halflife_alpha() {
        // halflife 1: weight halves every tick, alpha = 0.5
        assert_approx(EmaWeighting::Halflife(1.0).alpha(), 0.5, DEFAULT_EPSILON);
        let hl = ema_halflife(&[10.0, 11.0, 12.0], 1.0);
        let sp = ema_span(&[10.0, 11.0, 12.0], 3.0);
        for (a, b) in hl.iter().zip(&sp) {
            assert_approx(*a, *b, 1e-9);
        }
    }

    #[test]
    fn constant_series_is_constant() {
        let r = ema_span(&[42.0; 50], 55.0);
        assert!(r.iter().all(|v| (v - 42.0).abs() < 1e-9));
    }

    #[test]
    fn nan_keeps_previous_value_and_ages_weights() {
        // t1 NaN: value stays 10; t2 weights are 1 (12) and 0.25 (10)
        let r = ema_span(&[10.0, f64::NAN, 12.0], 3.0);
        assert_approx(r[1], 10.0, DEFAULT_EPSILON);
        assert_approx(r[2], (12.0 + 0.25 * 10.0) / 1.25, DEFAULT_EPSILON);
    }

    #[test]
    fn leading_nan_is_missing() {
        let r = ema_span(&[f64::NAN, 5.0], 3.0);
        assert!(r[0].is_nan());
        assert_approx(r[1], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn names() {
        assert_eq!(Ema::span(9.0).name(), "ema_9");
        assert_eq!(Ema::halflife(2.5).name(), "ema_hl_2.5");
    }
}
