//! Return-style features: percent return, lag, log return, rate of change.
//!
//! Each one compares a close with an earlier close, so the first `n` values
//! are undefined.

use super::Indicator;

/// `(c[t] - c[t-1]) / c[t-1]`.
pub fn pct_return(values: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for t in 1..values.len() {
        out[t] = (values[t] - values[t - 1]) / values[t - 1];
    }
    out
}

/// `c[t-n]`.
pub fn lag(values: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for t in n..values.len() {
        out[t] = values[t - n];
    }
    out
}

/// `ln(c[t] / c[t-1])`.
pub fn log_return(values: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for t in 1..values.len() {
        out[t] = (values[t] / values[t - 1]).ln();
    }
    out
}

/// Rate of change in percent: `100 * (c[t] - c[t-n]) / c[t-n]`.
pub fn roc(values: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if n == 0 {
        return vec![0.0; values.len()];
    }
    for t in n..values.len() {
        out[t] = 100.0 * (values[t] - values[t - n]) / values[t - n];
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct PctReturn;

impl PctReturn {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for PctReturn {
    fn name(&self) -> &str {
        "pct_return"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        pct_return(closes)
    }
}

#[derive(Debug, Clone)]
pub struct Lag {
    n: usize,
    name: String,
}

impl Lag {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            name: format!("lag_{n}"),
        }
    }
}

impl Indicator for Lag {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.n
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        lag(closes, self.n)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogReturn;

impl LogReturn {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for LogReturn {
    fn name(&self) -> &str {
        "log_return"
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        log_return(closes)
    }
}

#[derive(Debug, Clone)]
pub struct Roc {
    n: usize,
    name: String,
}

impl Roc {
    pub fn new(n: usize) -> Self {
        assert!(n >= 1, "ROC period must be >= 1");
        Self {
            n,
            name: format!("roc_{n}"),
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.n
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        roc(closes, self.n)
    }
}
