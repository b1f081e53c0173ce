//! Three-EMA crossover score.
//!
//! With `a, b, c` = span-9, span-21 and span-55 EMAs of the close:
//! - both `a` and `b` above `c`: `min(100 * ((a-c) + (b-c)) / (2c), 10)`
//! - both below `c`: `-min(100 * ((c-a) + (c-b)) / (2c), 10)`
//! - otherwise, or `c` zero/undefined: 0
//!
//! The sign encodes trend direction, the magnitude the normalized distance of
//! the fast averages from the slow one. Output lies in `[-10, 10]`.

use super::ema::ema_span;
use super::Indicator;

pub const FAST_SPAN: f64 = 9.0;
pub const MID_SPAN: f64 = 21.0;
pub const SLOW_SPAN: f64 = 55.0;

/// Score cap in either direction.
pub const MAX_SCORE: f64 = 10.0;

/// Score a single tick from its three EMA values.
pub fn crossover_score(fast: f64, mid: f64, slow: f64) -> f64 {
    if slow.is_nan() || slow == 0.0 {
        return 0.0;
    }
    if fast > slow && mid > slow {
        (100.0 * ((fast - slow) + (mid - slow)) / (2.0 * slow)).min(MAX_SCORE)
    } else if fast < slow && mid < slow {
        -(100.0 * ((slow - fast) + (slow - mid)) / (2.0 * slow)).min(MAX_SCORE)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ThreeEmaCrossover;

impl ThreeEmaCrossover {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for ThreeEmaCrossover {
    fn name(&self) -> &str {
        "three_ema_crossover"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let fast = ema_span(closes, FAST_SPAN);
        let mid = ema_span(closes, MID_SPAN);
        let slow = ema_span(closes, SLOW_SPAN);
        (0..closes.len())
            .map(|t| crossover_score(fast[t], mid[t], slow[t]))
            .collect()
    }
}
