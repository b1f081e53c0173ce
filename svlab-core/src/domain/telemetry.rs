//! Per-tick telemetry produced by the backtest engine.

use serde::{Deserialize, Serialize};

/// Four equal-length sequences: price, capital, stocks owned and wealth.
///
/// Invariant: `wealth[i] == stocks_owned[i] * price[i] + capital[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub price: Vec<f64>,
    pub capital: Vec<f64>,
    pub stocks_owned: Vec<f64>,
    pub wealth: Vec<f64>,
}

impl Telemetry {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            price: Vec::with_capacity(n),
            capital: Vec::with_capacity(n),
            stocks_owned: Vec::with_capacity(n),
            wealth: Vec::with_capacity(n),
        }
    }

    /// Record one tick. Wealth is derived, never passed in.
    pub fn push(&mut self, price: f64, capital: f64, stocks_owned: f64) -> f64 {
        let wealth = stocks_owned * price + capital;
        self.price.push(price);
        self.capital.push(capital);
        self.stocks_owned.push(stocks_owned);
        self.wealth.push(wealth);
        wealth
    }

    pub fn len(&self) -> usize {
        self.price.len()
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_empty()
    }

    pub fn final_wealth(&self) -> Option<f64> {
        self.wealth.last().copied()
    }

    pub fn final_capital(&self) -> Option<f64> {
        self.capital.last().copied()
    }

    /// All four sequences agree in length and every tick satisfies the
    /// wealth identity within `tolerance` (relative to the magnitudes involved).
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        let n = self.price.len();
        if self.capital.len() != n || self.stocks_owned.len() != n || self.wealth.len() != n {
            return false;
        }
        (0..n).all(|i| {
            let expected = self.stocks_owned[i] * self.price[i] + self.capital[i];
            let scale = 1.0_f64
                .max((self.stocks_owned[i] * self.price[i]).abs())
                .max(self.capital[i].abs());
            (self.wealth[i] - expected).abs() <= tolerance * scale
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_derives_wealth() {
        let mut t = Telemetry::default();
        let w = t.push(100.0, 9900.0, 1.0);
        assert_eq!(w, 10_000.0);
        assert_eq!(t.final_wealth(), Some(10_000.0));
        assert_eq!(t.len(), 1);
        assert!(t.is_consistent(1e-12));
    }

    #[test]
    fn mismatched_lengths_are_inconsistent() {
        let mut t = Telemetry::default();
        t.push(1.0, 1.0, 1.0);
        t.wealth.push(3.0);
        assert!(!t.is_consistent(1e-9));
    }
}
