//! Alternates between buying and selling a tenth of a share.

use super::Strategy;
use crate::domain::{HistoryView, StrategyDecision};
use rand::rngs::StdRng;

/// Lot traded on every tick.
pub const LOT: f64 = 0.1;

/// Buys `LOT` when flat, sells `LOT` otherwise. Never sets stops.
#[derive(Debug, Clone, Default)]
pub struct BuyOneSellOne;

impl BuyOneSellOne {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for BuyOneSellOne {
    fn name(&self) -> &str {
        "buy_one_sell_one"
    }

    fn decide(
        &self,
        _history: &HistoryView<'_>,
        owned: f64,
        _price: f64,
        _capital: f64,
        _rng: &mut StdRng,
    ) -> StrategyDecision {
        if owned == 0.0 {
            StrategyDecision::trade(LOT)
        } else {
            StrategyDecision::trade(-LOT)
        }
    }
}
