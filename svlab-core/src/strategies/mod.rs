//! Strategy trait and the built-in strategies.
//!
//! A strategy sees only the look-ahead-free history `[0, i]`, the current
//! holdings, price and capital, and answers with a [`StrategyDecision`].
//! Strategies hold no state across ticks or runs; randomized ones draw from the
//! RNG the engine hands them so a seeded run replays exactly.

pub mod buy_one_sell_one;
pub mod random_buy_sell;
pub mod three_ema_crossover;

pub use buy_one_sell_one::BuyOneSellOne;
pub use random_buy_sell::RandomBuySell;
pub use three_ema_crossover::ThreeEmaCrossoverStrategy;

use crate::domain::{HistoryView, StrategyDecision};
use rand::rngs::StdRng;

/// Trait for trading strategies.
///
/// # Architecture contract
/// `history` is truncated at the current tick. A strategy must not reach
/// for data beyond it; the type only exposes `[0, i]`.
pub trait Strategy: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Derived columns this strategy reads. The engine refuses to start when
    /// the series lacks any of them.
    fn required_columns(&self) -> &'static [&'static str] {
        &[]
    }

    /// Decide what to do at the current tick.
    fn decide(
        &self,
        history: &HistoryView<'_>,
        owned: f64,
        price: f64,
        capital: f64,
        rng: &mut StdRng,
    ) -> StrategyDecision;
}
