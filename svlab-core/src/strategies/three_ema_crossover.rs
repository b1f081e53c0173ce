//! Trend follower on the three-EMA crossover score.
//!
//! Score `x > 1`: buy `floor(capital / price) / 10 * x` shares with a stop-loss
//! at 93% and a stop-win at 105% of the price, both for the bought quantity.
//! Score `x < -1`: sell `owned / 5 * x` (a negative quantity), no stops.
//! Otherwise hold. A non-positive price never buys.

use super::Strategy;
use crate::domain::{HistoryView, StrategyDecision};
use rand::rngs::StdRng;

/// Column the strategy reads; attached by the matching registry indicator.
pub const CROSSOVER_COLUMN: &str = "indicator_three_ema_crossover";

pub const ENTRY_THRESHOLD: f64 = 1.0;
pub const STOP_LOSS_RATIO: f64 = 0.93;
pub const STOP_WIN_RATIO: f64 = 1.05;

#[derive(Debug, Clone, Default)]
pub struct ThreeEmaCrossoverStrategy;

impl ThreeEmaCrossoverStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for ThreeEmaCrossoverStrategy {
    fn name(&self) -> &str {
        "three_ema_crossover"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[CROSSOVER_COLUMN]
    }

    fn decide(
        &self,
        history: &HistoryView<'_>,
        owned: f64,
        price: f64,
        capital: f64,
        _rng: &mut StdRng,
    ) -> StrategyDecision {
        let crossover = history.latest(CROSSOVER_COLUMN).unwrap_or(0.0);

        if crossover > ENTRY_THRESHOLD && price > 0.0 {
            let max_buy = (capital / price).floor();
            let buy_number = max_buy / 10.0 * crossover;
            return StrategyDecision::trade(buy_number)
                .with_stop_loss(price * STOP_LOSS_RATIO, buy_number)
                .with_stop_win(price * STOP_WIN_RATIO, buy_number);
        }

        if crossover < -ENTRY_THRESHOLD {
            return StrategyDecision::trade(owned / 5.0 * crossover);
        }

        StrategyDecision::hold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PriceSeries, StopOrder};
    use crate::indicators::assert_approx;
    use rand::SeedableRng;

    fn series_with_score(score: f64) -> PriceSeries {
        let mut s = PriceSeries::from_closes("T", vec![100.0, 100.0]);
        s.insert_column(CROSSOVER_COLUMN, vec![0.0, score]).unwrap();
        s
    }

    #[test]
    fn bullish_score_buys_with_bracket() {
        // floor(1050 / 100) = 10 -> 10 / 10 * 2 = 2 shares
        let s = series_with_score(2.0);
        let mut rng = StdRng::seed_from_u64(0);
        let d = ThreeEmaCrossoverStrategy::new().decide(&s.history(1), 0.0, 100.0, 1050.0, &mut rng);
        assert_approx(d.action, 2.0, 1e-12);
        assert_eq!(d.stop_loss, Some(StopOrder::new(100.0 * STOP_LOSS_RATIO, 2.0)));
        assert_eq!(d.stop_win, Some(StopOrder::new(100.0 * STOP_WIN_RATIO, 2.0)));
    }

    #[test]
    fn bearish_score_sells_fraction_of_holdings() {
        // 10 / 5 * -3 = -6
        let s = series_with_score(-3.0);
        let mut rng = StdRng::seed_from_u64(0);
        let d = ThreeEmaCrossoverStrategy::new().decide(&s.history(1), 10.0, 100.0, 0.0, &mut rng);
        assert_approx(d.action, -6.0, 1e-12);
        assert!(d.stop_loss.is_none() && d.stop_win.is_none());
    }

    #[test]
    fn weak_score_holds() {
        for score in [1.0, 0.5, 0.0, -0.9, -1.0] {
            let s = series_with_score(score);
            let mut rng = StdRng::seed_from_u64(0);
            let d =
                ThreeEmaCrossoverStrategy::new().decide(&s.history(1), 5.0, 100.0, 500.0, &mut rng);
            assert_eq!(d, StrategyDecision::hold(), "score {score}");
        }
    }

    #[test]
    fn zero_price_does_not_buy() {
        let s = series_with_score(4.0);
        let mut rng = StdRng::seed_from_u64(0);
        let d = ThreeEmaCrossoverStrategy::new().decide(&s.history(1), 0.0, 0.0, 1000.0, &mut rng);
        assert_eq!(d, StrategyDecision::hold());
    }

    #[test]
    fn reads_current_tick_only() {
        let s = series_with_score(5.0);
        let mut rng = StdRng::seed_from_u64(0);
        // At tick 0 the score is still 0
        let d = ThreeEmaCrossoverStrategy::new().decide(&s.history(0), 0.0, 100.0, 1000.0, &mut rng);
        assert_eq!(d, StrategyDecision::hold());
    }
}
