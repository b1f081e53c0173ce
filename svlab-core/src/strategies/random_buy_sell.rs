//! Random trades bracketed by small stops.
//!
//! Action is `U * R` with `U` uniform over {-1, 0, 1} and `R` uniform in
//! [0, 1). Every tick also registers a stop-loss at 97% and a stop-win at 107%
//! of the current price, each with quantity -0.1.

use super::Strategy;
use crate::domain::{HistoryView, StrategyDecision};
use rand::rngs::StdRng;
use rand::Rng;

pub const STOP_LOSS_RATIO: f64 = 0.97;
pub const STOP_WIN_RATIO: f64 = 1.07;
pub const STOP_QUANTITY: f64 = -0.1;

#[derive(Debug, Clone, Default)]
pub struct RandomBuySell;

impl RandomBuySell {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for RandomBuySell {
    fn name(&self) -> &str {
        "random_buy_sell"
    }

    fn decide(
        &self,
        _history: &HistoryView<'_>,
        _owned: f64,
        price: f64,
        _capital: f64,
        rng: &mut StdRng,
    ) -> StrategyDecision {
        let direction: i32 = rng.gen_range(-1..=1);
        let size: f64 = rng.gen();
        StrategyDecision::trade(direction as f64 * size)
            .with_stop_loss(price * STOP_LOSS_RATIO, STOP_QUANTITY)
            .with_stop_win(price * STOP_WIN_RATIO, STOP_QUANTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PriceSeries, StopOrder};
    use rand::SeedableRng;

    #[test]
    fn action_bounded_and_stops_bracket_price() {
        let series = PriceSeries::from_closes("T", vec![200.0]);
        let h = series.history(0);
        let mut rng = StdRng::seed_from_u64(11);
        let s = RandomBuySell::new();

        for _ in 0..200 {
            let d = s.decide(&h, 1.0, 200.0, 1000.0, &mut rng);
            assert!(d.action > -1.0 && d.action < 1.0);
            assert_eq!(d.stop_loss, Some(StopOrder::new(200.0 * 0.97, -0.1)));
            assert_eq!(d.stop_win, Some(StopOrder::new(200.0 * 1.07, -0.1)));
        }
    }

    #[test]
    fn same_seed_same_decisions() {
        let series = PriceSeries::from_closes("T", vec![50.0]);
        let h = series.history(0);
        let s = RandomBuySell::new();
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|_| s.decide(&h, 0.0, 50.0, 100.0, &mut rng).action)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
        assert_ne!(run(3), run(4));
    }

    #[test]
    fn all_three_directions_occur() {
        let series = PriceSeries::from_closes("T", vec![50.0]);
        let h = series.history(0);
        let mut rng = StdRng::seed_from_u64(5);
        let s = RandomBuySell::new();
        let actions: Vec<f64> = (0..300)
            .map(|_| s.decide(&h, 0.0, 50.0, 100.0, &mut rng).action)
            .collect();
        assert!(actions.iter().any(|&a| a > 0.0));
        assert!(actions.iter().any(|&a| a < 0.0));
        assert!(actions.iter().any(|&a| a == 0.0));
    }
}
