//! Property tests for engine and feature invariants.
//!
//! Uses proptest to verify:
//! 1. Wealth identity: wealth == owned * price + capital at every tick
//! 2. Length agreement: telemetry spans every tick, or stops at ruin
//! 3. No shorting and affordability: owned >= 0, capital >= 0
//! 4. Feature fill: precomputed columns are finite and full length
//! 5. Crossover bounds: the score stays in [-10, 10]
//! 6. Seed replay: identical seeds give identical runs

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use svlab_core::domain::PriceSeries;
use svlab_core::engine::{precompute_indicators, run_backtest, EngineConfig, RunResult};
use svlab_core::factory::{available_indicators, create_strategy, resolve_indicators};
use svlab_core::indicators::{crossover_score, Indicator, ThreeEmaCrossover};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, 1..300)
}

fn arb_strategy_name() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("buy_one_sell_one"),
        Just("random_buy_sell"),
        Just("three_ema_crossover"),
    ]
}

fn arb_config() -> impl Strategy<Value = EngineConfig> {
    (100.0..100_000.0_f64, 0.0..0.05_f64, 0.0..0.1_f64)
        .prop_map(|(capital, fee, custody)| EngineConfig::new(capital, fee, custody))
}

fn backtest(closes: Vec<f64>, strategy: &str, config: &EngineConfig, seed: u64) -> RunResult {
    let series = PriceSeries::from_closes("P", closes);
    let indicators = resolve_indicators(&["indicator_three_ema_crossover"]).unwrap();
    let strategy = create_strategy(strategy).unwrap();
    run_backtest(
        &series,
        &indicators,
        strategy.as_ref(),
        config,
        &mut StdRng::seed_from_u64(seed),
    )
    .unwrap()
}

// ── 1–3. Portfolio invariants ────────────────────────────────────────

proptest! {
    #[test]
    fn wealth_identity_holds_every_tick(
        closes in arb_closes(),
        name in arb_strategy_name(),
        config in arb_config(),
        seed in any::<u64>(),
    ) {
        let r = backtest(closes, name, &config, seed);
        prop_assert!(r.telemetry.is_consistent(1e-6));
    }

    #[test]
    fn telemetry_length_matches_ticks_or_ruin(
        closes in arb_closes(),
        name in arb_strategy_name(),
        config in arb_config(),
        seed in any::<u64>(),
    ) {
        let n = closes.len();
        let r = backtest(closes, name, &config, seed);
        let expected = r.terminated_at.map_or(n, |t| t + 1);
        prop_assert_eq!(r.telemetry.len(), expected);
        prop_assert_eq!(r.telemetry.price.len(), expected);
        prop_assert_eq!(r.telemetry.capital.len(), expected);
        prop_assert_eq!(r.telemetry.stocks_owned.len(), expected);
        prop_assert_eq!(r.actions.len(), expected);
    }

    #[test]
    fn never_short_never_overdrawn(
        closes in arb_closes(),
        name in arb_strategy_name(),
        config in arb_config(),
        seed in any::<u64>(),
    ) {
        let r = backtest(closes, name, &config, seed);
        for (&owned, &capital) in r.telemetry.stocks_owned.iter().zip(&r.telemetry.capital) {
            prop_assert!(owned >= -1e-9, "owned {}", owned);
            prop_assert!(capital >= -1e-6, "capital {}", capital);
        }
    }

    #[test]
    fn same_seed_same_run(
        closes in arb_closes(),
        config in arb_config(),
        seed in any::<u64>(),
    ) {
        let a = backtest(closes.clone(), "random_buy_sell", &config, seed);
        let b = backtest(closes, "random_buy_sell", &config, seed);
        prop_assert_eq!(a, b);
    }
}

// ── 4. Feature fill ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn every_registered_feature_fills_without_nan(closes in arb_closes()) {
        let n = closes.len();
        let mut series = PriceSeries::from_closes("F", closes);
        let indicators = resolve_indicators(available_indicators()).unwrap();
        precompute_indicators(&mut series, &indicators).unwrap();

        let names: Vec<String> = series.column_names().map(str::to_string).collect();
        prop_assert!(!names.is_empty());
        for name in names {
            let col = series.column(&name).unwrap();
            prop_assert_eq!(col.len(), n);
            prop_assert!(col.iter().all(|v| v.is_finite()), "{} has a non-finite value", name);
        }
    }
}

// ── 5. Crossover bounds ──────────────────────────────────────────────

proptest! {
    #[test]
    fn crossover_score_is_bounded(
        fast in 0.01..1000.0_f64,
        mid in 0.01..1000.0_f64,
        slow in 0.01..1000.0_f64,
    ) {
        let s = crossover_score(fast, mid, slow);
        prop_assert!((-10.0..=10.0).contains(&s));
    }

    #[test]
    fn crossover_indicator_is_bounded(closes in arb_closes()) {
        let values = ThreeEmaCrossover::new().compute(&closes);
        prop_assert_eq!(values.len(), closes.len());
        prop_assert!(values.iter().all(|v| (-10.0..=10.0).contains(v)));
    }
}
