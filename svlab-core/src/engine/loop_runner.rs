//! Tick-by-tick backtest loop: the heart of the engine.
//!
//! Per tick:
//! 1. Decide: the strategy sees history `[0, i]`, holdings, price, capital
//! 2. Register the decision's stops
//! 3. Trigger: `action -= Σ fired stop-loss qty`, `action += Σ fired stop-win qty`
//! 4. Clamp to holdings / affordability, then trade and pay the fee
//! 5. Custody charge on every `custody_interval`-th tick
//! 6. Record telemetry; stop when wealth <= 0

use super::precompute::precompute_indicators;
use super::state::{EngineConfig, PortfolioState, RunResult};
use super::stops::StopError;
use crate::domain::{PriceSeries, SeriesError};
use crate::indicators::Indicator;
use crate::strategies::Strategy;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::debug;

/// Fatal engine errors. Ruin is not one of them.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("non-finite price {value} at tick {tick}")]
    NonFinitePrice { tick: usize, value: f64 },

    #[error("negative price {value} at tick {tick}")]
    NegativePrice { tick: usize, value: f64 },

    #[error("strategy '{strategy}' needs column '{column}', which was not precomputed")]
    MissingColumn { strategy: String, column: String },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("tick {tick}: {source}")]
    Stop { tick: usize, source: StopError },
}

/// Precompute `indicators` on a private copy of `series`, then run the loop.
///
/// The caller's series is left untouched; only the run result comes back.
pub fn run_backtest(
    series: &PriceSeries,
    indicators: &[Box<dyn Indicator>],
    strategy: &dyn Strategy,
    config: &EngineConfig,
    rng: &mut StdRng,
) -> Result<RunResult, EngineError> {
    let mut series = series.clone();
    precompute_indicators(&mut series, indicators)?;
    run_precomputed(&series, strategy, config, rng)
}

/// Run the loop over a series whose columns are already attached.
pub fn run_precomputed(
    series: &PriceSeries,
    strategy: &dyn Strategy,
    config: &EngineConfig,
    rng: &mut StdRng,
) -> Result<RunResult, EngineError> {
    // ─── Validation ──────────────────────────────────────────────────
    if let Some((tick, &value)) = series
        .closes()
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite())
    {
        return Err(EngineError::NonFinitePrice { tick, value });
    }
    // A price of exactly 0 is a worthless asset, not bad data: buys clamp to
    // nothing and the wealth check decides ruin.
    if let Some((tick, &value)) = series.closes().iter().enumerate().find(|(_, p)| **p < 0.0) {
        return Err(EngineError::NegativePrice { tick, value });
    }
    for column in strategy.required_columns() {
        if !series.has_column(column) {
            return Err(EngineError::MissingColumn {
                strategy: strategy.name().to_string(),
                column: column.to_string(),
            });
        }
    }

    let mut state = PortfolioState::new(config.start_capital);
    let mut result = RunResult::with_capacity(series.len());

    for (i, &price) in series.closes().iter().enumerate() {
        // ─── Decide ──────────────────────────────────────────────────
        let history = series.history(i);
        let decision = strategy.decide(&history, state.stocks_owned, price, state.capital, rng);

        let at_tick = |source| EngineError::Stop { tick: i, source };
        if let Some(stop) = decision.stop_loss {
            state.stop_losses.register(stop).map_err(at_tick)?;
        }
        if let Some(stop) = decision.stop_win {
            state.stop_wins.register(stop).map_err(at_tick)?;
        }

        // ─── Stops ───────────────────────────────────────────────────
        let mut action = decision.action;
        let lost = state.stop_losses.trigger(price);
        action -= lost.quantity;
        let won = state.stop_wins.trigger(price);
        action += won.quantity;
        result.stops_triggered += lost.entries + won.entries;

        // ─── Trade ───────────────────────────────────────────────────
        let action = state.clamp_action(action, price, config.transaction_fee);
        result.fees_paid += state.apply_trade(action, price, config.transaction_fee);

        // ─── Custody ─────────────────────────────────────────────────
        if config.is_custody_tick(i) {
            result.custody_paid += state.charge_custody(config.custody_fee);
        }

        // ─── Record ──────────────────────────────────────────────────
        let wealth = result
            .telemetry
            .push(price, state.capital, state.stocks_owned);
        result.actions.push(action);

        if wealth <= 0.0 {
            debug!(tick = i, wealth, "wealth exhausted, run truncated");
            result.terminated_at = Some(i);
            break;
        }
    }

    debug!(
        strategy = strategy.name(),
        ticks = result.ticks(),
        final_wealth = result.final_wealth().unwrap_or(config.start_capital),
        stops = result.stops_triggered,
        "backtest finished"
    );
    Ok(result)
}
