//! End-to-end evaluation: real backtest, calibration, simulated backtests.
//!
//! Steps:
//! 1. Resolve the strategy and precompute names
//! 2. Fetch the real series and backtest it on stream (`"backtest"`, 0)
//! 3. Fetch the calibration series, calibrate and emit `num_paths` paths
//! 4. Denormalize onto the latest close
//! 5. Backtest every path on the rayon pool, stream (`"backtest"`, k + 1)
//! 6. Summarize and hand the report to the sink

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use svlab_core::data::{closes, DataError, Period, PriceFeed, RawBar};
use svlab_core::domain::PriceSeries;
use svlab_core::engine::{run_backtest, EngineError};
use svlab_core::factory::{create_strategy, resolve_indicators};
use svlab_core::rng::RngHierarchy;
use svlab_core::sv::{
    denormalize, path_length_for, simulate_stock_paths, ReturnHistogram, SvError, DEFAULT_BINS,
};

use crate::config::{ConfigError, RunConfig};
use crate::report::{
    EvaluationReport, ReportSink, SimulatedRun, SummaryStats, SvDiagnostics, SCHEMA_VERSION,
};

/// Errors that abort an evaluation.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("simulation error: {0}")]
    Sv(#[from] SvError),

    #[error("simulated path {index}: {source}")]
    SimulatedPath { index: usize, source: EngineError },

    #[error("report sink failed: {0}")]
    Report(String),
}

fn fetch_nonempty(
    feed: &dyn PriceFeed,
    ticker: &str,
    period: Period,
) -> Result<Vec<RawBar>, DataError> {
    let bars = feed.fetch(ticker, period)?;
    if bars.is_empty() {
        return Err(DataError::EmptySeries {
            symbol: ticker.to_string(),
            period,
        });
    }
    debug!(feed = feed.name(), ticker, %period, bars = bars.len(), "fetched");
    Ok(bars)
}

/// Run one evaluation and pass the report to `sink`.
///
/// Ruin on any path is reported, not raised. An engine failure on any
/// simulated path fails the whole evaluation.
pub fn run_evaluation(
    config: &RunConfig,
    feed: &dyn PriceFeed,
    sink: &mut dyn ReportSink,
) -> Result<EvaluationReport, RunError> {
    let report = evaluate(config, feed)?;
    sink.consume(&report)
        .map_err(|e| RunError::Report(format!("{e:#}")))?;
    Ok(report)
}

/// [`run_evaluation`] without a sink.
pub fn evaluate(config: &RunConfig, feed: &dyn PriceFeed) -> Result<EvaluationReport, RunError> {
    config.validate()?;
    let strategy = create_strategy(&config.backtest.strategy).map_err(ConfigError::from)?;
    let indicators = resolve_indicators(&config.precompute_names()).map_err(ConfigError::from)?;
    let engine_config = config.engine_config();
    let rng = RngHierarchy::from_optional(config.simulation.seed);
    let run_id = config.run_id(rng.master_seed())?;
    let ticker = config.market.ticker.as_str();

    info!(
        run_id = %run_id,
        ticker,
        strategy = strategy.name(),
        seed = rng.master_seed(),
        "starting evaluation"
    );

    // ── Real series ──────────────────────────────────────────────────
    let real_bars = fetch_nonempty(feed, ticker, config.market.real_period)?;
    let real_series = PriceSeries::from_bars(ticker, &real_bars);
    let real = run_backtest(
        &real_series,
        &indicators,
        strategy.as_ref(),
        &engine_config,
        &mut rng.rng_for("backtest", 0),
    )?;
    info!(
        ticks = real.ticks(),
        final_wealth = real.final_wealth().unwrap_or(f64::NAN),
        "real backtest complete"
    );

    // ── Calibration and emission ─────────────────────────────────────
    let sim_period = config.market.sim_period;
    let horizon = sim_period
        .horizon_days()
        .ok_or(ConfigError::NoHorizon(sim_period))?;
    let num_paths = config.simulation.num_paths;
    let path_length = path_length_for(horizon, num_paths);

    let calib_bars = fetch_nonempty(feed, ticker, sim_period)?;
    let output = simulate_stock_paths(
        &closes(&calib_bars),
        num_paths,
        path_length,
        &config.calibration_config(),
        &rng,
    )?;

    let spot_bars = fetch_nonempty(feed, ticker, Period::OneDay)?;
    let start_price = spot_bars
        .last()
        .map(|b| b.close)
        .ok_or_else(|| DataError::EmptySeries {
            symbol: ticker.to_string(),
            period: Period::OneDay,
        })?;
    let priced = denormalize(&output.paths, start_price);

    // ── Simulated backtests ──────────────────────────────────────────
    let sims = priced
        .into_par_iter()
        .enumerate()
        .map(|(k, prices)| {
            let series = PriceSeries::from_closes(format!("{ticker}#{k}"), prices);
            let mut path_rng = rng.rng_for("backtest", k as u64 + 1);
            run_backtest(
                &series,
                &indicators,
                strategy.as_ref(),
                &engine_config,
                &mut path_rng,
            )
            .map(|result| SimulatedRun {
                index: k,
                prices: series.closes().to_vec(),
                result,
            })
            .map_err(|source| RunError::SimulatedPath { index: k, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let finals: Vec<f64> = sims.iter().filter_map(|s| s.result.final_wealth()).collect();
    let summary = SummaryStats::compute(engine_config.start_capital, real.final_wealth(), &finals);
    info!(
        paths = summary.count,
        mean = summary.mean.unwrap_or(f64::NAN),
        "simulated backtests complete"
    );

    let diagnostics = config.simulation.diagnostics.then(|| SvDiagnostics {
        histogram: ReturnHistogram::build(
            &output.simulated_log_returns,
            &output.empirical_log_returns,
            DEFAULT_BINS,
        ),
        calibration: output.calibration.clone(),
        normalized_paths: output.paths.clone(),
    });

    Ok(EvaluationReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        ticker: ticker.to_string(),
        strategy: strategy.name().to_string(),
        master_seed: rng.master_seed(),
        real_period: config.market.real_period,
        sim_period,
        path_length,
        start_price,
        real_dates: real_series.dates().map(<[_]>::to_vec).unwrap_or_default(),
        real,
        sims,
        summary,
        diagnostics,
        config: config.clone(),
    })
}
