//! Backtesting engine: tick-by-tick portfolio loop and supporting pieces.
//!
//! The engine consumes a price series with precomputed columns, drives one
//! strategy over it, and returns per-tick telemetry. Each run owns its
//! `PortfolioState`; nothing is shared between runs, so simulated paths can be
//! backtested in parallel.

pub mod loop_runner;
pub mod precompute;
pub mod state;
pub mod stops;

pub use loop_runner::{run_backtest, run_precomputed, EngineError};
pub use precompute::{compute_warmup, precompute_indicators};
pub use state::{EngineConfig, PortfolioState, RunResult, DEFAULT_CUSTODY_INTERVAL};
pub use stops::{StopError, StopKind, StopRegistry, Triggered, MAX_TRIGGER_PRICE};
