//! Stochastic-volatility path simulator.
//!
//! - [`model`]: the discretized process and its empirical constants
//! - [`wasserstein`]: distance between return distributions
//! - [`calibrate`]: voting grid search over `(κ, ξ, ρ)`
//! - [`generator`]: calibrate-then-emit entry point
//! - [`diagnostics`]: return histograms

pub mod calibrate;
pub mod diagnostics;
pub mod generator;
pub mod model;
pub mod wasserstein;

pub use calibrate::{
    calibrate, score_point, CalibrationConfig, CalibrationResult, ParameterGrid, RankedParams,
};
pub use diagnostics::{ReturnHistogram, DEFAULT_BINS};
pub use generator::{
    denormalize, empirical_log_returns, path_length_for, simulate_stock_paths, SimulationOutput,
};
pub use model::{log_returns, SvConstants, SvModel, SvParams, TRADING_DAYS};
pub use wasserstein::wasserstein_distance;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SvError {
    #[error("history too short: {rows} closes, need at least {required}")]
    TooShort { rows: usize, required: usize },

    #[error("invalid close {value} at index {index}")]
    InvalidPrice { index: usize, value: f64 },

    #[error("path length must be at least 2, got {0}")]
    InvalidPathLength(usize),

    #[error("calibration grid, sweep count and top-k must all be non-empty")]
    EmptyGrid,

    #[error("at least one path is required")]
    NoPaths,
}
