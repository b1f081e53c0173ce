//! Path generation: calibrate on a close series, then emit normalized paths.

use super::calibrate::{calibrate, CalibrationConfig, CalibrationResult};
use super::model::{log_returns, SvModel};
use super::SvError;
use crate::rng::RngHierarchy;
use serde::Serialize;
use tracing::info;

/// Calibrated paths plus the samples the calibration compared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOutput {
    /// `num_paths` normalized paths, each starting at 1.
    pub paths: Vec<Vec<f64>>,
    /// Log-returns of every emitted path, concatenated.
    pub simulated_log_returns: Vec<f64>,
    /// Log-returns of the input closes.
    pub empirical_log_returns: Vec<f64>,
    pub calibration: CalibrationResult,
}

/// Per-path length so that `num_paths` paths together span `2 * horizon_days`,
/// rounded half to even.
pub fn path_length_for(horizon_days: usize, num_paths: usize) -> usize {
    if num_paths == 0 {
        return 0;
    }
    let twice = 2 * horizon_days;
    let (q, r) = (twice / num_paths, twice % num_paths);
    match (2 * r).cmp(&num_paths) {
        std::cmp::Ordering::Less => q,
        std::cmp::Ordering::Greater => q + 1,
        std::cmp::Ordering::Equal => q + (q % 2),
    }
}

/// Daily log-returns of a close series, validating every price.
pub fn empirical_log_returns(closes: &[f64]) -> Result<Vec<f64>, SvError> {
    if let Some((index, &value)) = closes
        .iter()
        .enumerate()
        .find(|(_, c)| !c.is_finite() || **c <= 0.0)
    {
        return Err(SvError::InvalidPrice { index, value });
    }
    Ok(log_returns(closes))
}

/// Calibrate on `closes` and emit `num_paths` paths of `path_length` prices.
///
/// Path `k` draws from RNG stream (`"emit"`, `k`).
pub fn simulate_stock_paths(
    closes: &[f64],
    num_paths: usize,
    path_length: usize,
    config: &CalibrationConfig,
    rng: &RngHierarchy,
) -> Result<SimulationOutput, SvError> {
    if path_length < 2 {
        return Err(SvError::InvalidPathLength(path_length));
    }
    if num_paths == 0 {
        return Err(SvError::NoPaths);
    }
    let required = 2 * path_length;
    if closes.len() < required {
        return Err(SvError::TooShort {
            rows: closes.len(),
            required,
        });
    }

    let empirical = empirical_log_returns(closes)?;
    let calibration = calibrate(&empirical, path_length, config, rng)?;
    info!(
        params = %calibration.params,
        votes = calibration.votes,
        mu = calibration.constants.mu,
        theta = calibration.constants.theta,
        "calibration selected"
    );

    let model = SvModel::new(calibration.params, calibration.constants);
    let paths: Vec<Vec<f64>> = (0..num_paths)
        .map(|k| model.simulate_path(path_length, &mut rng.rng_for("emit", k as u64)))
        .collect();
    let simulated_log_returns = paths.iter().flat_map(|p| log_returns(p)).collect();

    Ok(SimulationOutput {
        paths,
        simulated_log_returns,
        empirical_log_returns: empirical,
        calibration,
    })
}

/// Scale normalized paths to `start_price`, dropping each path's leading 1.
pub fn denormalize(paths: &[Vec<f64>], start_price: f64) -> Vec<Vec<f64>> {
    paths
        .iter()
        .map(|p| p.iter().skip(1).map(|s| s * start_price).collect())
        .collect()
}
