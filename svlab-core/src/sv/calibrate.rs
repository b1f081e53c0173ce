//! Grid-search calibration of `(κ, ξ, ρ)` against an empirical return sample.
//!
//! One sweep scores every grid point: simulate `paths_per_point` paths of the
//! target length, concatenate their log-returns, and measure the Wasserstein
//! distance to the empirical log-returns. The `top_k` closest points of each
//! sweep get one vote; after all sweeps the most-voted point wins. Ties go to
//! the point that first entered the tally.
//!
//! Every grid evaluation draws from its own RNG stream
//! (`"calibrate"`, `sweep * grid_len + point`), so results are identical
//! whether the grid is scored in parallel or sequentially.

use super::model::{SvConstants, SvModel, SvParams};
use super::wasserstein::wasserstein_distance;
use super::SvError;
use crate::rng::RngHierarchy;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_KAPPAS: [f64; 6] = [1.0, 1.5, 2.0, 2.5, 3.0, 5.0];
pub const DEFAULT_XIS: [f64; 5] = [0.05, 0.1, 0.2, 0.35, 0.4];
pub const DEFAULT_RHOS: [f64; 6] = [-0.9, -0.8, -0.7, -0.6, -0.5, 0.0];

/// Cartesian parameter grid, enumerated κ-major then ξ then ρ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    pub kappas: Vec<f64>,
    pub xis: Vec<f64>,
    pub rhos: Vec<f64>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            kappas: DEFAULT_KAPPAS.to_vec(),
            xis: DEFAULT_XIS.to_vec(),
            rhos: DEFAULT_RHOS.to_vec(),
        }
    }
}

impl ParameterGrid {
    pub fn len(&self) -> usize {
        self.kappas.len() * self.xis.len() * self.rhos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> Vec<SvParams> {
        let mut out = Vec::with_capacity(self.len());
        for &kappa in &self.kappas {
            for &xi in &self.xis {
                for &rho in &self.rhos {
                    out.push(SvParams::new(kappa, xi, rho));
                }
            }
        }
        out
    }
}

/// Knobs for the calibration search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub grid: ParameterGrid,
    pub sweeps: usize,
    pub paths_per_point: usize,
    pub top_k: usize,
    /// Score grid points on the rayon pool.
    pub parallel: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            grid: ParameterGrid::default(),
            sweeps: 5,
            paths_per_point: 5,
            top_k: 5,
            parallel: true,
        }
    }
}

impl CalibrationConfig {
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// A grid point with its vote count across sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedParams {
    pub params: SvParams,
    pub votes: usize,
}

/// Outcome of [`calibrate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub params: SvParams,
    pub constants: SvConstants,
    pub votes: usize,
    /// Most-voted points, best first, at most `top_k`.
    pub ranking: Vec<RankedParams>,
    /// Smallest distance seen for the selected point in any sweep.
    pub best_distance: f64,
    pub path_length: usize,
}

/// Wasserstein score of one grid point against `empirical`.
///
/// The empirical sample is truncated to the simulated sample's size.
pub fn score_point(
    model: &SvModel,
    empirical: &[f64],
    path_length: usize,
    paths: usize,
    rng: &mut rand::rngs::StdRng,
) -> f64 {
    let simulated = model.simulate_log_returns(path_length, paths, rng);
    let take = empirical.len().min(simulated.len());
    wasserstein_distance(&empirical[..take], &simulated)
}

/// Search the grid for the parameters whose simulated returns best match
/// `empirical_log_returns`.
pub fn calibrate(
    empirical_log_returns: &[f64],
    path_length: usize,
    config: &CalibrationConfig,
    rng: &RngHierarchy,
) -> Result<CalibrationResult, SvError> {
    if path_length < 2 {
        return Err(SvError::InvalidPathLength(path_length));
    }
    if config.grid.is_empty() || config.sweeps == 0 || config.top_k == 0 {
        return Err(SvError::EmptyGrid);
    }
    if config.paths_per_point == 0 {
        return Err(SvError::NoPaths);
    }
    let constants = SvConstants::from_log_returns(empirical_log_returns)?;
    let points = config.grid.points();
    let n_points = points.len();

    // (grid index, votes, best distance), in first-vote order
    let mut tally: Vec<(usize, usize, f64)> = Vec::new();

    for sweep in 0..config.sweeps {
        let evaluate = |(idx, params): (usize, &SvParams)| {
            let model = SvModel::new(*params, constants);
            let mut point_rng = rng.rng_for("calibrate", (sweep * n_points + idx) as u64);
            let d = score_point(
                &model,
                empirical_log_returns,
                path_length,
                config.paths_per_point,
                &mut point_rng,
            );
            (idx, d)
        };

        let mut scored: Vec<(usize, f64)> = if config.parallel {
            points.par_iter().enumerate().map(evaluate).collect()
        } else {
            points.iter().enumerate().map(evaluate).collect()
        };

        // Stable: equal distances keep grid order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        for &(idx, d) in scored.iter().take(config.top_k) {
            match tally.iter_mut().find(|(i, _, _)| *i == idx) {
                Some(entry) => {
                    entry.1 += 1;
                    entry.2 = entry.2.min(d);
                }
                None => tally.push((idx, 1, d)),
            }
        }

        if let Some(&(idx, d)) = scored.first() {
            debug!(sweep, best = %points[idx], distance = d, "calibration sweep done");
        }
    }

    // Stable: equal votes keep first-vote order.
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    let (winner, votes, best_distance) = tally[0];

    let ranking = tally
        .iter()
        .take(config.top_k)
        .map(|&(idx, votes, _)| RankedParams {
            params: points[idx],
            votes,
        })
        .collect();

    Ok(CalibrationResult {
        params: points[winner],
        constants,
        votes,
        ranking,
        best_distance,
        path_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> CalibrationConfig {
        CalibrationConfig {
            grid: ParameterGrid {
                kappas: vec![1.0, 3.0],
                xis: vec![0.1, 0.5],
                rhos: vec![-0.5, 0.0],
            },
            sweeps: 3,
            paths_per_point: 2,
            top_k: 2,
            parallel: true,
        }
    }

    fn empirical() -> Vec<f64> {
        (0..120).map(|i| 0.01 * ((i as f64) * 0.7).sin()).collect()
    }

    #[test]
    fn default_grid_is_180_points_kappa_major() {
        let grid = ParameterGrid::default();
        let points = grid.points();
        assert_eq!(points.len(), 180);
        assert_eq!(points[0], SvParams::new(1.0, 0.05, -0.9));
        assert_eq!(points[1], SvParams::new(1.0, 0.05, -0.8));
        assert_eq!(points[6], SvParams::new(1.0, 0.1, -0.9));
        assert_eq!(points[30], SvParams::new(1.5, 0.05, -0.9));
        assert_eq!(points[179], SvParams::new(5.0, 0.4, 0.0));
    }

    #[test]
    fn selection_is_deterministic_for_a_seed() {
        let h = RngHierarchy::new(11);
        let a = calibrate(&empirical(), 30, &small_config(), &h).unwrap();
        let b = calibrate(&empirical(), 30, &small_config(), &h).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let h = RngHierarchy::new(5);
        let par = calibrate(&empirical(), 30, &small_config(), &h).unwrap();
        let seq = calibrate(&empirical(), 30, &small_config().with_parallelism(false), &h).unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn winner_has_the_most_votes() {
        let h = RngHierarchy::new(2);
        let config = small_config();
        let r = calibrate(&empirical(), 30, &config, &h).unwrap();
        assert!(!r.ranking.is_empty() && r.ranking.len() <= config.top_k);
        assert_eq!(r.ranking[0].params, r.params);
        assert_eq!(r.ranking[0].votes, r.votes);
        assert!(r.ranking.windows(2).all(|w| w[0].votes >= w[1].votes));
        // at most one vote per sweep
        assert!(r.votes <= config.sweeps);
        assert!(r.best_distance.is_finite());
    }

    #[test]
    fn rejects_degenerate_inputs() {
        let h = RngHierarchy::new(1);
        assert_eq!(
            calibrate(&empirical(), 1, &small_config(), &h),
            Err(SvError::InvalidPathLength(1))
        );
        let mut empty = small_config();
        empty.grid.rhos.clear();
        assert_eq!(calibrate(&empirical(), 30, &empty, &h), Err(SvError::EmptyGrid));
        let mut no_paths = small_config();
        no_paths.paths_per_point = 0;
        assert_eq!(calibrate(&empirical(), 30, &no_paths, &h), Err(SvError::NoPaths));
    }
}
