//! Discretized Heston-style stochastic-volatility model.
//!
//! Per step:
//! ```text
//! z1 ~ N(0,1),  z2 = ρ z1 + √(1-ρ²) N(0,1)
//! v[t] = |v[t-1] + κ(θ - v[t-1]) dt + ξ √v[t-1] √dt z2|
//! S[t] = S[t-1] · exp((μ - ½ v[t-1]) dt + √v[t-1] √dt z1)
//! ```
//! with `S[0] = 1`, `v[0] = v₀`, `dt = 1/252`. The absolute value reflects
//! the variance back to non-negative.

use super::SvError;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// Trading days per year; annualizes daily moments and sets `dt`.
pub const TRADING_DAYS: f64 = 252.0;

/// The calibrated triple `(κ, ξ, ρ)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvParams {
    /// Mean-reversion speed of variance.
    pub kappa: f64,
    /// Volatility of variance.
    pub xi: f64,
    /// Correlation between price and variance shocks.
    pub rho: f64,
}

impl SvParams {
    pub fn new(kappa: f64, xi: f64, rho: f64) -> Self {
        Self { kappa, xi, rho }
    }
}

impl std::fmt::Display for SvParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "κ={} ξ={} ρ={}", self.kappa, self.xi, self.rho)
    }
}

/// Constants fixed by the empirical series: annualized drift and variance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvConstants {
    pub mu: f64,
    pub v0: f64,
    pub theta: f64,
}

impl SvConstants {
    /// `μ = 252 · mean`, `v₀ = θ = 252 · sample variance` of daily log-returns.
    pub fn from_log_returns(log_returns: &[f64]) -> Result<Self, SvError> {
        let n = log_returns.len();
        if n < 2 {
            return Err(SvError::TooShort {
                rows: n + 1,
                required: 3,
            });
        }
        let mean = log_returns.iter().sum::<f64>() / n as f64;
        let var = log_returns
            .iter()
            .map(|r| (r - mean) * (r - mean))
            .sum::<f64>()
            / (n - 1) as f64;
        Ok(Self {
            mu: TRADING_DAYS * mean,
            v0: TRADING_DAYS * var,
            theta: TRADING_DAYS * var,
        })
    }
}

/// A fully specified model ready to simulate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvModel {
    pub params: SvParams,
    pub constants: SvConstants,
    pub dt: f64,
}

impl SvModel {
    pub fn new(params: SvParams, constants: SvConstants) -> Self {
        Self {
            params,
            constants,
            dt: 1.0 / TRADING_DAYS,
        }
    }

    /// One normalized path of `length` prices starting at 1.
    pub fn simulate_path<R: Rng + ?Sized>(&self, length: usize, rng: &mut R) -> Vec<f64> {
        let SvParams { kappa, xi, rho } = self.params;
        let SvConstants { mu, v0, theta } = self.constants;
        let sqrt_dt = self.dt.sqrt();
        let rho_perp = (1.0 - rho * rho).sqrt();

        let mut path = Vec::with_capacity(length);
        if length == 0 {
            return path;
        }
        let mut s = 1.0;
        let mut v = v0;
        path.push(s);

        for _ in 1..length {
            let z1: f64 = StandardNormal.sample(rng);
            let e: f64 = StandardNormal.sample(rng);
            let z2 = rho * z1 + rho_perp * e;

            let sqrt_v = v.sqrt();
            let next_v = (v + kappa * (theta - v) * self.dt + xi * sqrt_v * sqrt_dt * z2).abs();
            s *= ((mu - 0.5 * v) * self.dt + sqrt_v * sqrt_dt * z1).exp();
            v = next_v;
            path.push(s);
        }
        path
    }

    /// Concatenated log-returns of `count` independent paths of `length`.
    pub fn simulate_log_returns<R: Rng + ?Sized>(
        &self,
        length: usize,
        count: usize,
        rng: &mut R,
    ) -> Vec<f64> {
        let mut out = Vec::with_capacity(count * length.saturating_sub(1));
        for _ in 0..count {
            out.extend(log_returns(&self.simulate_path(length, rng)));
        }
        out
    }
}

/// `ln(S[t] / S[t-1])` for consecutive prices; one shorter than the input.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}
