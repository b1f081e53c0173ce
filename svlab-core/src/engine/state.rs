//! Engine configuration, per-run portfolio state, and run result types.

use super::stops::StopRegistry;
use crate::domain::Telemetry;
use serde::{Deserialize, Serialize};

/// Ticks between custody charges.
pub const DEFAULT_CUSTODY_INTERVAL: usize = 365;

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub start_capital: f64,
    /// Proportional fee charged on the traded notional.
    pub transaction_fee: f64,
    /// Fraction of capital charged every `custody_interval` ticks.
    pub custody_fee: f64,
    /// Tick count, not trading days: 365 ticks is roughly 1.45 trading years.
    pub custody_interval: usize,
}

impl EngineConfig {
    pub fn new(start_capital: f64, transaction_fee: f64, custody_fee: f64) -> Self {
        Self {
            start_capital,
            transaction_fee,
            custody_fee,
            custody_interval: DEFAULT_CUSTODY_INTERVAL,
        }
    }

    /// No transaction or custody fees.
    pub fn frictionless(start_capital: f64) -> Self {
        Self::new(start_capital, 0.0, 0.0)
    }

    pub fn with_custody_interval(mut self, ticks: usize) -> Self {
        self.custody_interval = ticks;
        self
    }

    /// Whether the custody charge lands on `tick`.
    pub fn is_custody_tick(&self, tick: usize) -> bool {
        tick > 0 && self.custody_interval > 0 && tick % self.custody_interval == 0
    }
}

/// Run-local portfolio. Created at engine start, dropped at engine end.
#[derive(Debug, Clone)]
pub struct PortfolioState {
    pub capital: f64,
    pub stocks_owned: f64,
    pub stop_losses: StopRegistry,
    pub stop_wins: StopRegistry,
}

impl PortfolioState {
    pub fn new(start_capital: f64) -> Self {
        Self {
            capital: start_capital,
            stocks_owned: 0.0,
            stop_losses: StopRegistry::stop_loss(),
            stop_wins: StopRegistry::stop_win(),
        }
    }

    pub fn wealth(&self, price: f64) -> f64 {
        self.stocks_owned * price + self.capital
    }

    /// Limit a desired action to what the portfolio can do: no selling more
    /// than is held, no buying more than capital covers including the fee.
    /// Nothing is bought at a non-positive price.
    pub fn clamp_action(&self, action: f64, price: f64, transaction_fee: f64) -> f64 {
        if action < 0.0 {
            action.max(-self.stocks_owned)
        } else if action > 0.0 {
            if price <= 0.0 {
                return 0.0;
            }
            let max_affordable = self.capital / (price * (1.0 + transaction_fee));
            action.min(max_affordable)
        } else {
            action
        }
    }

    /// Execute `action` shares at `price`. Returns the fee charged.
    pub fn apply_trade(&mut self, action: f64, price: f64, transaction_fee: f64) -> f64 {
        self.stocks_owned += action;
        let cost = transaction_fee * action.abs() * price;
        self.capital -= action * price + cost;
        cost
    }

    /// Charge the custody fee on current capital. Returns the amount charged.
    pub fn charge_custody(&mut self, custody_fee: f64) -> f64 {
        let charge = self.capital * custody_fee;
        self.capital -= charge;
        charge
    }
}

/// Output of one backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub telemetry: Telemetry,
    /// Executed (post-trigger, post-clamp) action per tick.
    pub actions: Vec<f64>,
    /// Tick at which wealth dropped to or below zero, ending the run.
    pub terminated_at: Option<usize>,
    pub stops_triggered: usize,
    pub fees_paid: f64,
    pub custody_paid: f64,
}

impl RunResult {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            telemetry: Telemetry::with_capacity(n),
            actions: Vec::with_capacity(n),
            ..Self::default()
        }
    }

    pub fn ticks(&self) -> usize {
        self.telemetry.len()
    }

    pub fn final_wealth(&self) -> Option<f64> {
        self.telemetry.final_wealth()
    }

    pub fn is_ruined(&self) -> bool {
        self.terminated_at.is_some()
    }
}
