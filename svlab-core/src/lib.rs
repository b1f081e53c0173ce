//! svlab core: feature layer, strategies, backtest engine and the
//! stochastic-volatility simulator.
//!
//! This crate contains everything that does not talk to a user:
//! - Domain types (price series with feature columns, decisions, telemetry)
//! - Indicator catalog and the name-keyed indicator/strategy registries
//! - Tick-by-tick backtest loop with stop-loss / stop-win registries
//! - Heston-style SV model, Wasserstein calibration and path emission
//! - Price feeds (Yahoo, CSV, in-memory) and the Parquet cache
//! - Deterministic RNG hierarchy for reproducible runs

pub mod data;
pub mod domain;
pub mod engine;
pub mod factory;
pub mod indicators;
pub mod rng;
pub mod strategies;
pub mod sv;
