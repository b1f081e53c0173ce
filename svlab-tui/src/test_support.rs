//! Shared fixtures for the TUI's unit tests.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

use svlab_core::data::{Period, StaticFeed};
use svlab_core::sv::{SvConstants, SvModel, SvParams};
use svlab_runner::{evaluate, EvaluationReport, RunConfig};

pub const TICKER: &str = "TEST";

pub fn sample_config() -> RunConfig {
    let mut c = RunConfig::default();
    c.market.ticker = TICKER.into();
    c.market.real_period = Period::OneYear;
    c.market.sim_period = Period::OneYear;
    c.simulation.num_paths = 3;
    c.simulation.seed = Some(7);
    c
}

pub fn sample_feed() -> StaticFeed {
    let model = SvModel::new(
        SvParams::new(2.0, 0.2, -0.7),
        SvConstants {
            mu: 0.08,
            v0: 0.03,
            theta: 0.03,
        },
    );
    let closes: Vec<f64> = model
        .simulate_path(500, &mut StdRng::seed_from_u64(3))
        .into_iter()
        .map(|s| 100.0 * s)
        .collect();
    let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    StaticFeed::new().with_closes(TICKER, end, &closes)
}

pub fn sample_report() -> EvaluationReport {
    evaluate(&sample_config(), &sample_feed()).unwrap()
}
