//! svlab runner: evaluation orchestration on top of `svlab-core`.
//!
//! This crate provides:
//! - Layered run configuration (defaults, TOML file, overrides)
//! - The evaluation pipeline: real backtest, SV calibration, simulated backtests
//! - Summary statistics and the `ReportSink` presentation seam
//! - CSV/JSON artifact export
//! - The SQLite market store with feature annotations

pub mod config;
pub mod export;
pub mod orchestrator;
pub mod report;
pub mod store;

pub use config::{
    load_config, ConfigError, ConfigOverrides, ConfigSource, Defaults, Layered, RunConfig, RunId,
    TomlFile,
};
pub use export::{save_artifacts, ArtifactSink};
pub use orchestrator::{evaluate, run_evaluation, RunError};
pub use report::{
    format_summary, EvaluationReport, MultiSink, NullSink, ReportSink, SimulatedRun, SummaryStats,
    SvDiagnostics, TextReportSink,
};
pub use store::{
    BacktestRecord, ForwardtestRecord, MarketRow, MarketStore, SqliteMarketStore, StoreError,
};
