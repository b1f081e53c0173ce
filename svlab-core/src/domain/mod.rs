//! Domain types shared by the engine, the simulator and the runner.

pub mod decision;
pub mod series;
pub mod telemetry;

pub use decision::{StopOrder, StrategyDecision};
pub use series::{HistoryView, PriceSeries, SeriesError, CLOSE};
pub use telemetry::Telemetry;
