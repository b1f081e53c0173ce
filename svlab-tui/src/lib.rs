//! svlab TUI: terminal view of one strategy evaluation.
//!
//! Two views:
//! - Report: price and net-worth overlays (real run plus simulated ensemble),
//!   capital over time, summary statistics
//! - SV Diagnostics: simulated vs. empirical return histogram, normalized
//!   paths and the calibration ranking

pub mod app;
pub mod input;
pub mod panels;
pub mod theme;
pub mod ui;
pub mod worker;

pub use app::{App, RunStatus, View};
pub use theme::Theme;
pub use worker::{spawn_worker, ChannelSink, WorkerResponse};

#[cfg(test)]
mod test_support;
