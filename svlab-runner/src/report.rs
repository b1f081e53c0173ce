//! Evaluation report, summary statistics, and the presentation seam.

use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use svlab_core::data::Period;
use svlab_core::engine::RunResult;
use svlab_core::sv::{CalibrationResult, ReturnHistogram};

use crate::config::{RunConfig, RunId};

/// Schema version stamped into exported manifests.
pub const SCHEMA_VERSION: u32 = 1;

/// Statistics over the final wealths of the simulated runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    /// The configured starting capital, not a per-path value.
    pub initial_capital: f64,
    pub real_final_wealth: Option<f64>,
    pub count: usize,
    pub mean: Option<f64>,
    /// Population standard deviation (ddof = 0).
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl SummaryStats {
    pub fn compute(initial_capital: f64, real_final_wealth: Option<f64>, finals: &[f64]) -> Self {
        let count = finals.len();
        if count == 0 {
            return Self {
                initial_capital,
                real_final_wealth,
                count,
                mean: None,
                std_dev: None,
                min: None,
                max: None,
            };
        }
        let n = count as f64;
        let mean = finals.iter().sum::<f64>() / n;
        let var = finals.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / n;
        Self {
            initial_capital,
            real_final_wealth,
            count,
            mean: Some(mean),
            std_dev: Some(var.sqrt()),
            min: finals.iter().copied().reduce(f64::min),
            max: finals.iter().copied().reduce(f64::max),
        }
    }
}

/// Calibration detail for the diagnostic view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SvDiagnostics {
    pub calibration: CalibrationResult,
    pub histogram: Option<ReturnHistogram>,
    /// Emitted paths before denormalization, each starting at 1.0.
    pub normalized_paths: Vec<Vec<f64>>,
}

/// One simulated path and the backtest run over it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedRun {
    pub index: usize,
    pub prices: Vec<f64>,
    pub result: RunResult,
}

/// Everything one evaluation produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub schema_version: u32,
    pub run_id: RunId,
    pub ticker: String,
    pub strategy: String,
    /// Master seed actually used; replaying with it reproduces the run.
    pub master_seed: u64,
    pub real_period: Period,
    pub sim_period: Period,
    pub path_length: usize,
    pub start_price: f64,
    pub real_dates: Vec<NaiveDate>,
    pub real: RunResult,
    pub sims: Vec<SimulatedRun>,
    pub summary: SummaryStats,
    pub diagnostics: Option<SvDiagnostics>,
    pub config: RunConfig,
}

impl EvaluationReport {
    pub fn sim_final_wealths(&self) -> Vec<f64> {
        self.sims
            .iter()
            .filter_map(|s| s.result.final_wealth())
            .collect()
    }

    pub fn ruined_sims(&self) -> usize {
        self.sims.iter().filter(|s| s.result.is_ruined()).count()
    }
}

/// Presentation boundary. Sinks receive the finished report.
pub trait ReportSink {
    fn consume(&mut self, report: &EvaluationReport) -> anyhow::Result<()>;
}

/// Sink that accepts and discards the report.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn consume(&mut self, _report: &EvaluationReport) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Fans the report out to several sinks in order.
#[derive(Default)]
pub struct MultiSink<'a> {
    sinks: Vec<&'a mut dyn ReportSink>,
}

impl<'a> MultiSink<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn push(mut self, sink: &'a mut dyn ReportSink) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ReportSink for MultiSink<'_> {
    fn consume(&mut self, report: &EvaluationReport) -> anyhow::Result<()> {
        for sink in self.sinks.iter_mut() {
            sink.consume(report)?;
        }
        Ok(())
    }
}

fn opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}"))
}

/// Human-readable summary block.
pub fn format_summary(report: &EvaluationReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    out.push_str(&format!(
        "{} | strategy {} | real {} | sim {} | seed {}\n",
        report.ticker, report.strategy, report.real_period, report.sim_period, report.master_seed
    ));
    out.push_str(&format!("run id:            {}\n", report.run_id));
    out.push_str(&format!("initial capital:   {:.2}\n", s.initial_capital));
    out.push_str(&format!("real final wealth: {}\n", opt(s.real_final_wealth)));
    if let Some(t) = report.real.terminated_at {
        out.push_str(&format!("real run ruined at tick {t}\n"));
    }
    out.push_str(&format!(
        "simulated paths:   {} (length {}, spot {:.2})\n",
        s.count, report.path_length, report.start_price
    ));
    out.push_str(&format!("  mean:            {}\n", opt(s.mean)));
    out.push_str(&format!("  std dev:         {}\n", opt(s.std_dev)));
    out.push_str(&format!("  min:             {}\n", opt(s.min)));
    out.push_str(&format!("  max:             {}\n", opt(s.max)));
    let ruined = report.ruined_sims();
    if ruined > 0 {
        out.push_str(&format!("  ruined:          {ruined}\n"));
    }
    if let Some(d) = &report.diagnostics {
        out.push_str(&format!(
            "calibrated:        {} ({} votes, W1 {:.6})\n",
            d.calibration.params, d.calibration.votes, d.calibration.best_distance
        ));
    }
    out
}

/// Writes [`format_summary`] to any writer, stdout by default.
pub struct TextReportSink<W: Write> {
    out: W,
}

impl TextReportSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> TextReportSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for TextReportSink<W> {
    fn consume(&mut self, report: &EvaluationReport) -> anyhow::Result<()> {
        self.out.write_all(format_summary(report).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
