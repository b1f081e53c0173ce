//! Artifact export: JSON manifest plus CSV telemetry.
//!
//! A run directory named `{ticker}_{run_id prefix}_{timestamp}` holds
//! - `manifest.json`: the full [`EvaluationReport`]
//! - `real.csv`: per-tick telemetry of the real backtest
//! - `sims/path_{k}.csv`: per-tick telemetry of each simulated backtest
//! - `summary.csv`: one row per simulated path

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use svlab_core::domain::Telemetry;

use crate::report::{EvaluationReport, ReportSink};

/// Serialize a report to pretty JSON.
pub fn export_json(report: &EvaluationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize EvaluationReport to JSON")
}

/// Telemetry as CSV: tick, optional date, price, capital, stocks_owned, wealth, action.
pub fn export_telemetry_csv(
    telemetry: &Telemetry,
    actions: &[f64],
    dates: Option<&[NaiveDate]>,
) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "tick",
        "date",
        "price",
        "capital",
        "stocks_owned",
        "wealth",
        "action",
    ])?;
    for i in 0..telemetry.len() {
        let date = dates
            .and_then(|d| d.get(i))
            .map(|d| d.to_string())
            .unwrap_or_default();
        wtr.write_record([
            &i.to_string(),
            &date,
            &format!("{:.6}", telemetry.price[i]),
            &format!("{:.6}", telemetry.capital[i]),
            &format!("{:.6}", telemetry.stocks_owned[i]),
            &format!("{:.6}", telemetry.wealth[i]),
            &format!("{:.6}", actions.get(i).copied().unwrap_or(0.0)),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per simulated path with its final wealth and ruin tick.
pub fn export_summary_csv(report: &EvaluationReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["path", "ticks", "final_wealth", "terminated_at", "fees_paid", "custody_paid"])?;
    for sim in &report.sims {
        let r = &sim.result;
        wtr.write_record([
            &sim.index.to_string(),
            &r.ticks().to_string(),
            &r.final_wealth().map(|w| format!("{w:.2}")).unwrap_or_default(),
            &r.terminated_at.map(|t| t.to_string()).unwrap_or_default(),
            &format!("{:.2}", r.fees_paid),
            &format!("{:.2}", r.custody_paid),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write the full artifact set under `output_dir`. Returns the run directory.
pub fn save_artifacts(report: &EvaluationReport, output_dir: &Path) -> Result<PathBuf> {
    let safe_ticker: String = report
        .ticker
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let id_prefix: String = report.run_id.chars().take(12).collect();
    let dirname = format!(
        "{}_{}_{}",
        safe_ticker,
        id_prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    let sims_dir = run_dir.join("sims");
    std::fs::create_dir_all(&sims_dir)
        .with_context(|| format!("failed to create artifact dir: {}", sims_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(report)?)?;

    let real_csv = export_telemetry_csv(
        &report.real.telemetry,
        &report.real.actions,
        Some(&report.real_dates),
    )?;
    std::fs::write(run_dir.join("real.csv"), real_csv)?;

    for sim in &report.sims {
        let csv = export_telemetry_csv(&sim.result.telemetry, &sim.result.actions, None)?;
        let path = sims_dir.join(format!("path_{:03}.csv", sim.index));
        std::fs::write(&path, csv).with_context(|| format!("failed to write {}", path.display()))?;
    }

    std::fs::write(run_dir.join("summary.csv"), export_summary_csv(report)?)?;

    info!(dir = %run_dir.display(), paths = report.sims.len(), "artifacts saved");
    Ok(run_dir)
}

/// [`ReportSink`] that saves artifacts and remembers where.
#[derive(Debug)]
pub struct ArtifactSink {
    output_dir: PathBuf,
    last_dir: Option<PathBuf>,
}

impl ArtifactSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            last_dir: None,
        }
    }

    /// Directory written by the most recent [`consume`](ReportSink::consume).
    pub fn last_dir(&self) -> Option<&Path> {
        self.last_dir.as_deref()
    }
}

impl ReportSink for ArtifactSink {
    fn consume(&mut self, report: &EvaluationReport) -> Result<()> {
        self.last_dir = Some(save_artifacts(report, &self.output_dir)?);
        Ok(())
    }
}
