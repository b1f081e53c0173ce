//! Background worker: runs the evaluation off the UI thread.
//!
//! The report comes back over an `mpsc` channel through [`ChannelSink`], the
//! TUI's `ReportSink`.

use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use anyhow::anyhow;
use tracing::{error, info};

use svlab_core::data::PriceFeed;
use svlab_runner::{run_evaluation, EvaluationReport, ReportSink, RunConfig};

/// Responses sent from the worker back to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    Finished(Box<EvaluationReport>),
    Failed(String),
}

/// Forwards the finished report to the UI thread.
pub struct ChannelSink {
    tx: Sender<WorkerResponse>,
}

impl ChannelSink {
    pub fn new(tx: Sender<WorkerResponse>) -> Self {
        Self { tx }
    }
}

impl ReportSink for ChannelSink {
    fn consume(&mut self, report: &EvaluationReport) -> anyhow::Result<()> {
        self.tx
            .send(WorkerResponse::Finished(Box::new(report.clone())))
            .map_err(|_| anyhow!("TUI closed before the report arrived"))
    }
}

/// Spawn the evaluation thread. It sends exactly one response.
pub fn spawn_worker(
    config: RunConfig,
    feed: Box<dyn PriceFeed>,
    tx: Sender<WorkerResponse>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("svlab-eval".into())
        .spawn(move || {
            info!(ticker = %config.market.ticker, "worker started");
            let mut sink = ChannelSink::new(tx.clone());
            if let Err(e) = run_evaluation(&config, feed.as_ref(), &mut sink) {
                error!(error = %e, "evaluation failed");
                let _ = tx.send(WorkerResponse::Failed(e.to_string()));
            }
        })
}
