//! Application state.

use std::time::Instant;

use svlab_runner::EvaluationReport;

use crate::theme::Theme;
use crate::worker::WorkerResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Price, net worth, capital and summary panels.
    Report,
    /// Return histogram, normalized paths and calibration ranking.
    Diagnostics,
}

impl View {
    pub fn toggle(self) -> Self {
        match self {
            View::Report => View::Diagnostics,
            View::Diagnostics => View::Report,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            View::Report => "Report",
            View::Diagnostics => "SV Diagnostics",
        }
    }
}

#[derive(Debug)]
pub enum RunStatus {
    Running { ticker: String, started: Instant },
    Done(Box<EvaluationReport>),
    Failed(String),
}

pub struct App {
    pub running: bool,
    pub view: View,
    pub status: RunStatus,
    /// Highlighted simulated path, if any.
    pub selected_path: Option<usize>,
    pub theme: Theme,
}

impl App {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            running: true,
            view: View::Report,
            status: RunStatus::Running {
                ticker: ticker.into(),
                started: Instant::now(),
            },
            selected_path: None,
            theme: Theme::default(),
        }
    }

    pub fn report(&self) -> Option<&EvaluationReport> {
        match &self.status {
            RunStatus::Done(report) => Some(&**report),
            _ => None,
        }
    }

    pub fn apply(&mut self, resp: WorkerResponse) {
        self.status = match resp {
            WorkerResponse::Finished(report) => RunStatus::Done(report),
            WorkerResponse::Failed(message) => RunStatus::Failed(message),
        };
        self.selected_path = None;
    }

    pub fn toggle_view(&mut self) {
        self.view = self.view.toggle();
    }

    fn path_count(&self) -> usize {
        self.report().map_or(0, |r| r.sims.len())
    }

    /// Step the highlighted path forward, wrapping through "none".
    pub fn select_next_path(&mut self) {
        let n = self.path_count();
        if n == 0 {
            return;
        }
        self.selected_path = match self.selected_path {
            None => Some(0),
            Some(i) if i + 1 < n => Some(i + 1),
            Some(_) => None,
        };
    }

    pub fn select_prev_path(&mut self) {
        let n = self.path_count();
        if n == 0 {
            return;
        }
        self.selected_path = match self.selected_path {
            None => Some(n - 1),
            Some(0) => None,
            Some(i) => Some(i - 1),
        };
    }

    /// One-line status text.
    pub fn status_line(&self) -> String {
        match &self.status {
            RunStatus::Running { ticker, started } => format!(
                "Evaluating {ticker}... {:.0}s",
                started.elapsed().as_secs_f64()
            ),
            RunStatus::Done(r) => format!(
                "{} | {} | {} paths | seed {} | run {}",
                r.ticker,
                self.view.label(),
                r.sims.len(),
                r.master_seed,
                r.run_id.chars().take(12).collect::<String>()
            ),
            RunStatus::Failed(message) => format!("Evaluation failed: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_report;

    #[test]
    fn starts_running_in_report_view() {
        let app = App::new("SPY");
        assert!(app.running);
        assert_eq!(app.view, View::Report);
        assert!(app.report().is_none());
        assert!(app.status_line().starts_with("Evaluating SPY"));
    }

    #[test]
    fn view_toggles() {
        let mut app = App::new("SPY");
        app.toggle_view();
        assert_eq!(app.view, View::Diagnostics);
        app.toggle_view();
        assert_eq!(app.view, View::Report);
    }

    #[test]
    fn failure_is_shown() {
        let mut app = App::new("SPY");
        app.apply(WorkerResponse::Failed("boom".into()));
        assert!(app.report().is_none());
        assert_eq!(app.status_line(), "Evaluation failed: boom");
    }

    #[test]
    fn path_selection_wraps_through_none() {
        let mut app = App::new("SPY");
        app.select_next_path();
        assert_eq!(app.selected_path, None);

        app.apply(WorkerResponse::Finished(Box::new(sample_report())));
        let n = app.report().unwrap().sims.len();
        assert_eq!(n, 3);

        app.select_next_path();
        assert_eq!(app.selected_path, Some(0));
        app.select_prev_path();
        assert_eq!(app.selected_path, None);
        app.select_prev_path();
        assert_eq!(app.selected_path, Some(2));
        app.select_next_path();
        assert_eq!(app.selected_path, None);
    }
}
