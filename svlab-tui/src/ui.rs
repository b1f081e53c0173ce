//! Top-level layout: active view plus a one-line status bar.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, RunStatus, View};
use crate::panels::{
    CalibrationPanel, CapitalPanel, HistogramPanel, OverlayChart, OverlayKind, SummaryPanel,
};
use svlab_runner::EvaluationReport;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    match &app.status {
        RunStatus::Running { .. } => draw_message(f, chunks[0], app, "Running evaluation..."),
        RunStatus::Failed(message) => draw_message(f, chunks[0], app, message),
        RunStatus::Done(report) => match app.view {
            View::Report => draw_report(f, chunks[0], app, report),
            View::Diagnostics => draw_diagnostics(f, chunks[0], app, report),
        },
    }

    draw_status_bar(f, chunks[1], app);
}

fn quadrants(area: Rect) -> [Rect; 4] {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    [top[0], top[1], bottom[0], bottom[1]]
}

fn draw_report(f: &mut Frame, area: Rect, app: &App, report: &EvaluationReport) {
    let [price, wealth, capital, summary] = quadrants(area);
    let theme = &app.theme;

    let sim_prices: Vec<&[f64]> = report
        .sims
        .iter()
        .map(|s| s.result.telemetry.price.as_slice())
        .collect();
    f.render_widget(
        OverlayChart::new(OverlayKind::Price, theme)
            .real(&report.real.telemetry.price)
            .ensemble(sim_prices)
            .highlight(app.selected_path),
        price,
    );

    let sim_wealth: Vec<&[f64]> = report
        .sims
        .iter()
        .map(|s| s.result.telemetry.wealth.as_slice())
        .collect();
    f.render_widget(
        OverlayChart::new(OverlayKind::Wealth, theme)
            .real(&report.real.telemetry.wealth)
            .ensemble(sim_wealth)
            .highlight(app.selected_path),
        wealth,
    );

    f.render_widget(CapitalPanel::new(&report.real, theme), capital);
    f.render_widget(SummaryPanel::new(report, theme), summary);
}

fn draw_diagnostics(f: &mut Frame, area: Rect, app: &App, report: &EvaluationReport) {
    let theme = &app.theme;
    let Some(diag) = &report.diagnostics else {
        draw_message(
            f,
            area,
            app,
            "Diagnostics were disabled for this run (simulation.diagnostics = false)",
        );
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);

    f.render_widget(
        HistogramPanel::new(diag.histogram.as_ref(), theme),
        rows[0],
    );
    f.render_widget(
        OverlayChart::new(OverlayKind::Normalized, theme)
            .ensemble(diag.normalized_paths.iter().map(Vec::as_slice).collect())
            .highlight(app.selected_path)
            .focused(app.selected_path.is_some()),
        bottom[0],
    );
    f.render_widget(CalibrationPanel::new(&diag.calibration, theme), bottom[1]);
}

fn draw_message(f: &mut Frame, area: Rect, app: &App, message: &str) {
    let color = match app.status {
        RunStatus::Failed(_) => app.theme.negative,
        _ => app.theme.accent,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border(true))
        .title(" svlab ")
        .title_style(app.theme.title(true))
        .style(Style::default().bg(app.theme.background));
    let text = vec![
        Line::default(),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ];
    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let hints = match app.status {
        RunStatus::Done(_) => " q:quit  Tab:view  ←/→:path ",
        _ => " q:quit ",
    };
    let line = Line::from(vec![
        Span::styled(hints, Style::default().fg(app.theme.muted)),
        Span::raw("| "),
        Span::styled(app.status_line(), Style::default().fg(app.theme.accent)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::test_support::buffer_text;
    use crate::test_support::sample_report;
    use crate::worker::WorkerResponse;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buf = terminal.backend().buffer().clone();
        let area = buf.area;
        buffer_text(&buf, area)
    }

    #[test]
    fn running_screen() {
        let app = App::new("TEST");
        let text = render(&app);
        assert!(text.contains("Running evaluation"));
        assert!(text.contains("Evaluating TEST"));
    }

    #[test]
    fn failure_screen() {
        let mut app = App::new("TEST");
        app.apply(WorkerResponse::Failed("symbol not found".into()));
        assert!(render(&app).contains("symbol not found"));
    }

    #[test]
    fn both_views_render() {
        let mut app = App::new("TEST");
        app.apply(WorkerResponse::Finished(Box::new(sample_report())));
        let report_view = render(&app);
        assert!(report_view.contains("Summary"));

        app.toggle_view();
        app.select_next_path();
        let diag_view = render(&app);
        assert!(diag_view.contains("Calibration"));
        assert!(diag_view.contains("SV Diagnostics"));
    }
}
