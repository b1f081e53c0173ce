//! Text summary of the evaluation: capital, real outcome, ensemble statistics.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::theme::Theme;
use svlab_runner::EvaluationReport;

pub struct SummaryPanel<'a> {
    report: &'a EvaluationReport,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> SummaryPanel<'a> {
    pub fn new(report: &'a EvaluationReport, theme: &'a Theme) -> Self {
        Self {
            report,
            focused: false,
            theme,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn money(&self, label: &str, value: Option<f64>) -> Line<'static> {
        let base = self.report.summary.initial_capital;
        let (text, color) = match value {
            Some(v) => (format!("${v:.2}"), self.theme.pnl_color(v, base)),
            None => ("n/a".to_string(), self.theme.muted),
        };
        Line::from(vec![
            Span::styled(
                format!("{label:<20}"),
                Style::default().fg(self.theme.text_secondary),
            ),
            Span::styled(text, Style::default().fg(color)),
        ])
    }

    fn plain(&self, label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("{label:<20}"),
                Style::default().fg(self.theme.text_secondary),
            ),
            Span::styled(value, Style::default().fg(self.theme.text_primary)),
        ])
    }
}

impl Widget for SummaryPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let r = self.report;
        let s = &r.summary;
        let heading = Style::default()
            .fg(self.theme.accent)
            .add_modifier(Modifier::BOLD);

        let mut lines = vec![
            Line::from(Span::styled(
                format!("{} | {}", r.ticker, r.strategy),
                heading,
            )),
            self.plain("Initial capital", format!("${:.2}", s.initial_capital)),
            self.money("Final real wealth", s.real_final_wealth),
        ];
        if let Some(t) = r.real.terminated_at {
            lines.push(Line::from(Span::styled(
                format!("Real run ruined at tick {t}"),
                Style::default().fg(self.theme.negative),
            )));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("Simulated net worths ({} paths)", s.count),
            heading,
        )));
        lines.push(self.money("  Mean", s.mean));
        lines.push(self.plain(
            "  Std dev",
            s.std_dev.map_or_else(|| "n/a".into(), |v| format!("${v:.2}")),
        ));
        lines.push(self.money("  Min", s.min));
        lines.push(self.money("  Max", s.max));
        let ruined = r.ruined_sims();
        if ruined > 0 {
            lines.push(self.plain("  Ruined", ruined.to_string()));
        }
        lines.push(Line::default());
        lines.push(self.plain(
            "Periods",
            format!("real {} / sim {}", r.real_period, r.sim_period),
        ));
        lines.push(self.plain("Path length", r.path_length.to_string()));
        lines.push(self.plain("Spot", format!("${:.2}", r.start_price)));
        lines.push(self.plain("Seed", r.master_seed.to_string()));
        if let Some(d) = &r.diagnostics {
            lines.push(self.plain("Calibrated", d.calibration.params.to_string()));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(" Summary ")
                    .borders(Borders::ALL)
                    .border_style(self.theme.border(self.focused))
                    .title_style(self.theme.title(self.focused))
                    .style(Style::default().bg(self.theme.background)),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::test_support::buffer_text;
    use crate::test_support::{sample_report, TICKER};

    #[test]
    fn summary_lists_ensemble_statistics() {
        let report = sample_report();
        let theme = Theme::default();
        let area = Rect::new(0, 0, 70, 24);
        let mut buf = Buffer::empty(area);
        SummaryPanel::new(&report, &theme).render(area, &mut buf);
        let text = buffer_text(&buf, area);
        assert!(text.contains(TICKER));
        assert!(text.contains("Simulated net worths (3 paths)"));
        assert!(text.contains("Seed"));
        assert!(text.contains("Calibrated"));
    }
}
