//! Cash capital of the real run over time.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use super::{axis_labels, points, y_bounds};
use crate::theme::Theme;
use svlab_core::engine::RunResult;

pub struct CapitalPanel<'a> {
    run: &'a RunResult,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> CapitalPanel<'a> {
    pub fn new(run: &'a RunResult, theme: &'a Theme) -> Self {
        Self {
            run,
            focused: false,
            theme,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for CapitalPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(
                " Capital | fees ${:.2} | custody ${:.2} ",
                self.run.fees_paid, self.run.custody_paid
            ))
            .borders(Borders::ALL)
            .border_style(self.theme.border(self.focused))
            .title_style(self.theme.title(self.focused))
            .style(Style::default().bg(self.theme.background));

        let data = points(&self.run.telemetry.capital);
        let Some(y) = y_bounds([data.as_slice()]) else {
            Paragraph::new("no data")
                .style(Style::default().fg(self.theme.muted))
                .block(block)
                .render(area, buf);
            return;
        };
        let x_max = data.len().saturating_sub(1).max(1) as f64;

        let dataset = Dataset::default()
            .name("Real Capital")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(self.theme.positive))
            .data(&data);

        Chart::new(vec![dataset])
            .block(block)
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(self.theme.muted))
                    .bounds([0.0, x_max])
                    .labels(
                        axis_labels([0.0, x_max], |v| format!("{}", v as usize))
                            .into_iter()
                            .map(Span::raw)
                            .collect::<Vec<_>>(),
                    ),
            )
            .y_axis(
                Axis::default()
                    .style(Style::default().fg(self.theme.muted))
                    .bounds(y)
                    .labels(
                        axis_labels(y, |v| format!("${v:.0}"))
                            .into_iter()
                            .map(Span::raw)
                            .collect::<Vec<_>>(),
                    ),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::test_support::buffer_text;
    use svlab_core::domain::Telemetry;

    #[test]
    fn title_shows_fees() {
        let mut telemetry = Telemetry::with_capacity(3);
        telemetry.push(100.0, 1000.0, 0.0);
        telemetry.push(100.0, 899.0, 1.0);
        telemetry.push(100.0, 899.0, 1.0);
        let run = RunResult {
            telemetry,
            actions: vec![0.0, 1.0, 0.0],
            fees_paid: 1.0,
            ..RunResult::default()
        };
        let theme = Theme::default();
        let area = Rect::new(0, 0, 80, 16);
        let mut buf = Buffer::empty(area);
        CapitalPanel::new(&run, &theme).render(area, &mut buf);
        assert!(buffer_text(&buf, area).contains("fees $1.00"));
    }
}
