//! Simulated vs. empirical log-return densities on shared bins.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use super::axis_labels;
use crate::theme::Theme;
use svlab_core::sv::ReturnHistogram;

pub struct HistogramPanel<'a> {
    histogram: Option<&'a ReturnHistogram>,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> HistogramPanel<'a> {
    pub fn new(histogram: Option<&'a ReturnHistogram>, theme: &'a Theme) -> Self {
        Self {
            histogram,
            focused: false,
            theme,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for HistogramPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Log-return density | simulated vs empirical ")
            .borders(Borders::ALL)
            .border_style(self.theme.border(self.focused))
            .title_style(self.theme.title(self.focused))
            .style(Style::default().bg(self.theme.background));

        let Some(hist) = self.histogram.filter(|h| h.bins() > 0) else {
            Paragraph::new("no histogram (diagnostics disabled or degenerate returns)")
                .style(Style::default().fg(self.theme.muted))
                .block(block)
                .render(area, buf);
            return;
        };

        let centers = hist.centers();
        let (sim, emp) = hist.densities();
        let sim_pts: Vec<(f64, f64)> = centers.iter().copied().zip(sim).collect();
        let emp_pts: Vec<(f64, f64)> = centers.iter().copied().zip(emp).collect();

        let x = [hist.edges[0], hist.edges[hist.edges.len() - 1]];
        let y_max = sim_pts
            .iter()
            .chain(&emp_pts)
            .map(|&(_, d)| d)
            .filter(|d| d.is_finite())
            .fold(0.0_f64, f64::max)
            .max(f64::MIN_POSITIVE)
            * 1.05;

        let datasets = vec![
            Dataset::default()
                .name("Simulated")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Bar)
                .style(Style::default().fg(self.theme.muted))
                .data(&sim_pts),
            Dataset::default()
                .name("Empirical")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                )
                .data(&emp_pts),
        ];

        Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title(Span::styled(
                        "log return",
                        Style::default().fg(self.theme.text_secondary),
                    ))
                    .style(Style::default().fg(self.theme.muted))
                    .bounds(x)
                    .labels(
                        axis_labels(x, |v| format!("{v:.3}"))
                            .into_iter()
                            .map(Span::raw)
                            .collect::<Vec<_>>(),
                    ),
            )
            .y_axis(
                Axis::default()
                    .style(Style::default().fg(self.theme.muted))
                    .bounds([0.0, y_max])
                    .labels(
                        axis_labels([0.0, y_max], |v| format!("{v:.1}"))
                            .into_iter()
                            .map(Span::raw)
                            .collect::<Vec<_>>(),
                    ),
            )
            .render(area, buf);
    }
}
