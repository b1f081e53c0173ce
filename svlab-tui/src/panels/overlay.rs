//! Line chart of the real series drawn over the simulated ensemble.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use super::{axis_labels, points, y_bounds};
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Price,
    Wealth,
    /// Emitted paths before scaling, all starting at 1.
    Normalized,
}

impl OverlayKind {
    fn title(self) -> &'static str {
        match self {
            OverlayKind::Price => "Price",
            OverlayKind::Wealth => "Net Worth",
            OverlayKind::Normalized => "Normalized SV Paths",
        }
    }

    fn format(self, v: f64) -> String {
        match self {
            OverlayKind::Normalized => format!("{v:.2}"),
            _ => format!("${v:.0}"),
        }
    }
}

pub struct OverlayChart<'a> {
    kind: OverlayKind,
    real: Option<&'a [f64]>,
    ensemble: Vec<&'a [f64]>,
    highlight: Option<usize>,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> OverlayChart<'a> {
    pub fn new(kind: OverlayKind, theme: &'a Theme) -> Self {
        Self {
            kind,
            real: None,
            ensemble: Vec::new(),
            highlight: None,
            focused: false,
            theme,
        }
    }

    pub fn real(mut self, values: &'a [f64]) -> Self {
        self.real = Some(values);
        self
    }

    pub fn ensemble(mut self, paths: Vec<&'a [f64]>) -> Self {
        self.ensemble = paths;
        self
    }

    /// Draw ensemble member `index` in the warning color, on top.
    pub fn highlight(mut self, index: Option<usize>) -> Self {
        self.highlight = index;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for OverlayChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = format!(
            " {} | {} simulated{} ",
            self.kind.title(),
            self.ensemble.len(),
            self.highlight
                .map(|h| format!(" | path #{h}"))
                .unwrap_or_default()
        );
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border(self.focused))
            .title_style(self.theme.title(self.focused))
            .style(Style::default().bg(self.theme.background));

        let ensemble: Vec<Vec<(f64, f64)>> = self.ensemble.iter().map(|p| points(p)).collect();
        let real = self.real.map(points).unwrap_or_default();

        let bounds = y_bounds(
            ensemble
                .iter()
                .map(Vec::as_slice)
                .chain(std::iter::once(real.as_slice())),
        );
        let Some(y) = bounds else {
            Paragraph::new("no data")
                .style(Style::default().fg(self.theme.muted))
                .block(block)
                .render(area, buf);
            return;
        };
        let x_max = ensemble
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(real.len()))
            .max()
            .unwrap_or(1)
            .saturating_sub(1)
            .max(1) as f64;

        let mut datasets: Vec<Dataset> = ensemble
            .iter()
            .enumerate()
            .filter(|(k, _)| Some(*k) != self.highlight)
            .map(|(k, data)| {
                Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(self.theme.path_color(k)))
                    .data(data)
            })
            .collect();

        if let Some(data) = self.highlight.and_then(|h| ensemble.get(h)) {
            datasets.push(
                Dataset::default()
                    .name("Selected")
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(self.theme.warning))
                    .data(data),
            );
        }

        if !real.is_empty() {
            datasets.push(
                Dataset::default()
                    .name("Real")
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                    .data(&real),
            );
        }

        let x_labels = axis_labels([0.0, x_max], |v| format!("{}", v as usize));
        let y_labels = axis_labels(y, |v| self.kind.format(v));

        Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title(Span::styled("Tick", Style::default().fg(self.theme.text_secondary)))
                    .style(Style::default().fg(self.theme.muted))
                    .bounds([0.0, x_max])
                    .labels(x_labels.into_iter().map(Span::raw).collect::<Vec<_>>()),
            )
            .y_axis(
                Axis::default()
                    .style(Style::default().fg(self.theme.muted))
                    .bounds(y)
                    .labels(y_labels.into_iter().map(Span::raw).collect::<Vec<_>>()),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::test_support::buffer_text;

    #[test]
    fn renders_real_over_ensemble() {
        let theme = Theme::default();
        let real = [100.0, 101.0, 99.0, 102.0];
        let a = [100.0, 98.0, 97.0];
        let b = [100.0, 103.0, 104.0];
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        OverlayChart::new(OverlayKind::Price, &theme)
            .real(&real)
            .ensemble(vec![&a[..], &b[..]])
            .render(area, &mut buf);
        let text = buffer_text(&buf, area);
        assert!(text.contains("Price"));
        assert!(text.contains("2 simulated"));
        assert!(text.contains("Real"));
    }

    #[test]
    fn highlight_is_labelled() {
        let theme = Theme::default();
        let a = [1.0, 1.1];
        let b = [1.0, 0.9];
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        OverlayChart::new(OverlayKind::Normalized, &theme)
            .ensemble(vec![&a[..], &b[..]])
            .highlight(Some(1))
            .render(area, &mut buf);
        let text = buffer_text(&buf, area);
        assert!(text.contains("path #1"));
        assert!(text.contains("Selected"));
    }

    #[test]
    fn empty_chart_renders_placeholder() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        OverlayChart::new(OverlayKind::Wealth, &theme).render(area, &mut buf);
        assert!(buffer_text(&buf, area).contains("no data"));
    }
}
