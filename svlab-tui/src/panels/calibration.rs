//! Calibration outcome: voted ranking and the fitted constants.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, Widget},
};

use crate::theme::Theme;
use svlab_core::sv::CalibrationResult;

pub struct CalibrationPanel<'a> {
    calibration: &'a CalibrationResult,
    theme: &'a Theme,
}

impl<'a> CalibrationPanel<'a> {
    pub fn new(calibration: &'a CalibrationResult, theme: &'a Theme) -> Self {
        Self { calibration, theme }
    }
}

impl Widget for CalibrationPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let c = self.calibration;
        let block = Block::default()
            .title(format!(" Calibration | N={} | W1 {:.6} ", c.path_length, c.best_distance))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.neutral))
            .style(Style::default().bg(self.theme.background));

        let header = Row::new(["#", "κ", "ξ", "ρ", "Votes"].map(|h| {
            Cell::from(h).style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        }))
        .height(1);

        let rows = c.ranking.iter().enumerate().map(|(i, r)| {
            let style = if r.params == c.params {
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.text_primary)
            };
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(format!("{}", r.params.kappa)),
                Cell::from(format!("{}", r.params.xi)),
                Cell::from(format!("{}", r.params.rho)),
                Cell::from(format!("{}", r.votes)),
            ])
            .style(style)
        });

        let widths = [
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(6),
        ];
        let inner = block.inner(area);
        Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .render(area, buf);

        // Constants on the bottom row of the panel.
        if inner.height > 0 {
            let line = Line::from(vec![
                Span::styled("μ ", Style::default().fg(self.theme.muted)),
                Span::styled(
                    format!("{:.4}  ", c.constants.mu),
                    Style::default().fg(self.theme.text_secondary),
                ),
                Span::styled("v₀=θ ", Style::default().fg(self.theme.muted)),
                Span::styled(
                    format!("{:.4}", c.constants.theta),
                    Style::default().fg(self.theme.text_secondary),
                ),
            ]);
            buf.set_line(inner.x, inner.bottom() - 1, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::test_support::buffer_text;
    use svlab_core::sv::{RankedParams, SvConstants, SvParams};

    #[test]
    fn ranking_and_constants_render() {
        let best = SvParams::new(2.0, 0.2, -0.7);
        let calibration = CalibrationResult {
            params: best,
            constants: SvConstants {
                mu: 0.07,
                v0: 0.03,
                theta: 0.03,
            },
            votes: 4,
            ranking: vec![
                RankedParams {
                    params: best,
                    votes: 4,
                },
                RankedParams {
                    params: SvParams::new(1.5, 0.2, -0.7),
                    votes: 3,
                },
            ],
            best_distance: 0.0012,
            path_length: 252,
        };
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        CalibrationPanel::new(&calibration, &theme).render(area, &mut buf);
        let text = buffer_text(&buf, area);
        assert!(text.contains("N=252"));
        assert!(text.contains("-0.7"));
        assert!(text.contains("0.0700"));
    }
}
