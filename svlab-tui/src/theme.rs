//! Parrot/neon theme tokens for the svlab TUI.
//!
//! - **Background**: near-black base layer
//! - **Accent**: electric cyan for the real series and focus
//! - **Positive / Negative**: neon green and hot pink for gains and losses
//! - **Muted**: steel blue for the simulated ensemble

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub neutral: Color,
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::parrot_neon()
    }
}

/// Colors cycled across simulated paths so neighbours stay distinguishable.
const ENSEMBLE: [Color; 4] = [
    Color::Rgb(100, 149, 237),
    Color::Rgb(90, 110, 170),
    Color::Rgb(120, 120, 160),
    Color::Rgb(80, 130, 200),
];

impl Theme {
    pub fn parrot_neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 255, 255),
            positive: Color::Rgb(0, 255, 128),
            negative: Color::Rgb(255, 20, 147),
            warning: Color::Rgb(255, 140, 0),
            neutral: Color::Rgb(147, 112, 219),
            muted: Color::Rgb(100, 149, 237),
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    /// Green when `value` is at or above `baseline`, pink below.
    pub fn pnl_color(&self, value: f64, baseline: f64) -> Color {
        if value >= baseline {
            self.positive
        } else {
            self.negative
        }
    }

    pub fn path_color(&self, index: usize) -> Color {
        ENSEMBLE[index % ENSEMBLE.len()]
    }

    pub fn border(&self, active: bool) -> Style {
        if active {
            Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.muted)
        }
    }

    pub fn title(&self, active: bool) -> Style {
        if active {
            Style::default()
                .fg(self.text_primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.text_secondary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_creation() {
        let theme = Theme::default();
        assert_eq!(theme.background, Color::Rgb(18, 18, 20));
        assert_eq!(theme.accent, Color::Rgb(0, 255, 255));
    }

    #[test]
    fn pnl_color_against_baseline() {
        let theme = Theme::default();
        assert_eq!(theme.pnl_color(10_500.0, 10_000.0), theme.positive);
        assert_eq!(theme.pnl_color(10_000.0, 10_000.0), theme.positive);
        assert_eq!(theme.pnl_color(9_000.0, 10_000.0), theme.negative);
    }

    #[test]
    fn path_colors_cycle() {
        let theme = Theme::default();
        assert_eq!(theme.path_color(0), theme.path_color(4));
        assert_ne!(theme.path_color(0), theme.path_color(1));
    }
}
