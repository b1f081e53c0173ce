//! Donchian channel over closes.
//!
//! Produces three series (exposed as separate Indicator instances):
//! - Upper: max(close[t-period+1..=t])
//! - Lower: min(close[t-period+1..=t])
//! - Middle: (upper + lower) / 2
//!
//! Lookback: period - 1.

use super::rolling::{rolling_max, rolling_min};
use super::Indicator;

/// Which band of the Donchian channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Middle,
    Lower,
}

impl DonchianBand {
    pub const ALL: [DonchianBand; 3] = [Self::Upper, Self::Middle, Self::Lower];

    pub fn suffix(&self) -> &'static str {
        match self {
            DonchianBand::Upper => "upper",
            DonchianBand::Middle => "middle",
            DonchianBand::Lower => "lower",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: String,
}

impl Donchian {
    pub fn new(period: usize, band: DonchianBand) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band,
            name: format!("donchian_{}_{period}", band.suffix()),
        }
    }

    /// All three bands, in upper/middle/lower order.
    pub fn channel(period: usize) -> [Donchian; 3] {
        DonchianBand::ALL.map(|band| Donchian::new(period, band))
    }

    pub fn band(&self) -> DonchianBand {
        self.band
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        match self.band {
            DonchianBand::Upper => rolling_max(closes, self.period),
            DonchianBand::Lower => rolling_min(closes, self.period),
            DonchianBand::Middle => {
                let upper = rolling_max(closes, self.period);
                let lower = rolling_min(closes, self.period);
                upper
                    .iter()
                    .zip(&lower)
                    .map(|(u, l)| (u + l) / 2.0)
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn channel_3_known_values() {
        // window at t=2: [10, 14, 12] -> upper 14, lower 10, middle 12
        // window at t=3: [14, 12, 9]  -> upper 14, lower 9,  middle 11.5
        let closes = [10.0, 14.0, 12.0, 9.0];
        let [upper, middle, lower] = Donchian::channel(3);
        let (u, m, l) = (
            upper.compute(&closes),
            middle.compute(&closes),
            lower.compute(&closes),
        );
        assert!(u[1].is_nan() && m[1].is_nan() && l[1].is_nan());
        assert_approx(u[2], 14.0, DEFAULT_EPSILON);
        assert_approx(l[2], 10.0, DEFAULT_EPSILON);
        assert_approx(m[2], 12.0, DEFAULT_EPSILON);
        assert_approx(u[3], 14.0, DEFAULT_EPSILON);
        assert_approx(l[3], 9.0, DEFAULT_EPSILON);
        assert_approx(m[3], 11.5, DEFAULT_EPSILON);
    }

    #[test]
    fn band_names() {
        let names: Vec<String> = Donchian::channel(20)
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["donchian_upper_20", "donchian_middle_20", "donchian_lower_20"]
        );
    }

    #[test]
    fn upper_never_below_lower() {
        let closes: Vec<f64> = (0..40).map(|i| ((i * 7) % 11) as f64).collect();
        let [upper, middle, lower] = Donchian::channel(5);
        let (u, m, l) = (
            upper.compute(&closes),
            middle.compute(&closes),
            lower.compute(&closes),
        );
        for t in 4..40 {
            assert!(u[t] >= m[t] && m[t] >= l[t]);
        }
    }
}
