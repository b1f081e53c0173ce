//! Report panels. Each panel is a `Widget` over borrowed report data.
//!
//! Report view: price overlay, wealth overlay, capital, summary.
//! Diagnostic view: return histogram, normalized paths, calibration ranking.

pub mod calibration;
pub mod capital;
pub mod histogram;
pub mod overlay;
pub mod summary;

pub use calibration::CalibrationPanel;
pub use capital::CapitalPanel;
pub use histogram::HistogramPanel;
pub use overlay::{OverlayChart, OverlayKind};
pub use summary::SummaryPanel;

/// Index a series as `(tick, value)` points, skipping non-finite values.
pub fn points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (i as f64, v))
        .collect()
}

/// Padded `[lo, hi]` y-bounds over every point. `None` when there are none.
pub fn y_bounds<'a>(series: impl IntoIterator<Item = &'a [(f64, f64)]>) -> Option<[f64; 2]> {
    let (lo, hi) = series
        .into_iter()
        .flat_map(|s| s.iter().map(|&(_, y)| y))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let range = hi - lo;
    let pad = if range > 0.0 {
        range * 0.05
    } else {
        lo.abs().max(1.0) * 0.05
    };
    Some([lo - pad, hi + pad])
}

/// Three evenly spaced axis labels.
pub fn axis_labels(bounds: [f64; 2], fmt: impl Fn(f64) -> String) -> Vec<String> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    vec![fmt(bounds[0]), fmt(mid), fmt(bounds[1])]
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_skip_non_finite() {
        let p = points(&[1.0, f64::NAN, 3.0]);
        assert_eq!(p, vec![(0.0, 1.0), (2.0, 3.0)]);
    }

    #[test]
    fn bounds_pad_range() {
        let a = points(&[100.0, 200.0]);
        let b = points(&[150.0]);
        let [lo, hi] = y_bounds([a.as_slice(), b.as_slice()]).unwrap();
        assert!((lo - 95.0).abs() < 1e-9);
        assert!((hi - 205.0).abs() < 1e-9);
    }

    #[test]
    fn flat_series_still_has_height() {
        let a = points(&[50.0, 50.0]);
        let [lo, hi] = y_bounds([a.as_slice()]).unwrap();
        assert!(lo < 50.0 && hi > 50.0);
    }

    #[test]
    fn empty_has_no_bounds() {
        assert!(y_bounds(std::iter::empty::<&[(f64, f64)]>()).is_none());
    }
}
