//! Side-by-side return histograms for eyeballing calibration quality.

use serde::Serialize;

pub const DEFAULT_BINS: usize = 50;

/// Simulated and empirical log-return counts over shared bin edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnHistogram {
    /// `bins + 1` ascending edges.
    pub edges: Vec<f64>,
    pub simulated: Vec<u64>,
    pub empirical: Vec<u64>,
}

impl ReturnHistogram {
    /// Bin both samples over the range spanned by their union.
    ///
    /// Non-finite values are ignored. `None` when no finite value exists or
    /// `bins` is zero.
    pub fn build(simulated: &[f64], empirical: &[f64], bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let finite = simulated
            .iter()
            .chain(empirical)
            .copied()
            .filter(|v| v.is_finite());
        let (lo, hi) = finite.fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
        // A degenerate range still gets a unit-width window.
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };

        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
        Some(Self {
            edges,
            simulated: count(simulated, lo, width, bins),
            empirical: count(empirical, lo, width, bins),
        })
    }

    pub fn bins(&self) -> usize {
        self.simulated.len()
    }

    /// Bin centers, for plotting.
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Counts scaled so each sample integrates to one.
    pub fn densities(&self) -> (Vec<f64>, Vec<f64>) {
        let width = self.edges.get(1).zip(self.edges.first()).map(|(b, a)| b - a);
        let scale = |counts: &[u64]| {
            let total: u64 = counts.iter().sum();
            match width {
                Some(w) if total > 0 => counts
                    .iter()
                    .map(|&c| c as f64 / (total as f64 * w))
                    .collect(),
                _ => vec![0.0; counts.len()],
            }
        };
        (scale(&self.simulated), scale(&self.empirical))
    }
}

fn count(values: &[f64], lo: f64, width: f64, bins: usize) -> Vec<u64> {
    let mut counts = vec![0u64; bins];
    for v in values.iter().filter(|v| v.is_finite()) {
        // the top edge is inclusive
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}
