//! 1-D Wasserstein (earth mover's) distance between two empirical samples.
//!
//! `W1(u, v) = ∫ |F_u(x) - F_v(x)| dx`, evaluated exactly as a sum over the
//! merged sorted support. Samples may differ in size.

/// Distance between the empirical distributions of `u` and `v`.
///
/// NaN when either sample is empty.
pub fn wasserstein_distance(u: &[f64], v: &[f64]) -> f64 {
    if u.is_empty() || v.is_empty() {
        return f64::NAN;
    }
    let mut u = u.to_vec();
    let mut v = v.to_vec();
    u.sort_by(f64::total_cmp);
    v.sort_by(f64::total_cmp);

    let (nu, nv) = (u.len() as f64, v.len() as f64);
    let (mut iu, mut iv) = (0usize, 0usize);
    let mut total = 0.0;

    // Walk the merged support; between consecutive support points both CDFs
    // are constant.
    let mut x = next_point(&u, &v, &mut iu, &mut iv);
    while iu < u.len() || iv < v.len() {
        let cdf_gap = (iu as f64 / nu - iv as f64 / nv).abs();
        let next = next_point(&u, &v, &mut iu, &mut iv);
        total += cdf_gap * (next - x);
        x = next;
    }
    total
}

/// Consume the smaller head of `u` / `v` and return it.
fn next_point(u: &[f64], v: &[f64], iu: &mut usize, iv: &mut usize) -> f64 {
    let take_u = match (u.get(*iu), v.get(*iv)) {
        (Some(a), Some(b)) => a <= b,
        (Some(_), None) => true,
        _ => false,
    };
    if take_u {
        *iu += 1;
        u[*iu - 1]
    } else {
        *iv += 1;
        v[*iv - 1]
    }
}
