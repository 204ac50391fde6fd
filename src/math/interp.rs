//! Clamped piecewise-linear interpolation.
//!
//! Given sample points `(xs[i], ys[i])` with `xs` non-decreasing, evaluate the
//! polyline at `x`:
//!
//! - `x < xs[0]` returns `ys[0]` and `x >= xs[last]` returns `ys[last]`
//!   (clamped, never extrapolated)
//! - otherwise pick the last index `j` with `xs[j] <= x` and interpolate on
//!   the segment `[j, j + 1]`
//!
//! The "last index" rule means that on a plateau (repeated `xs` values) the
//! value of the last point of the plateau is used, and the segment
//! denominator `xs[j + 1] - xs[j]` is always strictly positive.

/// Evaluate the interpolant at `x`.
///
/// Returns `None` when the inputs are empty or of unequal length.
pub fn interp(x: f64, xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.is_empty() || xs.len() != ys.len() {
        return None;
    }

    let last = xs.len() - 1;
    if x < xs[0] {
        return Some(ys[0]);
    }
    if x >= xs[last] {
        return Some(ys[last]);
    }

    // First index with xs[idx] > x; the segment starts one before it.
    let upper = xs.partition_point(|&v| v <= x);
    let j = upper - 1;
    let (x0, x1) = (xs[j], xs[upper]);
    let (y0, y1) = (ys[j], ys[upper]);
    let frac = (x - x0) / (x1 - x0);
    Some(y0 + (y1 - y0) * frac)
}

/// True when `xs` never decreases.
pub fn is_non_decreasing(xs: &[f64]) -> bool {
    xs.windows(2).all(|w| w[1] >= w[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_inside_segments() {
        let xs = [0.0, 10.0, 20.0];
        let ys = [100.0, 50.0, 0.0];
        assert_eq!(interp(5.0, &xs, &ys), Some(75.0));
        assert_eq!(interp(15.0, &xs, &ys), Some(25.0));
        assert_eq!(interp(10.0, &xs, &ys), Some(50.0));
    }

    #[test]
    fn clamps_outside_the_observed_range() {
        let xs = [5.0, 20.0, 100.0];
        let ys = [2000.0, 1000.0, 63.0];
        assert_eq!(interp(1.0, &xs, &ys), Some(2000.0));
        assert_eq!(interp(100.0, &xs, &ys), Some(63.0));
        assert_eq!(interp(150.0, &xs, &ys), Some(63.0));
    }

    #[test]
    fn plateau_uses_last_point() {
        // Zero retained weight on the second sieve repeats the cumulative value.
        let xs = [10.0, 10.0, 60.0, 100.0];
        let ys = [1000.0, 500.0, 250.0, 125.0];
        assert_eq!(interp(10.0, &xs, &ys), Some(500.0));
        let v = interp(35.0, &xs, &ys).unwrap();
        assert!((v - 375.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_mismatched_inputs() {
        assert_eq!(interp(1.0, &[], &[]), None);
        assert_eq!(interp(1.0, &[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn single_point_is_constant() {
        assert_eq!(interp(-3.0, &[50.0], &[400.0]), Some(400.0));
        assert_eq!(interp(99.0, &[50.0], &[400.0]), Some(400.0));
    }
}
