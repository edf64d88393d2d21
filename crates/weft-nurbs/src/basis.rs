//! B-spline basis evaluation on raw knot slices.
//!
//! Everything here is order-based (order = degree + 1), matching the rest
//! of the kernel; the NURBS Book's `p` is `order - 1` throughout.

/// Find the knot span index for parameter `t`.
///
/// Returns `i` such that `knots[i] <= t < knots[i+1]`, clamped to the
/// valid span range `[order-1, count-1]` for `count` control points.
pub fn find_span(order: usize, knots: &[f64], count: usize, t: f64) -> usize {
    let p = order - 1;
    let n = count - 1;
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[p] {
        return p;
    }

    let mut low = p;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// The `order` non-vanishing basis functions at `t` for the given span,
/// `N_{span-order+1,p}(t) ..= N_{span,p}(t)`.
pub fn basis_functions(order: usize, knots: &[f64], span: usize, t: f64) -> Vec<f64> {
    let p = order - 1;
    let mut n = vec![0.0; order];
    let mut left = vec![0.0; order];
    let mut right = vec![0.0; order];

    n[0] = 1.0;
    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = n[r] / (right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// Basis functions and their first derivatives at `t`.
///
/// Returns `(values, derivatives)`, each of length `order`.
pub fn basis_functions_derivs(
    order: usize,
    knots: &[f64],
    span: usize,
    t: f64,
) -> (Vec<f64>, Vec<f64>) {
    let p = order - 1;

    // Triangular table of the Cox-de Boor recursion (NURBS Book A2.3).
    let mut ndu = vec![vec![0.0; order]; order];
    let mut left = vec![0.0; order];
    let mut right = vec![0.0; order];

    ndu[0][0] = 1.0;
    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = ndu[r][j - 1] / ndu[j][r];
            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    let values: Vec<f64> = (0..order).map(|j| ndu[j][p]).collect();

    let mut derivs = vec![0.0; order];
    if p == 0 {
        return (values, derivs);
    }
    for (r, d) in derivs.iter_mut().enumerate() {
        // First derivative from the p-1 row of the table.
        let left_part = if r >= 1 {
            ndu[r - 1][p - 1] / ndu[p][r - 1]
        } else {
            0.0
        };
        let right_part = if r <= p - 1 {
            -ndu[r][p - 1] / ndu[p][r]
        } else {
            0.0
        };
        *d = p as f64 * (left_part + right_part);
    }

    (values, derivs)
}

/// All `count` basis function values at `t` (zero outside the span),
/// used to assemble interpolation matrices.
pub fn full_basis_row(order: usize, knots: &[f64], count: usize, t: f64) -> Vec<f64> {
    let span = find_span(order, knots, count, t);
    let nonzero = basis_functions(order, knots, span, t);
    let mut row = vec![0.0; count];
    for (k, value) in nonzero.iter().enumerate() {
        row[span + 1 - order + k] = *value;
    }
    row
}
