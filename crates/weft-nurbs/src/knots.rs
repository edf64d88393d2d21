//! Knot vector algebra: generation, classification, unification.
//!
//! Knot vectors are plain `Vec<f64>` slices owned by their curve or
//! patch; length is always `count + order`. The shape-preserving
//! operations that also touch control points live in [`crate::refine`].

use serde::{Deserialize, Serialize};
use weft_core::{Result, Tolerance, WeftError};

/// Classification of a knot vector.
///
/// `Clamped` is the clamped-uniform-interior vector (end multiplicity =
/// order, equally spaced interior knots); `BSpline` the unclamped uniform
/// vector; `Bezier` the two-value clamped vector. Anything else is
/// `Custom`. Downstream operators use this to decide whether clamping or
/// rescaling is required first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KnotType {
    #[default]
    Clamped,
    Bezier,
    BSpline,
    Custom,
}

/// Domain of a knot vector for `count` control points:
/// `[knots[order-1], knots[count]]`.
pub fn domain(order: usize, knots: &[f64], count: usize) -> (f64, f64) {
    (knots[order - 1], knots[count])
}

/// Multiplicity of value `u` anywhere in the vector.
pub fn multiplicity(knots: &[f64], u: f64) -> usize {
    knots.iter().filter(|&&k| Tolerance::knot_eq(k, u)).count()
}

/// Whether both end values reach multiplicity `order`.
pub fn is_clamped(order: usize, knots: &[f64]) -> bool {
    multiplicity(knots, knots[0]) >= order
        && multiplicity(knots, knots[knots.len() - 1]) >= order
}

/// Structural validation: length `count + order`, non-decreasing, no
/// value exceeding multiplicity `order`, non-degenerate range.
pub fn validate(order: usize, count: usize, knots: &[f64]) -> Result<()> {
    if knots.len() != count + order {
        return Err(WeftError::InvalidKnots(format!(
            "length {} != {} points + {} order",
            knots.len(),
            count,
            order
        )));
    }
    for w in knots.windows(2) {
        if w[1] < w[0] {
            return Err(WeftError::InvalidKnots(format!(
                "decreasing pair {} > {}",
                w[0], w[1]
            )));
        }
    }
    for &k in knots {
        if multiplicity(knots, k) > order {
            return Err(WeftError::InvalidKnots(format!(
                "multiplicity of {} exceeds order {}",
                k, order
            )));
        }
    }
    if Tolerance::knot_eq(knots[0], knots[knots.len() - 1]) {
        return Err(WeftError::InvalidKnots("zero parameter range".into()));
    }
    Ok(())
}

/// Fabricate the default knot vector of the given type on [0, 1].
///
/// `Custom` cannot be fabricated; the caller must supply the data.
pub fn create(knot_type: KnotType, order: usize, count: usize) -> Result<Vec<f64>> {
    if count < order {
        return Err(WeftError::TypeMismatch("fewer control points than order"));
    }
    match knot_type {
        KnotType::Bezier => {
            if count != order {
                return Err(WeftError::TypeMismatch(
                    "Bezier knot vector needs exactly `order` control points",
                ));
            }
            let mut knots = vec![0.0; order];
            knots.extend(std::iter::repeat(1.0).take(order));
            Ok(knots)
        }
        KnotType::Clamped => {
            let mut knots = vec![0.0; order];
            let interior = count - order;
            for i in 1..=interior {
                knots.push(i as f64 / (interior + 1) as f64);
            }
            knots.extend(std::iter::repeat(1.0).take(order));
            Ok(knots)
        }
        KnotType::BSpline => {
            let m = count + order;
            Ok((0..m).map(|i| i as f64 / (m - 1) as f64).collect())
        }
        KnotType::Custom => Err(WeftError::TypeMismatch(
            "Custom knot vectors must be caller-supplied",
        )),
    }
}

/// Label an existing knot vector.
pub fn classify(order: usize, knots: &[f64]) -> KnotType {
    let len = knots.len();
    let first = knots[0];
    let last = knots[len - 1];
    let clamped = multiplicity(knots, first) >= order && multiplicity(knots, last) >= order;

    if clamped {
        let interior = &knots[order..len - order];
        if interior.is_empty() {
            return KnotType::Bezier;
        }
        // Clamped-uniform: interior knots equally spaced across the range.
        let step = (last - first) / (interior.len() + 1) as f64;
        let uniform = interior
            .iter()
            .enumerate()
            .all(|(i, &k)| Tolerance::knot_eq(k, first + step * (i + 1) as f64));
        if uniform {
            return KnotType::Clamped;
        }
        return KnotType::Custom;
    }

    let step = knots[1] - knots[0];
    let uniform = knots
        .windows(2)
        .all(|w| Tolerance::knot_eq(w[1] - w[0], step));
    if uniform && step > 0.0 {
        KnotType::BSpline
    } else {
        KnotType::Custom
    }
}

/// Affinely map the vector onto `[min, max]`.
pub fn rescale(knots: &mut [f64], min: f64, max: f64) {
    let lo = knots[0];
    let hi = knots[knots.len() - 1];
    let range = hi - lo;
    if range <= 0.0 {
        return;
    }
    let scale = (max - min) / range;
    for k in knots.iter_mut() {
        *k = min + (*k - lo) * scale;
    }
}

/// The distinct knot values within the domain, in order.
pub fn distinct_in_domain(order: usize, knots: &[f64], count: usize) -> Vec<f64> {
    let (lo, hi) = domain(order, knots, count);
    let mut out: Vec<f64> = Vec::new();
    for &k in knots {
        if k < lo - Tolerance::KNOT_EPSILON || k > hi + Tolerance::KNOT_EPSILON {
            continue;
        }
        if out.last().map_or(true, |&l| !Tolerance::knot_eq(l, k)) {
            out.push(k);
        }
    }
    out
}

/// Midpoints of every nonempty span inside the domain.
pub fn span_midpoints(order: usize, knots: &[f64], count: usize) -> Vec<f64> {
    distinct_in_domain(order, knots, count)
        .windows(2)
        .map(|w| 0.5 * (w[0] + w[1]))
        .collect()
}

/// The knot vector whose per-value multiplicity is the maximum of `a`'s
/// and `b`'s, so either can be refined onto it without shape change.
///
/// Inputs must share the same range; unify before Gordon, dual-skin and
/// concatenation.
pub fn unify(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    if a.is_empty() || b.is_empty() {
        return Err(WeftError::EmptyArgument("knot vector"));
    }
    if !Tolerance::knot_eq(a[0], b[0]) || !Tolerance::knot_eq(a[a.len() - 1], b[b.len() - 1]) {
        return Err(WeftError::OperationFailed(
            "unify: knot vectors span different ranges".into(),
        ));
    }

    let mut out = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let value = match (a.get(i), b.get(j)) {
            (Some(&x), Some(&y)) => x.min(y),
            (Some(&x), None) => x,
            (None, Some(&y)) => y,
            (None, None) => break,
        };
        let ma = a[i..].iter().take_while(|&&k| Tolerance::knot_eq(k, value)).count();
        let mb = b[j..].iter().take_while(|&&k| Tolerance::knot_eq(k, value)).count();
        for _ in 0..ma.max(mb) {
            out.push(value);
        }
        i += ma;
        j += mb;
    }
    Ok(out)
}

/// Knots present in `target` but missing (or of lower multiplicity) in
/// `knots`; inserting exactly these refines `knots` onto `target`.
pub fn missing_knots(knots: &[f64], target: &[f64]) -> Vec<f64> {
    let mut missing = Vec::new();
    let mut idx = 0;
    while idx < target.len() {
        let value = target[idx];
        let mt = target[idx..]
            .iter()
            .take_while(|&&k| Tolerance::knot_eq(k, value))
            .count();
        let mk = multiplicity(knots, value);
        for _ in mk..mt {
            missing.push(value);
        }
        idx += mt;
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_clamped() {
        let k = create(KnotType::Clamped, 3, 5).unwrap();
        assert_eq!(k, vec![0.0, 0.0, 0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0, 1.0, 1.0]);
        assert_eq!(classify(3, &k), KnotType::Clamped);
    }

    #[test]
    fn create_bezier() {
        let k = create(KnotType::Bezier, 4, 4).unwrap();
        assert_eq!(k, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(classify(4, &k), KnotType::Bezier);
        assert!(create(KnotType::Bezier, 4, 6).is_err());
    }

    #[test]
    fn create_bspline_is_uniform_unclamped() {
        let k = create(KnotType::BSpline, 3, 5).unwrap();
        assert_eq!(k.len(), 8);
        assert_eq!(classify(3, &k), KnotType::BSpline);
        assert!(!is_clamped(3, &k));
    }

    #[test]
    fn classify_custom() {
        let k = vec![0.0, 0.0, 0.0, 0.2, 0.9, 1.0, 1.0, 1.0];
        assert_eq!(classify(3, &k), KnotType::Custom);
    }

    #[test]
    fn validate_rejects_bad_vectors() {
        assert!(validate(3, 5, &[0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0]).is_err()); // short
        assert!(validate(3, 5, &[0.0, 0.0, 0.0, 0.6, 0.4, 1.0, 1.0, 1.0]).is_err()); // decreasing
        assert!(validate(2, 6, &[0.0, 0.0, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0]).is_err()); // mult 3 > order 2
        assert!(validate(3, 5, &[0.0, 0.0, 0.0, 0.3, 0.7, 1.0, 1.0, 1.0]).is_ok());
    }

    #[test]
    fn unify_takes_max_multiplicity() {
        let a = vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let b = vec![0.0, 0.0, 0.0, 0.5, 0.5, 0.75, 1.0, 1.0, 1.0];
        let u = unify(&a, &b).unwrap();
        assert_eq!(u, vec![0.0, 0.0, 0.0, 0.5, 0.5, 0.75, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn missing_knots_against_target() {
        let k = vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        let target = vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.5, 1.0, 1.0, 1.0];
        assert_eq!(missing_knots(&k, &target), vec![0.25, 0.5]);
    }

    #[test]
    fn span_midpoints_skip_empty_spans() {
        let k = vec![0.0, 0.0, 0.0, 0.5, 0.5, 1.0, 1.0, 1.0];
        assert_eq!(span_midpoints(3, &k, 5), vec![0.25, 0.75]);
    }

    #[test]
    fn rescale_to_unit() {
        let mut k = vec![2.0, 2.0, 2.0, 3.0, 4.0, 4.0, 4.0];
        rescale(&mut k, 0.0, 1.0);
        assert_eq!(k, vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0]);
    }
}
