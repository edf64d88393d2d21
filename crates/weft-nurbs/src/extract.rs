//! Lifting curves out of a patch: isocurves, the averaged middle curve,
//! and the stitched boundary loop.

use weft_core::{Result, Tolerance, WeftError};
use weft_math::{DVec4, Vector3};

use crate::curve::Curve;
use crate::patch::Patch;
use crate::{knots, Axis};

/// Extract the isocurve at `value` on the fixed `axis`; the result runs
/// along the other axis.
///
/// When `value` is not already at full split multiplicity the insertion
/// happens on a private copy, so the input patch is never mutated.
pub fn extract_isocurve(patch: &Patch, axis: Axis, value: f64, relative: bool) -> Result<Curve> {
    let (lo, hi) = patch.domain(axis);
    let value = if relative { lo + (hi - lo) * value } else { value };
    if value < lo - Tolerance::KNOT_EPSILON || value > hi + Tolerance::KNOT_EPSILON {
        return Err(WeftError::OperationFailed(format!(
            "isocurve parameter {} outside domain [{}, {}]",
            value, lo, hi
        )));
    }

    let order = patch.order(axis);
    let needed = (order - 1).saturating_sub(knots::multiplicity(patch.knots(axis), value));
    let boundary = Tolerance::knot_eq(value, lo) || Tolerance::knot_eq(value, hi);

    let mut work;
    let source = if needed > 0 || (boundary && !patch.is_clamped(axis)) {
        work = patch.clone();
        if boundary {
            work.clamp(axis)?;
        } else {
            work.insert_knot(axis, value, needed)?;
        }
        &work
    } else {
        patch
    };

    // With multiplicity order-1 a single basis function is 1 at `value`,
    // so the control line there is exactly the isocurve.
    let row = if Tolerance::knot_eq(value, lo) {
        0
    } else if Tolerance::knot_eq(value, hi) {
        source.count(axis) - 1
    } else {
        let first = source
            .knots(axis)
            .iter()
            .position(|&k| Tolerance::knot_eq(k, value))
            .ok_or_else(|| WeftError::OperationFailed("isocurve knot not found".into()))?;
        first - 1
    };

    let other = axis.other();
    let control = source.net.line(other, row);
    Curve::new(
        source.order(other),
        source.knot_type(other),
        control,
        Some(source.knots(other).to_vec()),
    )
}

/// The curve whose control points are the average of every control line
/// across the fixed `axis`.
pub fn extract_middle_curve(patch: &Patch, axis: Axis) -> Result<Curve> {
    let other = axis.other();
    let n = patch.count(axis);
    let m = patch.count(other);
    let mut control = vec![DVec4::ZERO; m];
    for fixed in 0..n {
        for (acc, p) in control.iter_mut().zip(patch.net.line(other, fixed)) {
            *acc += p;
        }
    }
    for p in &mut control {
        *p /= n as f64;
    }
    Curve::new(
        patch.order(other),
        patch.knot_type(other),
        control,
        Some(patch.knots(other).to_vec()),
    )
}

/// A stitched boundary loop, optionally with surface normals sampled
/// along it.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub curve: Curve,
    pub normals: Option<Vec<Vector3>>,
}

fn is_degenerate_curve(curve: &Curve, tol: &Tolerance) -> bool {
    let total: f64 = curve
        .control
        .windows(2)
        .map(|w| w[0].truncate().distance(w[1].truncate()))
        .sum();
    total < tol.linear
}

/// Extract the four borders, discard degenerate segments, orient the rest
/// into one continuous loop and concatenate.
///
/// With `extract_normals` the patch orders are first equalized on a
/// private copy so the per-border sampling densities match; normals are
/// sampled at every distinct knot and span midpoint along each kept
/// border, in loop order.
pub fn extract_boundary(patch: &Patch, extract_normals: bool, tol: &Tolerance) -> Result<Boundary> {
    let (ulo, uhi) = patch.domain(Axis::U);
    let (vlo, vhi) = patch.domain(Axis::V);

    // counterclockwise: v=lo, u=hi, v=hi (reversed), u=lo (reversed)
    let borders: [(Axis, f64, bool); 4] = [
        (Axis::V, vlo, false),
        (Axis::U, uhi, false),
        (Axis::V, vhi, true),
        (Axis::U, ulo, true),
    ];

    let mut segments: Vec<(Curve, Axis, f64, bool)> = Vec::new();
    for &(axis, value, reversed) in &borders {
        let mut c = extract_isocurve(patch, axis, value, false)?;
        if is_degenerate_curve(&c, tol) {
            continue;
        }
        if reversed {
            c.revert();
        }
        c.clamp()?;
        segments.push((c, axis, value, reversed));
    }
    if segments.is_empty() {
        return Err(WeftError::OperationFailed(
            "boundary extraction found only degenerate borders".into(),
        ));
    }

    let mut iter = segments.iter();
    let (first, ..) = iter.next().unwrap();
    let mut curve = first.clone();
    curve.rescale_domain(0.0, 1.0);
    for (seg, ..) in iter {
        let end = {
            let (_, hi) = curve.domain();
            curve.point_at(hi)
        };
        let mut seg = seg.clone();
        seg.rescale_domain(0.0, 1.0);
        let (slo, shi) = seg.domain();
        if seg.point_at(shi).distance(end) < seg.point_at(slo).distance(end) {
            seg.revert();
        }
        curve.concat(&seg)?;
    }

    let normals = if extract_normals {
        let mut work = patch.clone();
        match work.uorder.cmp(&work.vorder) {
            std::cmp::Ordering::Less => work.elevate(Axis::U, work.vorder - work.uorder)?,
            std::cmp::Ordering::Greater => work.elevate(Axis::V, work.uorder - work.vorder)?,
            std::cmp::Ordering::Equal => {}
        }
        let mut out = Vec::new();
        for &(_, axis, value, reversed) in &segments {
            let other = axis.other();
            let mut params =
                knots::distinct_in_domain(work.order(other), work.knots(other), work.count(other));
            params.extend(knots::span_midpoints(
                work.order(other),
                work.knots(other),
                work.count(other),
            ));
            params.sort_by(|a, b| a.partial_cmp(b).unwrap());
            if reversed {
                params.reverse();
            }
            for t in params {
                let n = match axis {
                    Axis::U => work.normal_at(value, t),
                    Axis::V => work.normal_at(t, value),
                };
                out.push(n);
            }
        }
        Some(out)
    } else {
        None
    };

    Ok(Boundary { curve, normals })
}
