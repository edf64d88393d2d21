//! Splitting a patch at a parameter value, and the subpatch extraction
//! built from repeated splits.

use weft_core::{Result, Tolerance, WeftError};
use weft_math::DVec4;

use crate::patch::Patch;
use crate::{knots, Axis, AxisType};

/// Split a patch into two independent halves at `value` on `axis`.
///
/// The knot is first inserted up to multiplicity `order − 1`; the net and
/// knot vector are then partitioned at the insertion point, each half
/// receiving one extra copy of the split value so both ends up clamped
/// there. Both halves' knot sequences are validated before acceptance;
/// on failure the insertion remains applied to the input.
pub fn split(patch: &mut Patch, axis: Axis, value: f64, relative: bool) -> Result<(Patch, Patch)> {
    let (lo, hi) = patch.domain(axis);
    let value = if relative { lo + (hi - lo) * value } else { value };
    if value <= lo + Tolerance::KNOT_EPSILON || value >= hi - Tolerance::KNOT_EPSILON {
        return Err(WeftError::OperationFailed(format!(
            "split parameter {} not interior to domain [{}, {}]",
            value, lo, hi
        )));
    }

    let order = patch.order(axis);
    let existing = knots::multiplicity(patch.knots(axis), value);
    let needed = (order - 1).saturating_sub(existing);
    if needed > 0 {
        patch.insert_knot(axis, value, needed)?;
    }

    let knot_data = patch.knots(axis);
    let first = knot_data
        .iter()
        .position(|&k| Tolerance::knot_eq(k, value))
        .ok_or_else(|| WeftError::OperationFailed("split knot vanished after insertion".into()))?;

    // left half: points [0, first), right half shares the junction point
    let count = patch.count(axis);
    let mut left_knots = knot_data[..first + order - 1].to_vec();
    left_knots.push(value);
    let mut right_knots = vec![value];
    right_knots.extend_from_slice(&knot_data[first..]);

    knots::validate(order, first, &left_knots).map_err(|e| {
        WeftError::OperationFailed(format!("split produced invalid left half: {}", e))
    })?;
    knots::validate(order, count - first + 1, &right_knots).map_err(|e| {
        WeftError::OperationFailed(format!("split produced invalid right half: {}", e))
    })?;

    let other = patch.count(axis.other());
    let gather = |range: std::ops::Range<usize>| -> Vec<DVec4> {
        let mut pts = Vec::with_capacity(range.len() * other);
        for a in range {
            for b in 0..other {
                let (i, j) = match axis {
                    Axis::U => (a, b),
                    Axis::V => (b, a),
                };
                pts.push(patch.net.get(i, j));
            }
        }
        pts
    };
    // gather() walks axis-major; reorder into the net's u-major layout
    let build_net = |count_along: usize, pts: Vec<DVec4>| -> Result<crate::net::ControlNet> {
        match axis {
            Axis::U => crate::net::ControlNet::new(count_along, other, pts),
            Axis::V => {
                let mut reordered = vec![DVec4::ZERO; pts.len()];
                for a in 0..count_along {
                    for b in 0..other {
                        reordered[b * count_along + a] = pts[a * other + b];
                    }
                }
                crate::net::ControlNet::new(other, count_along, reordered)
            }
        }
    };

    let make_half = |half_knots: Vec<f64>, range: std::ops::Range<usize>| -> Result<Patch> {
        let along = range.len();
        let net = build_net(along, gather(range))?;
        let mut half = match axis {
            Axis::U => Patch::new(
                order,
                patch.vorder,
                knots::classify(order, &half_knots),
                patch.vknot_type,
                net,
                Some(half_knots),
                Some(patch.vknots.clone()),
            )?,
            Axis::V => Patch::new(
                patch.uorder,
                order,
                patch.uknot_type,
                knots::classify(order, &half_knots),
                net,
                Some(patch.uknots.clone()),
                Some(half_knots),
            )?,
        };
        half.set_axis_type(axis, AxisType::Open);
        half.set_axis_type(axis.other(), patch.axis_type(axis.other()));
        Ok(half)
    };

    let left = make_half(left_knots, 0..first)?;
    let right = make_half(right_knots, first - 1..count)?;
    Ok((left, right))
}

/// Extract the subpatch over `[u0, u1] × [v0, v1]` (absolute parameters)
/// as up to four sequential splits on a working copy, keeping the wanted
/// half each time.
pub fn extract_subpatch(patch: &Patch, u0: f64, u1: f64, v0: f64, v1: f64) -> Result<Patch> {
    if u1 <= u0 || v1 <= v0 {
        return Err(WeftError::OperationFailed(
            "extract_subpatch: empty parameter rectangle".into(),
        ));
    }
    let mut work = patch.clone();

    let interior = |value: f64, dom: (f64, f64)| {
        value > dom.0 + Tolerance::KNOT_EPSILON && value < dom.1 - Tolerance::KNOT_EPSILON
    };

    if interior(u1, work.domain(Axis::U)) {
        let (left, _) = split(&mut work, Axis::U, u1, false)?;
        work = left;
    }
    if interior(u0, work.domain(Axis::U)) {
        let (_, right) = split(&mut work, Axis::U, u0, false)?;
        work = right;
    }
    if interior(v1, work.domain(Axis::V)) {
        let (left, _) = split(&mut work, Axis::V, v1, false)?;
        work = left;
    }
    if interior(v0, work.domain(Axis::V)) {
        let (_, right) = split(&mut work, Axis::V, v0, false)?;
        work = right;
    }
    Ok(work)
}
