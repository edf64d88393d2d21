//! Making curve and patch families compatible: same order, same control
//! count, or byte-identical knot vectors, as required by skinning,
//! Gordon surfaces and concatenation.
//!
//! Members already mutated by earlier steps are not rolled back when a
//! later member fails; callers may inspect the partially converted
//! inputs after an error.

use serde::{Deserialize, Serialize};
use weft_core::Result;

use crate::curve::Curve;
use crate::patch::Patch;
use crate::{knots, Axis};

/// How far to drive a family toward a common basis. Each level implies
/// the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompatLevel {
    /// Equal order only.
    Order,
    /// Equal order and control point count.
    Length,
    /// Equal order and identical knot vectors.
    Knots,
}

fn longest_gap_midpoint(order: usize, knot_data: &[f64], count: usize) -> f64 {
    let distinct = knots::distinct_in_domain(order, knot_data, count);
    let mut best = (0.0, 0.5);
    for w in distinct.windows(2) {
        let gap = w[1] - w[0];
        if gap > best.0 {
            best = (gap, 0.5 * (w[0] + w[1]));
        }
    }
    best.1
}

/// Drive a curve family to a common basis on `[0, 1]`.
pub fn make_curves_compatible(curves: &mut [Curve], level: CompatLevel) -> Result<()> {
    if curves.len() < 2 {
        if let Some(c) = curves.first_mut() {
            c.clamp()?;
            c.rescale_domain(0.0, 1.0);
        }
        return Ok(());
    }

    for c in curves.iter_mut() {
        c.clamp()?;
        c.rescale_domain(0.0, 1.0);
    }

    let max_order = curves.iter().map(|c| c.order).max().unwrap();
    for c in curves.iter_mut() {
        c.elevate(max_order - c.order)?;
    }

    if level >= CompatLevel::Length {
        let max_len = curves.iter().map(Curve::len).max().unwrap();
        for c in curves.iter_mut() {
            while c.len() < max_len {
                let mid = longest_gap_midpoint(c.order, &c.knots, c.len());
                c.insert_knot(mid, 1)?;
            }
        }
    }

    if level >= CompatLevel::Knots {
        loop {
            let mut target = curves[0].knots.clone();
            for c in curves[1..].iter() {
                target = knots::unify(&target, &c.knots)?;
            }
            let mut converged = true;
            for c in curves.iter_mut() {
                let missing = knots::missing_knots(&c.knots, &target);
                if !missing.is_empty() {
                    c.refine_knots(Some(&missing))?;
                    converged = false;
                }
            }
            if converged {
                break;
            }
        }
    }
    Ok(())
}

/// Drive a patch family to a common basis along `axis` on `[0, 1]`.
pub fn make_patches_compatible(
    patches: &mut [Patch],
    axis: Axis,
    level: CompatLevel,
) -> Result<()> {
    if patches.is_empty() {
        return Ok(());
    }

    for p in patches.iter_mut() {
        p.clamp(axis)?;
        p.rescale_domain(axis, 0.0, 1.0);
    }

    let max_order = patches.iter().map(|p| p.order(axis)).max().unwrap();
    for p in patches.iter_mut() {
        let t = max_order - p.order(axis);
        p.elevate(axis, t)?;
    }

    if level >= CompatLevel::Length {
        let max_len = patches.iter().map(|p| p.count(axis)).max().unwrap();
        for p in patches.iter_mut() {
            while p.count(axis) < max_len {
                let mid = longest_gap_midpoint(p.order(axis), p.knots(axis), p.count(axis));
                p.insert_knot(axis, mid, 1)?;
            }
        }
    }

    if level >= CompatLevel::Knots {
        loop {
            let mut target = patches[0].knots(axis).to_vec();
            for p in patches[1..].iter() {
                target = knots::unify(&target, p.knots(axis))?;
            }
            let mut converged = true;
            for p in patches.iter_mut() {
                let missing = knots::missing_knots(p.knots(axis), &target);
                if !missing.is_empty() {
                    p.refine_knots(axis, Some(&missing))?;
                    converged = false;
                }
            }
            if converged {
                break;
            }
        }
    }
    Ok(())
}
