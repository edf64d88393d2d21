//! Gap fillets between two patch borders, and the set-back variant that
//! nudges the borders instead of adding a blend patch.

use weft_core::{Result, Tolerance, WeftError};
use weft_math::DVec4;

use crate::compat::{make_curves_compatible, CompatLevel};
use crate::curve::Curve;
use crate::net::ControlNet;
use crate::patch::Patch;
use crate::{knots, Axis, KnotType};

/// Which border of a patch faces the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderPick {
    UStart,
    UEnd,
    VStart,
    VEnd,
}

impl BorderPick {
    fn axis(self) -> Axis {
        match self {
            BorderPick::UStart | BorderPick::UEnd => Axis::U,
            BorderPick::VStart | BorderPick::VEnd => Axis::V,
        }
    }

    fn is_end(self) -> bool {
        matches!(self, BorderPick::UEnd | BorderPick::VEnd)
    }
}

/// Border control line and the line one row further in, as curves over
/// the border's own axis.
fn border_lines(patch: &Patch, pick: BorderPick) -> Result<(Curve, Curve)> {
    let axis = pick.axis();
    let count = patch.count(axis);
    if count < 2 {
        return Err(WeftError::TypeMismatch("patch too small for a border tangent"));
    }
    let (border_idx, inner_idx) = if pick.is_end() {
        (count - 1, count - 2)
    } else {
        (0, 1)
    };
    let other = axis.other();
    let make = |idx: usize| {
        Curve::new(
            patch.order(other),
            patch.knot_type(other),
            patch.net.line(other, idx),
            Some(patch.knots(other).to_vec()),
        )
    };
    Ok((make(border_idx)?, make(inner_idx)?))
}

/// Build a degree-4 blend patch across the gap between one border of
/// `p1` and one of `p2`.
///
/// Tangent magnitude: `tan_len > 0` is absolute; `tan_len < 0` takes
/// `|tan_len|` as a fraction of the per-column inter-border distance.
/// Returns `Ok(None)` when the borders already coincide within the
/// tolerance and no fillet is needed.
pub fn fill_gap(
    p1: &Patch,
    pick1: BorderPick,
    p2: &Patch,
    pick2: BorderPick,
    tan_len: f64,
    tol: &Tolerance,
) -> Result<Option<Patch>> {
    let (b1, i1) = border_lines(p1, pick1)?;
    let (b2, i2) = border_lines(p2, pick2)?;

    let mut family = vec![b1, i1, b2, i2];
    make_curves_compatible(&mut family, CompatLevel::Knots)?;
    let [border1, inner1, border2, inner2]: [Curve; 4] =
        family.try_into().map_err(|_| WeftError::OperationFailed("fillet family".into()))?;

    let coincide = border1
        .control
        .iter()
        .zip(&border2.control)
        .all(|(a, b)| a.truncate().distance(b.truncate()) < tol.linear);
    if coincide {
        return Ok(None);
    }

    let width = border1.len();
    let mut points = Vec::with_capacity(width * 5);
    for j in 0..width {
        let a = border1.control[j];
        let d = border2.control[j];
        let gap = a.truncate().distance(d.truncate());
        let len = if tan_len >= 0.0 { tan_len } else { -tan_len * gap };

        let ta = (a.truncate() - inner1.control[j].truncate()).normalize_or_zero();
        let td = (d.truncate() - inner2.control[j].truncate()).normalize_or_zero();
        let a1 = a.truncate() + ta * len;
        let d1 = d.truncate() + td * len;
        let mid = 0.5 * (a1 + d1);

        points.push(a);
        points.push(a1.extend(a.w));
        points.push(mid.extend(0.5 * (a.w + d.w)));
        points.push(d1.extend(d.w));
        points.push(d);
    }

    let net = ControlNet::new(width, 5, points)?;
    let vknots = knots::create(KnotType::Bezier, 5, 5)?;
    let mut patch = Patch::new(
        border1.order,
        5,
        border1.knot_type,
        KnotType::Bezier,
        net,
        Some(border1.knots.clone()),
        Some(vknots),
    )?;
    patch.update_rational();
    Ok(Some(patch))
}

/// Nudge both patches' border control lines toward each other along the
/// border tangent direction by `tan_len` (absolute, or a fraction of the
/// per-column gap when negative). The inverse gesture of [`fill_gap`]:
/// instead of adding material the borders retreat.
pub fn set_back(
    p1: &mut Patch,
    pick1: BorderPick,
    p2: &mut Patch,
    pick2: BorderPick,
    tan_len: f64,
) -> Result<()> {
    let mut apply = |patch: &mut Patch, pick: BorderPick, other_border: &[DVec4]| -> Result<()> {
        let axis = pick.axis();
        let count = patch.count(axis);
        if count < 2 {
            return Err(WeftError::TypeMismatch("patch too small for set-back"));
        }
        let (border_idx, inner_idx) = if pick.is_end() {
            (count - 1, count - 2)
        } else {
            (0, 1)
        };
        let other = axis.other();
        let border = patch.net.line(other, border_idx);
        let inner = patch.net.line(other, inner_idx);
        let moved: Vec<DVec4> = border
            .iter()
            .zip(&inner)
            .enumerate()
            .map(|(j, (b, i))| {
                // retreat along the inward tangent
                let inward = (i.truncate() - b.truncate()).normalize_or_zero();
                let len = if tan_len >= 0.0 {
                    tan_len
                } else {
                    let gap = other_border
                        .get(j.min(other_border.len() - 1))
                        .map(|o| o.truncate().distance(b.truncate()))
                        .unwrap_or(0.0);
                    -tan_len * gap
                };
                (b.truncate() + inward * len).extend(b.w)
            })
            .collect();
        patch.net.set_line(other, border_idx, &moved);
        patch.invalidate_caches();
        Ok(())
    };

    let border2 = {
        let axis = pick2.axis();
        let idx = if pick2.is_end() { p2.count(axis) - 1 } else { 0 };
        p2.net.line(axis.other(), idx)
    };
    let border1 = {
        let axis = pick1.axis();
        let idx = if pick1.is_end() { p1.count(axis) - 1 } else { 0 };
        p1.net.line(axis.other(), idx)
    };
    apply(p1, pick1, &border2)?;
    apply(p2, pick2, &border1)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;

    /// Two coplanar 2x2 sheets with a gap of 1 along x.
    fn gap_pair() -> (Patch, Patch) {
        let sheet = |x0: f64| {
            let points = (0..2)
                .flat_map(|i| {
                    (0..2).map(move |j| DVec4::new(x0 + i as f64, j as f64, 0.0, 1.0))
                })
                .collect();
            let net = ControlNet::new(2, 2, points).unwrap();
            Patch::with_default_knots(2, 2, net).unwrap()
        };
        (sheet(0.0), sheet(2.0))
    }

    #[test]
    fn fillet_bridges_the_gap() {
        let (p1, p2) = gap_pair();
        let fillet = fill_gap(
            &p1,
            BorderPick::UEnd,
            &p2,
            BorderPick::UStart,
            -0.25,
            &Tolerance::default_precision(),
        )
        .unwrap()
        .expect("gap should need a fillet");
        // fillet spans from x = 1 to x = 2 at both border rows
        for i in 0..=6 {
            let u = i as f64 / 6.0;
            assert!((fillet.point_at(u, 0.0).x - 1.0).abs() < 1e-9);
            assert!((fillet.point_at(u, 1.0).x - 2.0).abs() < 1e-9);
        }
        // interior stays inside the gap and on the plane
        let mid = fillet.point_at(0.5, 0.5);
        assert!(mid.x > 1.0 && mid.x < 2.0);
        assert!(mid.z.abs() < 1e-9);
    }

    #[test]
    fn coincident_borders_need_no_fillet() {
        let (p1, _) = gap_pair();
        let p2 = {
            let points = (0..2)
                .flat_map(|i| {
                    (0..2).map(move |j| DVec4::new(1.0 + i as f64, j as f64, 0.0, 1.0))
                })
                .collect();
            let net = ControlNet::new(2, 2, points).unwrap();
            Patch::with_default_knots(2, 2, net).unwrap()
        };
        let result = fill_gap(
            &p1,
            BorderPick::UEnd,
            &p2,
            BorderPick::UStart,
            0.1,
            &Tolerance::default_precision(),
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn absolute_tangent_length_is_used() {
        let (p1, p2) = gap_pair();
        let fillet = fill_gap(
            &p1,
            BorderPick::UEnd,
            &p2,
            BorderPick::UStart,
            0.3,
            &Tolerance::default_precision(),
        )
        .unwrap()
        .unwrap();
        // second control row sits exactly tan_len beyond the border
        assert!((fillet.net.get(0, 1).x - 1.3).abs() < 1e-12);
        assert!((fillet.net.get(0, 3).x - 1.7).abs() < 1e-12);
    }

    #[test]
    fn set_back_retreats_both_borders() {
        let (mut p1, mut p2) = gap_pair();
        set_back(&mut p1, BorderPick::UEnd, &mut p2, BorderPick::UStart, 0.25).unwrap();
        // p1's x = 1 border moves back to 0.75, p2's x = 2 border to 2.25
        for j in 0..2 {
            assert!((p1.net.get(1, j).x - 0.75).abs() < 1e-12);
            assert!((p2.net.get(0, j).x - 2.25).abs() < 1e-12);
        }
        // opposite borders untouched
        assert_eq!(p1.net.get(0, 0).x, 0.0);
        assert_eq!(p2.net.get(1, 0).x, 3.0);
    }
}
