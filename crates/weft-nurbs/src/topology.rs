//! Topological queries on a patch: control-point normals, closedness,
//! planarity and degeneracy.
//!
//! Neighbor traversal is closedness-aware. An `Open` axis stops at the
//! border, a `Closed` axis wraps by one point across the seam, and a
//! `Periodic` axis wraps through the `order − 1` redundant rows by
//! stepping modulo the unique period.

use weft_core::Tolerance;
use weft_math::{Plane, Point3, Vector3};

use crate::patch::Patch;
use crate::{knots, Axis, AxisType};

/// One step along an axis from `idx`, honoring the axis's closedness.
/// Returns `None` when an open axis runs off the border.
fn step(idx: usize, dir: isize, count: usize, order: usize, atype: AxisType) -> Option<usize> {
    match atype {
        AxisType::Open => {
            let next = idx as isize + dir;
            (next >= 0 && (next as usize) < count).then(|| next as usize)
        }
        AxisType::Closed => {
            Some((idx as isize + dir).rem_euclid(count as isize) as usize)
        }
        AxisType::Periodic => {
            // the last order-1 lines duplicate the first order-1
            let period = (count - (order - 1)) as isize;
            Some(((idx as isize).rem_euclid(period) + dir).rem_euclid(period) as usize)
        }
    }
}

/// Walk from `(i, j)` in grid direction `(di, dj)` until a point distinct
/// from `center` is found, skipping the first `skip` distinct points.
fn distinct_neighbor(
    patch: &Patch,
    i: usize,
    j: usize,
    di: isize,
    dj: isize,
    center: Point3,
    skip: usize,
    tol: &Tolerance,
) -> Option<Point3> {
    let mut ci = i;
    let mut cj = j;
    let mut remaining = skip;
    let limit = patch.width() + patch.height();
    for _ in 0..limit {
        if di != 0 {
            ci = step(ci, di, patch.width(), patch.uorder, patch.utype)?;
        }
        if dj != 0 {
            cj = step(cj, dj, patch.height(), patch.vorder, patch.vtype)?;
        }
        if ci == i && cj == j {
            return None; // wrapped all the way around
        }
        let p = patch.net.position(ci, cj);
        if p.distance(center) > tol.linear {
            if remaining == 0 {
                return Some(p);
            }
            remaining -= 1;
        }
    }
    None
}

fn fan_normal(
    patch: &Patch,
    i: usize,
    j: usize,
    skip: usize,
    tol: &Tolerance,
) -> Option<Vector3> {
    let center = patch.net.position(i, j);
    // cyclic order: +u, +v, -u, -v
    let dirs: [(isize, isize); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
    let neighbors: Vec<Point3> = dirs
        .iter()
        .filter_map(|&(di, dj)| distinct_neighbor(patch, i, j, di, dj, center, skip, tol))
        .collect();
    if neighbors.len() < 2 {
        return None;
    }

    // a full 4-neighborhood closes the fan; with fewer neighbors the
    // wrap pair would span the missing direction and skew the average
    let pairs = if neighbors.len() == 4 {
        4
    } else {
        neighbors.len() - 1
    };
    let mut acc = Vector3::ZERO;
    let mut found = 0;
    for k in 0..pairs {
        let a = neighbors[k] - center;
        let b = neighbors[(k + 1) % neighbors.len()] - center;
        let n = a.cross(b);
        if n.length() > tol.linear * tol.linear {
            acc += n.normalize();
            found += 1;
        }
    }
    if found == 0 {
        return None;
    }
    let avg = acc.normalize_or_zero();
    (avg != Vector3::ZERO).then_some(avg)
}

/// Estimated normal at control point `(i, j)` from up to four distinct
/// neighbors. Degenerate neighborhoods (poles, collapsed rows) fall back
/// to a one-ring-further search; an unresolved point yields zero.
pub fn control_normal(patch: &Patch, i: usize, j: usize, tol: &Tolerance) -> Vector3 {
    control_normal_search(patch, i, j, 1, tol)
}

/// [`control_normal`] with a configurable fallback depth: rings up to
/// `max_skip` neighbors further out are tried before giving up.
pub fn control_normal_search(
    patch: &Patch,
    i: usize,
    j: usize,
    max_skip: usize,
    tol: &Tolerance,
) -> Vector3 {
    (0..=max_skip)
        .find_map(|skip| fan_normal(patch, i, j, skip, tol))
        .unwrap_or(Vector3::ZERO)
}

/// Whether the surface joins up across the given axis: opposing borders
/// are sampled at every distinct knot of the other axis and at each span
/// midpoint, and compared in 3D.
pub fn is_closed(patch: &Patch, axis: Axis, tol: &Tolerance) -> bool {
    let (lo, hi) = patch.domain(axis);
    let other = axis.other();
    let mut samples = knots::distinct_in_domain(
        patch.order(other),
        patch.knots(other),
        patch.count(other),
    );
    samples.extend(knots::span_midpoints(
        patch.order(other),
        patch.knots(other),
        patch.count(other),
    ));
    samples.iter().all(|&t| {
        let (a, b) = match axis {
            Axis::U => (patch.point_at(lo, t), patch.point_at(hi, t)),
            Axis::V => (patch.point_at(t, lo), patch.point_at(t, hi)),
        };
        a.distance(b) < tol.linear
    })
}

/// Whether all control points lie in one plane within the linear
/// tolerance. A net without three spanning points counts as planar.
pub fn is_planar(patch: &Patch, tol: &Tolerance) -> bool {
    let pts: Vec<Point3> = patch.net.points.iter().map(|p| p.truncate()).collect();
    let a = pts[0];
    let Some(&b) = pts.iter().find(|p| p.distance(a) > tol.linear) else {
        return true;
    };
    let Some(plane) = pts
        .iter()
        .find_map(|&c| Plane::from_three_points(a, b, c))
    else {
        return true; // all points collinear
    };
    pts.iter().all(|&p| plane.signed_distance(p).abs() < tol.linear)
}

/// Whether the net has collapsed: all points coincide, or every row has
/// ≈ zero cumulative length, or every column does.
pub fn is_degenerate(patch: &Patch, tol: &Tolerance) -> bool {
    let line_length = |pts: &[weft_math::DVec4]| -> f64 {
        pts.windows(2)
            .map(|w| w[0].truncate().distance(w[1].truncate()))
            .sum()
    };

    let rows_dead = (0..patch.height())
        .all(|j| line_length(&patch.net.line(Axis::U, j)) < tol.linear);
    if rows_dead {
        return true;
    }
    (0..patch.width()).all(|i| line_length(&patch.net.line(Axis::V, i)) < tol.linear)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::ControlNet;
    use glam::{dvec3, DVec4};

    fn flat(w: usize, h: usize) -> Patch {
        let points = (0..w)
            .flat_map(|i| (0..h).map(move |j| DVec4::new(i as f64, j as f64, 0.0, 1.0)))
            .collect();
        let net = ControlNet::new(w, h, points).unwrap();
        Patch::with_default_knots(2.min(w), 2.min(h), net).unwrap()
    }

    #[test]
    fn flat_net_normals_are_z() {
        let p = flat(4, 4);
        let tol = Tolerance::default_precision();
        for i in 0..4 {
            for j in 0..4 {
                let n = control_normal(&p, i, j, &tol);
                assert!((n.z.abs() - 1.0).abs() < 1e-12, "normal at ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn flat_net_is_planar_not_degenerate() {
        let p = flat(4, 3);
        let tol = Tolerance::default_precision();
        assert!(is_planar(&p, &tol));
        assert!(!is_degenerate(&p, &tol));
    }

    #[test]
    fn bumped_net_is_not_planar() {
        let mut p = flat(4, 4);
        let idx = p.net.index(2, 2);
        p.net.points[idx].z = 1.0;
        assert!(!is_planar(&p, &Tolerance::default_precision()));
    }

    #[test]
    fn collapsed_net_is_degenerate() {
        let points = vec![DVec4::new(1.0, 2.0, 3.0, 1.0); 9];
        let net = ControlNet::new(3, 3, points).unwrap();
        let p = Patch::with_default_knots(2, 2, net).unwrap();
        assert!(is_degenerate(&p, &Tolerance::default_precision()));
    }

    #[test]
    fn degenerate_ring_resolves_one_ring_further() {
        // every column collapsed; the j=1 row bends up at the ends, so the
        // first distinct neighbors are collinear and only the second ring
        // yields a usable triangle
        let row = [
            dvec3(-2.0, 0.0, 1.0),
            dvec3(-1.0, 0.0, 0.0),
            dvec3(0.0, 0.0, 0.0),
            dvec3(1.0, 0.0, 0.0),
            dvec3(2.0, 0.0, 1.0),
        ];
        let mut points = Vec::new();
        for p in &row {
            for _ in 0..3 {
                points.push(p.extend(1.0));
            }
        }
        let net = ControlNet::new(5, 3, points).unwrap();
        let p = Patch::with_default_knots(3, 3, net).unwrap();
        let tol = Tolerance::default_precision();
        let n = control_normal(&p, 2, 1, &tol);
        assert!(n.length() > 0.9, "normal should resolve, got {:?}", n);
        assert!(n.x.abs() < 1e-9 && n.z.abs() < 1e-9);
    }

    #[test]
    fn fully_unresolved_point_yields_zero() {
        let points = vec![DVec4::new(0.0, 0.0, 0.0, 1.0); 9];
        let net = ControlNet::new(3, 3, points).unwrap();
        let p = Patch::with_default_knots(2, 2, net).unwrap();
        let n = control_normal(&p, 1, 1, &Tolerance::default_precision());
        assert_eq!(n, Vector3::ZERO);
    }

    #[test]
    fn open_flat_patch_is_not_closed() {
        let p = flat(4, 4);
        assert!(!is_closed(&p, Axis::U, &Tolerance::default_precision()));
    }

    #[test]
    fn periodic_redundant_rows_mirror_their_source_normals() {
        use crate::KnotType;

        // hexagonal tube, order 3 in u: rows 6 and 7 duplicate rows 0 and 1
        let mut points = Vec::new();
        for k in 0..8 {
            let a = (k % 6) as f64 * std::f64::consts::FRAC_PI_3;
            for j in 0..2 {
                points.push(dvec3(a.cos(), a.sin(), j as f64).extend(1.0));
            }
        }
        let net = ControlNet::new(8, 2, points).unwrap();
        let mut p = Patch::new(
            3,
            2,
            KnotType::BSpline,
            KnotType::Clamped,
            net,
            None,
            None,
        )
        .unwrap();
        p.utype = AxisType::Periodic;
        let tol = Tolerance::default_precision();
        for j in 0..2 {
            for (dup, src) in [(6usize, 0usize), (7, 1)] {
                let nd = control_normal(&p, dup, j, &tol);
                let ns = control_normal(&p, src, j, &tol);
                assert!(
                    nd.distance(ns) < 1e-12,
                    "row {} normal {:?} differs from row {} normal {:?}",
                    dup,
                    nd,
                    src,
                    ns
                );
            }
        }
    }

    #[test]
    fn wrapped_net_is_closed_in_u() {
        // square tube: last u row repeats the first
        let ring = [
            dvec3(1.0, 0.0, 0.0),
            dvec3(0.0, 1.0, 0.0),
            dvec3(-1.0, 0.0, 0.0),
            dvec3(0.0, -1.0, 0.0),
            dvec3(1.0, 0.0, 0.0),
        ];
        let mut points = Vec::new();
        for p in &ring {
            for j in 0..2 {
                points.push(dvec3(p.x, p.y, j as f64).extend(1.0));
            }
        }
        let net = ControlNet::new(5, 2, points).unwrap();
        let mut patch = Patch::with_default_knots(2, 2, net).unwrap();
        patch.utype = crate::AxisType::Closed;
        assert!(is_closed(&patch, Axis::U, &Tolerance::default_precision()));
    }
}
