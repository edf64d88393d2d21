//! Gordon surfaces: two curve families joined through their
//! intersection grid, `skin_u + skin_v − intersections`.

use weft_core::{Result, Tolerance, WeftError};
use weft_math::{DVec4, Point3};

use crate::compat::{make_patches_compatible, CompatLevel};
use crate::curve::Curve;
use crate::interpolate;
use crate::net::ControlNet;
use crate::ops::skin::{skin_u, skin_v};
use crate::patch::Patch;
use crate::{Axis, KnotType};

/// Tensor-product interpolation through a point grid; `grid[l][k]` runs
/// over u with `l` and v with `k`.
fn interpolate_grid(grid: &[Vec<Point3>], uorder: usize, vorder: usize) -> Result<Patch> {
    let m = grid.len();
    let n = grid[0].len();

    // average chordal parameters across the grid lines
    let mut uparams = vec![0.0; m];
    for k in 0..n {
        let line: Vec<Point3> = (0..m).map(|l| grid[l][k]).collect();
        for (acc, p) in uparams.iter_mut().zip(interpolate::chord_parameters(&line, false)) {
            *acc += p;
        }
    }
    for p in uparams.iter_mut() {
        *p /= n as f64;
    }
    let mut vparams = vec![0.0; n];
    for l in 0..m {
        let line: Vec<Point3> = grid[l].clone();
        for (acc, p) in vparams.iter_mut().zip(interpolate::chord_parameters(&line, false)) {
            *acc += p;
        }
    }
    for p in vparams.iter_mut() {
        *p /= m as f64;
    }

    let uknots = interpolate::averaged_knots(uorder, &uparams)?;
    let vknots = interpolate::averaged_knots(vorder, &vparams)?;

    // interpolate along u per v-level, then along v per u-column
    let mut stage: Vec<Vec<DVec4>> = Vec::with_capacity(n);
    for k in 0..n {
        let pts: Vec<DVec4> = (0..m).map(|l| grid[l][k].extend(1.0)).collect();
        stage.push(interpolate::interpolate_homogeneous(
            &pts, uorder, &uparams, &uknots,
        )?);
    }
    let mut points = vec![DVec4::ZERO; m * n];
    for l in 0..m {
        let column: Vec<DVec4> = (0..n).map(|k| stage[k][l]).collect();
        let solved = interpolate::interpolate_homogeneous(&column, vorder, &vparams, &vknots)?;
        for (k, p) in solved.into_iter().enumerate() {
            points[l * n + k] = p;
        }
    }

    let net = ControlNet::new(m, n, points)?;
    Patch::new(
        uorder,
        vorder,
        KnotType::Custom,
        KnotType::Custom,
        net,
        Some(uknots),
        Some(vknots),
    )
}

/// Build a Gordon surface from `cu` (curves running along u, stacked in
/// v) and `cv` (curves running along v, stacked in u).
///
/// The intersection patch may be caller-supplied; otherwise it is
/// constructed from true curve-curve intersections (for two 2-curve
/// families, directly from the four corners). All three patches are
/// driven to a common basis and combined control point by control point.
/// The weight channel takes part only in the 2×2 case; larger families
/// are combined Euclidean with weights forced to 1.
pub fn gordon(cu: &[Curve], cv: &[Curve], intersections: Option<Patch>) -> Result<Patch> {
    if cu.len() < 2 || cv.len() < 2 {
        return Err(WeftError::TypeMismatch(
            "gordon needs at least two curves per family",
        ));
    }
    let coons = cu.len() == 2 && cv.len() == 2;
    let vorder = cu.len().min(4);
    let uorder = cv.len().min(4);

    let a = skin_v(cu, vorder, KnotType::Custom, true)?;
    let b = skin_u(cv, uorder, KnotType::Custom, true)?;

    let c = match intersections {
        Some(patch) => patch,
        None if coons => {
            // closed-form corner grid: cu are the v = 0 / 1 boundaries,
            // cv the u = 0 / 1 boundaries
            let tol = Tolerance::loose();
            let mut grid = vec![vec![Point3::ZERO; 2]; 2];
            for (l, cvc) in cv.iter().enumerate() {
                for (k, cuc) in cu.iter().enumerate() {
                    let (_, _, p) = interpolate::curve_intersection(cuc, cvc, &tol)?;
                    grid[l][k] = p;
                }
            }
            let net = ControlNet::new(
                2,
                2,
                vec![
                    grid[0][0].extend(1.0),
                    grid[0][1].extend(1.0),
                    grid[1][0].extend(1.0),
                    grid[1][1].extend(1.0),
                ],
            )?;
            Patch::with_default_knots(2, 2, net)?
        }
        None => {
            let tol = Tolerance::loose();
            let mut grid = vec![vec![Point3::ZERO; cu.len()]; cv.len()];
            for (l, cvc) in cv.iter().enumerate() {
                for (k, cuc) in cu.iter().enumerate() {
                    let (_, _, p) = interpolate::curve_intersection(cuc, cvc, &tol)?;
                    grid[l][k] = p;
                }
            }
            interpolate_grid(&grid, uorder, vorder)?
        }
    };

    let mut trio = [a, b, c];
    make_patches_compatible(&mut trio, Axis::U, CompatLevel::Knots)?;
    make_patches_compatible(&mut trio, Axis::V, CompatLevel::Knots)?;
    let [mut a, b, c] = trio;

    if coons {
        // rational combination in premultiplied homogeneous space
        for ((p, q), r) in a.net.points.iter_mut().zip(&b.net.points).zip(&c.net.points) {
            let hp = DVec4::new(p.x * p.w, p.y * p.w, p.z * p.w, p.w);
            let hq = DVec4::new(q.x * q.w, q.y * q.w, q.z * q.w, q.w);
            let hr = DVec4::new(r.x * r.w, r.y * r.w, r.z * r.w, r.w);
            let h = hp + hq - hr;
            *p = if h.w.abs() > 1e-14 {
                DVec4::new(h.x / h.w, h.y / h.w, h.z / h.w, h.w)
            } else {
                DVec4::new(h.x, h.y, h.z, 1.0)
            };
        }
    } else {
        for ((p, q), r) in a.net.points.iter_mut().zip(&b.net.points).zip(&c.net.points) {
            let e = p.truncate() + q.truncate() - r.truncate();
            *p = e.extend(1.0);
        }
    }
    a.update_rational();
    a.invalidate_caches();
    Ok(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;

    fn line(a: Point3, b: Point3) -> Curve {
        Curve::from_points(&[a, b], 2).unwrap()
    }

    #[test]
    fn coons_case_reduces_to_bilinear() {
        // four straight boundaries of a skewed quad with lifted corners
        let c00 = dvec3(0.0, 0.0, 0.0);
        let c10 = dvec3(2.0, 0.0, 1.0);
        let c01 = dvec3(0.0, 2.0, 0.5);
        let c11 = dvec3(2.0, 2.0, 0.0);
        let cu = [line(c00, c10), line(c01, c11)]; // v = 0 and v = 1
        let cv = [line(c00, c01), line(c10, c11)]; // u = 0 and u = 1
        let patch = gordon(&cu, &cv, None).unwrap();

        let bilinear = |u: f64, v: f64| {
            (1.0 - u) * (1.0 - v) * c00
                + u * (1.0 - v) * c10
                + (1.0 - u) * v * c01
                + u * v * c11
        };
        for iu in 0..=6 {
            for iv in 0..=6 {
                let (u, v) = (iu as f64 / 6.0, iv as f64 / 6.0);
                let d = patch.point_at(u, v).distance(bilinear(u, v));
                assert!(d < 1e-3, "off bilinear by {} at ({}, {})", d, u, v);
            }
        }
    }

    #[test]
    fn boundaries_are_reproduced() {
        let c00 = dvec3(0.0, 0.0, 0.0);
        let c10 = dvec3(2.0, 0.0, 0.0);
        let c01 = dvec3(0.0, 2.0, 0.0);
        let c11 = dvec3(2.0, 2.0, 0.0);
        let cu = [line(c00, c10), line(c01, c11)];
        let cv = [line(c00, c01), line(c10, c11)];
        let patch = gordon(&cu, &cv, None).unwrap();
        for i in 0..=8 {
            let t = i as f64 / 8.0;
            assert!(patch.point_at(t, 0.0).distance(cu[0].point_at(t)) < 1e-3);
            assert!(patch.point_at(t, 1.0).distance(cu[1].point_at(t)) < 1e-3);
            assert!(patch.point_at(0.0, t).distance(cv[0].point_at(t)) < 1e-3);
            assert!(patch.point_at(1.0, t).distance(cv[1].point_at(t)) < 1e-3);
        }
    }

    #[test]
    fn caller_supplied_intersections_are_used() {
        let c00 = dvec3(0.0, 0.0, 0.0);
        let c10 = dvec3(1.0, 0.0, 0.0);
        let c01 = dvec3(0.0, 1.0, 0.0);
        let c11 = dvec3(1.0, 1.0, 0.0);
        let cu = [line(c00, c10), line(c01, c11)];
        let cv = [line(c00, c01), line(c10, c11)];
        let net = ControlNet::new(
            2,
            2,
            vec![
                c00.extend(1.0),
                c01.extend(1.0),
                c10.extend(1.0),
                c11.extend(1.0),
            ],
        )
        .unwrap();
        let inter = Patch::with_default_knots(2, 2, net).unwrap();
        let patch = gordon(&cu, &cv, Some(inter)).unwrap();
        assert!(patch.point_at(0.5, 0.5).distance(dvec3(0.5, 0.5, 0.0)) < 1e-9);
    }

    #[test]
    fn three_by_three_family_interpolates_grid_curves() {
        // curves over the graph z = sin(pi x) * sin(pi y) scaled down
        use std::f64::consts::PI;
        let surf = |x: f64, y: f64| 0.3 * (PI * x).sin() * (PI * y).sin();
        let sample_u = |y: f64| {
            let pts: Vec<Point3> = (0..7)
                .map(|i| {
                    let x = i as f64 / 6.0;
                    dvec3(x, y, surf(x, y))
                })
                .collect();
            interpolate::interpolate_points(&pts, 4).unwrap()
        };
        let sample_v = |x: f64| {
            let pts: Vec<Point3> = (0..7)
                .map(|i| {
                    let y = i as f64 / 6.0;
                    dvec3(x, y, surf(x, y))
                })
                .collect();
            interpolate::interpolate_points(&pts, 4).unwrap()
        };
        let cu = [sample_u(0.0), sample_u(0.5), sample_u(1.0)];
        let cv = [sample_v(0.0), sample_v(0.5), sample_v(1.0)];
        let patch = gordon(&cu, &cv, None).unwrap();
        // the surface stays near the analytic graph it was built from
        for iu in 0..=6 {
            for iv in 0..=6 {
                let (x, y) = (iu as f64 / 6.0, iv as f64 / 6.0);
                let p = patch.point_at(
                    patch.domain(Axis::U).0
                        + (patch.domain(Axis::U).1 - patch.domain(Axis::U).0) * x,
                    patch.domain(Axis::V).0
                        + (patch.domain(Axis::V).1 - patch.domain(Axis::V).0) * y,
                );
                assert!((p.z - surf(p.x, p.y)).abs() < 0.1, "at ({}, {})", x, y);
            }
        }
    }
}
