//! Global through-interpolation and the parametrizations behind it,
//! plus the curve-curve proximity search used by Gordon surfaces.

use weft_core::{Result, Tolerance, WeftError};
use weft_math::{DVec4, Point3};

use crate::curve::Curve;
use crate::{basis, KnotType};

/// Chordal (or centripetal, with square-rooted distances) parameters for
/// a point sequence, normalized onto `[0, 1]`.
pub fn chord_parameters(points: &[Point3], centripetal: bool) -> Vec<f64> {
    let n = points.len();
    let mut params = vec![0.0; n];
    let mut total = 0.0;
    for i in 1..n {
        let mut d = points[i].distance(points[i - 1]);
        if centripetal {
            d = d.sqrt();
        }
        total += d;
        params[i] = total;
    }
    if total > 0.0 {
        for p in params.iter_mut() {
            *p /= total;
        }
    } else {
        // coincident points: fall back to uniform spacing
        for (i, p) in params.iter_mut().enumerate() {
            *p = i as f64 / (n - 1).max(1) as f64;
        }
    }
    params
}

/// Clamped knot vector from parameter averaging, so every basis row has
/// a dominant diagonal entry and the interpolation system stays well
/// conditioned.
pub fn averaged_knots(order: usize, params: &[f64]) -> Result<Vec<f64>> {
    let n = params.len();
    if n < order {
        return Err(WeftError::TypeMismatch("fewer parameters than order"));
    }
    let p = order - 1;
    let mut knots = vec![0.0; order];
    for j in 1..=(n - order) {
        let avg: f64 = params[j..j + p].iter().sum::<f64>() / p as f64;
        knots.push(avg);
    }
    knots.extend(std::iter::repeat(1.0).take(order));
    Ok(knots)
}

/// Solve the dense system `matrix * x = rhs` by Gaussian elimination with
/// partial pivoting; `rhs` columns are the four point components.
pub fn solve_linear(matrix: &mut [Vec<f64>], rhs: &mut [DVec4]) -> Result<()> {
    let n = matrix.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| {
                matrix[a][col]
                    .abs()
                    .partial_cmp(&matrix[b][col].abs())
                    .unwrap()
            })
            .unwrap();
        if matrix[pivot][col].abs() < 1e-14 {
            return Err(WeftError::OperationFailed(
                "interpolation system is singular".into(),
            ));
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                let sub = factor * matrix[col][k];
                matrix[row][k] -= sub;
            }
            let sub = factor * rhs[col];
            rhs[row] -= sub;
        }
    }
    for col in (0..n).rev() {
        let mut acc = rhs[col];
        for k in (col + 1)..n {
            acc -= matrix[col][k] * rhs[k];
        }
        rhs[col] = acc / matrix[col][col];
    }
    Ok(())
}

/// Solve for the control points that make a curve with the given basis
/// pass through `points` at `params`. Works on homogeneous coordinates so
/// weighted sections interpolate exactly.
pub fn interpolate_homogeneous(
    points: &[DVec4],
    order: usize,
    params: &[f64],
    knots: &[f64],
) -> Result<Vec<DVec4>> {
    let n = points.len();
    if n != params.len() {
        return Err(WeftError::TypeMismatch("point and parameter counts differ"));
    }
    if n < order {
        return Err(WeftError::TypeMismatch("fewer points than order"));
    }
    let mut matrix: Vec<Vec<f64>> = params
        .iter()
        .map(|&t| basis::full_basis_row(order, knots, n, t))
        .collect();
    let mut rhs = points.to_vec();
    solve_linear(&mut matrix, &mut rhs)?;
    Ok(rhs)
}

/// Global interpolation: the clamped curve of the given order passing
/// exactly through `points`, parametrized chordally.
pub fn interpolate_points(points: &[Point3], order: usize) -> Result<Curve> {
    if points.is_empty() {
        return Err(WeftError::EmptyArgument("interpolation points"));
    }
    let params = chord_parameters(points, false);
    let knots = averaged_knots(order, &params)?;
    let hom: Vec<DVec4> = points.iter().map(|p| p.extend(1.0)).collect();
    let control = interpolate_homogeneous(&hom, order, &params, &knots)?;
    Curve::new(order, KnotType::Custom, control, Some(knots))
}

/// Closest-approach search between two curves: coarse sampling followed
/// by local bisection refinement. Returns the parameter pair and the
/// midpoint of the closest approach; errors when the curves stay farther
/// apart than `tol` allows considering them intersecting.
pub fn curve_intersection(a: &Curve, b: &Curve, tol: &Tolerance) -> Result<(f64, f64, Point3)> {
    const COARSE: usize = 32;
    let (alo, ahi) = a.domain();
    let (blo, bhi) = b.domain();

    let mut best = (alo, blo, f64::INFINITY);
    for i in 0..=COARSE {
        let s = alo + (ahi - alo) * i as f64 / COARSE as f64;
        let pa = a.point_at(s);
        for j in 0..=COARSE {
            let t = blo + (bhi - blo) * j as f64 / COARSE as f64;
            let d = pa.distance(b.point_at(t));
            if d < best.2 {
                best = (s, t, d);
            }
        }
    }

    let mut ds = (ahi - alo) / COARSE as f64;
    let mut dt = (bhi - blo) / COARSE as f64;
    let (mut s, mut t, mut dist) = best;
    for _ in 0..40 {
        let mut improved = false;
        for &(cs, ct) in &[
            (s - ds, t),
            (s + ds, t),
            (s, t - dt),
            (s, t + dt),
            (s - ds, t - dt),
            (s + ds, t + dt),
            (s - ds, t + dt),
            (s + ds, t - dt),
        ] {
            let cs = cs.clamp(alo, ahi);
            let ct = ct.clamp(blo, bhi);
            let d = a.point_at(cs).distance(b.point_at(ct));
            if d < dist {
                s = cs;
                t = ct;
                dist = d;
                improved = true;
            }
        }
        if !improved {
            ds *= 0.5;
            dt *= 0.5;
        }
        if dist < tol.linear * 1e-3 {
            break;
        }
    }

    if dist > tol.linear.max(1e-6) * 100.0 {
        return Err(WeftError::OperationFailed(format!(
            "curves do not intersect (closest approach {})",
            dist
        )));
    }
    let mid = 0.5 * (a.point_at(s) + b.point_at(t));
    Ok((s, t, mid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::dvec3;

    #[test]
    fn interpolation_passes_through_points() {
        let pts = vec![
            dvec3(0.0, 0.0, 0.0),
            dvec3(1.0, 2.0, 0.0),
            dvec3(3.0, 2.5, 1.0),
            dvec3(4.0, 0.0, 0.5),
            dvec3(5.0, -1.0, 0.0),
        ];
        let c = interpolate_points(&pts, 4).unwrap();
        let params = chord_parameters(&pts, false);
        for (p, &t) in pts.iter().zip(&params) {
            assert!(c.point_at(t).distance(*p) < 1e-9, "miss at t={}", t);
        }
    }

    #[test]
    fn interpolation_of_collinear_points_is_straight() {
        let pts: Vec<_> = (0..4).map(|i| dvec3(i as f64, 0.0, 0.0)).collect();
        let c = interpolate_points(&pts, 3).unwrap();
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!(c.point_at(t).y.abs() < 1e-10);
        }
    }

    #[test]
    fn chord_parameters_monotone() {
        let pts = vec![dvec3(0.0, 0.0, 0.0), dvec3(1.0, 0.0, 0.0), dvec3(1.0, 3.0, 0.0)];
        let p = chord_parameters(&pts, false);
        assert_eq!(p[0], 0.0);
        assert_eq!(p[2], 1.0);
        assert_relative_eq!(p[1], 0.25, epsilon = 1e-12);
        let pc = chord_parameters(&pts, true);
        assert!(pc[1] > p[1]); // centripetal compresses long chords
    }

    #[test]
    fn averaged_knots_are_clamped_and_sized() {
        let params = vec![0.0, 0.2, 0.45, 0.8, 1.0];
        let k = averaged_knots(3, &params).unwrap();
        assert_eq!(k.len(), params.len() + 3);
        assert!(crate::knots::validate(3, params.len(), &k).is_ok());
    }

    #[test]
    fn too_few_points_for_the_order_is_an_error() {
        let pts = vec![dvec3(0.0, 0.0, 0.0), dvec3(1.0, 0.0, 0.0)];
        assert!(matches!(
            interpolate_points(&pts, 4),
            Err(WeftError::TypeMismatch(_))
        ));
    }

    #[test]
    fn crossing_lines_intersect() {
        let a = Curve::from_points(&[dvec3(-1.0, 0.0, 0.0), dvec3(1.0, 0.0, 0.0)], 2).unwrap();
        let b = Curve::from_points(&[dvec3(0.3, -1.0, 0.0), dvec3(0.3, 1.0, 0.0)], 2).unwrap();
        let (s, t, p) = curve_intersection(&a, &b, &Tolerance::default_precision()).unwrap();
        assert!(p.distance(dvec3(0.3, 0.0, 0.0)) < 1e-4);
        assert!((s - 0.65).abs() < 1e-3);
        assert!((t - 0.5).abs() < 1e-3);
    }

    #[test]
    fn distant_curves_report_failure() {
        let a = Curve::from_points(&[dvec3(0.0, 0.0, 0.0), dvec3(1.0, 0.0, 0.0)], 2).unwrap();
        let b = Curve::from_points(&[dvec3(0.0, 5.0, 0.0), dvec3(1.0, 5.0, 0.0)], 2).unwrap();
        assert!(curve_intersection(&a, &b, &Tolerance::default_precision()).is_err());
    }
}
