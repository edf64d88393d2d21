//! Skinning (lofting) a family of section curves into a patch.

use weft_core::{Result, WeftError};
use weft_math::{DVec4, Point3};

use crate::compat::{make_curves_compatible, CompatLevel};
use crate::curve::Curve;
use crate::interpolate;
use crate::net::ControlNet;
use crate::patch::Patch;
use crate::{knots, refine, Axis, KnotType};

/// Cross-direction section parameters: centripetal chord lengths between
/// corresponding control points, averaged over all columns.
fn section_parameters(curves: &[Curve]) -> Vec<f64> {
    let n = curves.len();
    let m = curves[0].len();
    let mut params = vec![0.0; n];
    for j in 0..m {
        let column: Vec<Point3> = curves.iter().map(|c| c.control[j].truncate()).collect();
        let p = interpolate::chord_parameters(&column, true);
        for (acc, v) in params.iter_mut().zip(p) {
            *acc += v;
        }
    }
    for p in params.iter_mut() {
        *p /= m as f64;
    }
    params
}

fn uniform_parameters(n: usize) -> Vec<f64> {
    (0..n).map(|k| k as f64 / (n - 1) as f64).collect()
}

/// Skin the sections along V: each curve becomes one v-level of the net.
///
/// The family is first driven to a common basis. `KnotType::Custom`
/// derives the v knot vector from a centripetal parametrization of the
/// sections (knot averaging); other types use their fabricated vector.
/// With `interpolate` (and `order > 2`) an exact through-interpolation
/// pass replaces proximity: the surface evaluates to each section curve
/// at its parameter.
pub fn skin_v(
    curves: &[Curve],
    order: usize,
    knot_type: KnotType,
    interpolate: bool,
) -> Result<Patch> {
    if curves.is_empty() {
        return Err(WeftError::EmptyArgument("skin sections"));
    }
    if curves.len() < order {
        return Err(WeftError::TypeMismatch("fewer sections than skin order"));
    }
    let mut sections = curves.to_vec();
    make_curves_compatible(&mut sections, CompatLevel::Knots)?;

    let n = sections.len();
    let m = sections[0].len();
    let (params, vknots) = match knot_type {
        KnotType::Custom => {
            let params = section_parameters(&sections);
            let vknots = interpolate::averaged_knots(order, &params)?;
            (params, vknots)
        }
        other => (uniform_parameters(n), knots::create(other, order, n)?),
    };

    let mut points = Vec::with_capacity(m * n);
    for i in 0..m {
        for section in &sections {
            points.push(section.control[i]);
        }
    }
    let mut net = ControlNet::new(m, n, points)?;

    if interpolate && order > 2 {
        for i in 0..m {
            let line = refine::to_homogeneous(&net.line(Axis::V, i));
            let solved = interpolate::interpolate_homogeneous(&line, order, &params, &vknots)?;
            net.set_line(Axis::V, i, &refine::from_homogeneous(&solved));
        }
    }

    let reference = &sections[0];
    let mut patch = Patch::new(
        reference.order,
        order,
        reference.knot_type,
        knots::classify(order, &vknots),
        net,
        Some(reference.knots.clone()),
        Some(vknots),
    )?;
    patch.update_rational();
    Ok(patch)
}

/// Skin the sections along U; the transpose of [`skin_v`].
pub fn skin_u(
    curves: &[Curve],
    order: usize,
    knot_type: KnotType,
    interpolate: bool,
) -> Result<Patch> {
    let mut patch = skin_v(curves, order, knot_type, interpolate)?;
    patch.swap_uv();
    Ok(patch)
}

/// Bidirectional skin: the V-skin of `cu` and the U-skin of `cv`, driven
/// to a common basis on both axes and averaged pointwise.
pub fn dual_skin(cu: &[Curve], cv: &[Curve], order: usize) -> Result<Patch> {
    let a = skin_v(cu, order.min(cu.len()), KnotType::Custom, true)?;
    let b = skin_u(cv, order.min(cv.len()), KnotType::Custom, true)?;

    let mut pair = [a, b];
    crate::compat::make_patches_compatible(&mut pair, Axis::U, CompatLevel::Knots)?;
    crate::compat::make_patches_compatible(&mut pair, Axis::V, CompatLevel::Knots)?;
    let [mut a, b] = pair;

    for (p, q) in a.net.points.iter_mut().zip(&b.net.points) {
        *p = 0.5 * (*p + *q);
    }
    a.update_rational();
    a.invalidate_caches();
    Ok(a)
}
