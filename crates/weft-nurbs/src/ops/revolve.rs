//! Surfaces of revolution and swung surfaces about the Z axis.

use weft_core::{Result, WeftError};
use weft_math::DVec4;

use crate::curve::Curve;
use crate::net::ControlNet;
use crate::patch::Patch;
use crate::{knots, Axis, AxisType, KnotType};

/// Control points, weights and knot vector of an exact rational arc of
/// `arc_deg` degrees on the unit circle, starting at angle 0. Quadratic,
/// one 90°-or-less Bezier segment per quarter.
pub(crate) fn unit_arc(arc_deg: f64) -> Result<(Vec<DVec4>, Vec<f64>)> {
    if arc_deg <= 0.0 || arc_deg > 360.0 {
        return Err(WeftError::OperationFailed(format!(
            "arc of {} degrees not in (0, 360]",
            arc_deg
        )));
    }
    let narcs = (arc_deg / 90.0).ceil() as usize;
    let dtheta = arc_deg.to_radians() / narcs as f64;
    let wm = (0.5 * dtheta).cos();

    let mut control = Vec::with_capacity(2 * narcs + 1);
    control.push(DVec4::new(1.0, 0.0, 0.0, 1.0));
    for seg in 0..narcs {
        let mid = (seg as f64 + 0.5) * dtheta;
        let end = (seg + 1) as f64 * dtheta;
        // premultiplied form would place the midpoint on the bisector at
        // radius 1/cos(dtheta/2); stored non-premultiplied that is just
        // the tangent intersection with its weight
        let r = 1.0 / wm;
        control.push(DVec4::new(r * mid.cos(), r * mid.sin(), 0.0, wm));
        control.push(DVec4::new(end.cos(), end.sin(), 0.0, 1.0));
    }

    let mut knot_data = vec![0.0; 3];
    for seg in 1..narcs {
        let v = seg as f64 / narcs as f64;
        knot_data.push(v);
        knot_data.push(v);
    }
    knot_data.extend(std::iter::repeat(1.0).take(3));
    Ok((control, knot_data))
}

/// Closed uniform B-spline approximation of the unit arc with `sections`
/// control points, used for the non-rational variant.
fn polygon_arc(arc_deg: f64, sections: usize, order: usize) -> Result<(Vec<DVec4>, Vec<f64>)> {
    if sections < order {
        return Err(WeftError::TypeMismatch(
            "revolve: fewer sections than profile order",
        ));
    }
    let full = (arc_deg - 360.0).abs() < 1e-9;
    let count = if full { sections + 1 } else { sections };
    let step = arc_deg.to_radians() / (count - 1) as f64;
    // circumscribe so the spline hugs the circle rather than cutting it
    let r = 1.0 / (0.5 * step).cos();
    let control: Vec<DVec4> = (0..count)
        .map(|i| {
            let theta = i as f64 * step;
            DVec4::new(r * theta.cos(), r * theta.sin(), 0.0, 1.0)
        })
        .collect();
    let knot_data = knots::create(KnotType::Clamped, order, count)?;
    Ok((control, knot_data))
}

/// Revolve `profile` about the Z axis by `arc_deg` degrees.
///
/// The profile is read in its XZ plane: each control point contributes
/// its distance from the axis as radius and keeps its height and weight.
/// `sections == 0` produces the exact rational arc; `sections > 0` a
/// non-rational uniform approximation with that many sections. A full
/// 360° revolution gets `utype = Closed`.
pub fn revolve(profile: &Curve, arc_deg: f64, sections: usize, order: usize) -> Result<Patch> {
    if profile.is_empty() {
        return Err(WeftError::EmptyArgument("revolve profile"));
    }
    let (circle, uknots) = if sections == 0 {
        unit_arc(arc_deg)?
    } else {
        polygon_arc(arc_deg, sections, order)?
    };
    let uorder = if sections == 0 { 3 } else { order };
    let full = (arc_deg - 360.0).abs() < 1e-9;

    let width = circle.len();
    let height = profile.len();
    let mut points = Vec::with_capacity(width * height);
    for q in &circle {
        for p in &profile.control {
            // radius and start angle from the profile point's XY offset
            let radius = p.truncate().truncate().length();
            let theta = p.y.atan2(p.x);
            let (sin_t, cos_t) = theta.sin_cos();
            let x = radius * (q.x * cos_t - q.y * sin_t);
            let y = radius * (q.x * sin_t + q.y * cos_t);
            points.push(DVec4::new(x, y, p.z, q.w * p.w));
        }
    }

    let net = ControlNet::new(width, height, points)?;
    let mut patch = Patch::new(
        uorder,
        profile.order,
        knots::classify(uorder, &uknots),
        profile.knot_type,
        net,
        Some(uknots),
        Some(profile.knots.clone()),
    )?;
    if full {
        patch.set_axis_type(Axis::U, AxisType::Closed);
    }
    patch.update_rational();
    Ok(patch)
}

/// Swing `profile` (read in XZ) around the Z axis, guided by the XY
/// `trajectory`: the trajectory point scales the profile's radius in its
/// own direction, weights multiply.
pub fn swing(profile: &Curve, trajectory: &Curve) -> Result<Patch> {
    if profile.is_empty() || trajectory.is_empty() {
        return Err(WeftError::EmptyArgument("swing input"));
    }
    let width = trajectory.len();
    let height = profile.len();
    let mut points = Vec::with_capacity(width * height);
    for t in &trajectory.control {
        for p in &profile.control {
            points.push(DVec4::new(t.x * p.x, t.y * p.x, p.z, t.w * p.w));
        }
    }
    let net = ControlNet::new(width, height, points)?;
    let mut patch = Patch::new(
        trajectory.order,
        profile.order,
        trajectory.knot_type,
        profile.knot_type,
        net,
        Some(trajectory.knots.clone()),
        Some(profile.knots.clone()),
    )?;
    patch.update_rational();
    Ok(patch)
}
