//! Linear extrusion of a profile curve along +Z.

use weft_core::{Result, WeftError};
use weft_math::DVec4;

use crate::curve::Curve;
use crate::net::ControlNet;
use crate::patch::Patch;
use crate::KnotType;

/// Extrude `profile` by `height` along +Z. The profile becomes the U
/// axis; V is a linear two-point axis.
pub fn extrude(profile: &Curve, height: f64) -> Result<Patch> {
    if profile.is_empty() {
        return Err(WeftError::EmptyArgument("extrude profile"));
    }
    let width = profile.len();
    let mut points = Vec::with_capacity(width * 2);
    for p in &profile.control {
        points.push(*p);
        points.push(DVec4::new(p.x, p.y, p.z + height, p.w));
    }
    let net = ControlNet::new(width, 2, points)?;
    let mut patch = Patch::new(
        profile.order,
        2,
        profile.knot_type,
        KnotType::Bezier,
        net,
        Some(profile.knots.clone()),
        None,
    )?;
    patch.set_axis_type(crate::Axis::U, profile.ctype);
    patch.update_rational();
    Ok(patch)
}
