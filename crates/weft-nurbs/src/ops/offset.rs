//! Offsetting a patch along its estimated control-point normals.

use weft_core::{Result, WeftError};
use weft_math::Vector3;

use crate::patch::Patch;
use crate::topology;
use weft_core::Tolerance;

/// Move every control point along its estimated normal by `distance`.
///
/// Points whose neighborhood cannot produce a normal get a wider
/// neighbor search; if that also fails (an isolated pole) the point is
/// left unchanged.
pub fn offset(patch: &Patch, distance: f64, tol: &Tolerance) -> Result<Patch> {
    if patch.net.points.is_empty() {
        return Err(WeftError::EmptyArgument("offset patch"));
    }
    let mut out = patch.clone();
    for i in 0..patch.width() {
        for j in 0..patch.height() {
            let mut n = topology::control_normal(patch, i, j, tol);
            if n == Vector3::ZERO {
                n = topology::control_normal_search(patch, i, j, 3, tol);
            }
            if n == Vector3::ZERO {
                continue;
            }
            let p = patch.net.get(i, j);
            let moved = p.truncate() + n * distance;
            out.net.set(i, j, moved.extend(p.w));
        }
    }
    out.invalidate_caches();
    Ok(out)
}
