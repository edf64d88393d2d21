//! Sweeping a profile along a trajectory with rotation-minimizing
//! frames.
//!
//! Frames are accumulated incrementally, each section rotating the
//! previous frame by the axis-angle between successive trajectory
//! tangents. Recomputing from a fixed reference would flip at
//! inflections; the incremental form cannot.

use weft_core::{Result, WeftError};
use weft_math::{rotation_between, DQuat, Point3};

use crate::curve::Curve;
use crate::net::ControlNet;
use crate::patch::Patch;
use crate::{knots, Axis, AxisType, KnotType};

/// Options shared by the open and periodic sweep variants.
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Number of profile copies along the trajectory; 0 picks one per
    /// trajectory span plus the ends.
    pub sections: usize,
    /// Accumulate rotation-minimizing frames; `false` translates only.
    pub rotate: bool,
    /// Optional per-section scale: the curve's Y scales the profile's
    /// local Y, its Z the local Z.
    pub scale: Option<Curve>,
}

struct Section {
    origin: Point3,
    frame: DQuat,
    scale_yz: (f64, f64),
}

fn build_sections(trajectory: &Curve, opts: &SweepOptions, params: &[f64]) -> Vec<Section> {
    let mut frame = DQuat::IDENTITY;
    let mut prev_tangent = trajectory.tangent_at(params[0]).normalize_or_zero();
    let scale_domain = opts.scale.as_ref().map(Curve::domain);

    params
        .iter()
        .enumerate()
        .map(|(k, &t)| {
            if opts.rotate && k > 0 {
                let tangent = trajectory.tangent_at(t).normalize_or_zero();
                if tangent != weft_math::Vector3::ZERO && prev_tangent != weft_math::Vector3::ZERO {
                    frame = rotation_between(prev_tangent, tangent) * frame;
                    prev_tangent = tangent;
                }
            }
            let scale_yz = match (&opts.scale, scale_domain) {
                (Some(sc), Some((lo, hi))) => {
                    let frac = (t - params[0]) / (params[params.len() - 1] - params[0]);
                    let p = sc.point_at(lo + (hi - lo) * frac);
                    (p.y, p.z)
                }
                _ => (1.0, 1.0),
            };
            Section {
                origin: trajectory.point_at(t),
                frame,
                scale_yz,
            }
        })
        .collect()
}

fn assemble(
    profile: &Curve,
    trajectory: &Curve,
    sections: &[Section],
    uorder: usize,
    uknots: Vec<f64>,
    utype: AxisType,
) -> Result<Patch> {
    let anchor = {
        let (lo, _) = trajectory.domain();
        trajectory.point_at(lo)
    };
    let width = sections.len();
    let height = profile.len();
    let mut points = Vec::with_capacity(width * height);
    for section in sections {
        for p in &profile.control {
            let mut local = p.truncate() - anchor;
            local.y *= section.scale_yz.0;
            local.z *= section.scale_yz.1;
            let placed = section.origin + section.frame * local;
            points.push(placed.extend(p.w));
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
    patch.set_axis_type(Axis::U, utype);
    patch.set_axis_type(Axis::V, profile.ctype);
    patch.update_rational();
    Ok(patch)
}

fn section_count(trajectory: &Curve, opts: &SweepOptions) -> usize {
    if opts.sections > 0 {
        opts.sections
    } else {
        let d = knots::distinct_in_domain(trajectory.order, &trajectory.knots, trajectory.len());
        (2 * (d.len() - 1) + 1).max(trajectory.len())
    }
}

/// Sweep `profile` along `trajectory`. The trajectory direction becomes
/// U, the profile V.
pub fn sweep(profile: &Curve, trajectory: &Curve, opts: &SweepOptions) -> Result<Patch> {
    if profile.is_empty() || trajectory.is_empty() {
        return Err(WeftError::EmptyArgument("sweep input"));
    }
    let count = section_count(trajectory, opts).max(2);
    let (lo, hi) = trajectory.domain();
    let params: Vec<f64> = (0..count)
        .map(|k| lo + (hi - lo) * k as f64 / (count - 1) as f64)
        .collect();
    let sections = build_sections(trajectory, opts, &params);

    let uorder = trajectory.order.min(count);
    let uknots = knots::create(KnotType::Clamped, uorder, count)?;
    assemble(profile, trajectory, &sections, uorder, uknots, AxisType::Open)
}

/// Sweep along a closed trajectory, producing a `Periodic` U axis: the
/// first `uorder − 1` sections are copied to the end of the net and the
/// knot vector is uniform.
pub fn sweep_periodic(profile: &Curve, trajectory: &Curve, opts: &SweepOptions) -> Result<Patch> {
    if profile.is_empty() || trajectory.is_empty() {
        return Err(WeftError::EmptyArgument("sweep input"));
    }
    let count = section_count(trajectory, opts).max(3);
    let (lo, hi) = trajectory.domain();
    // no duplicated seam sample; the wrap rows below close the loop
    let params: Vec<f64> = (0..count)
        .map(|k| lo + (hi - lo) * k as f64 / count as f64)
        .collect();
    let mut sections = build_sections(trajectory, opts, &params);

    let uorder = trajectory.order.min(count);
    for k in 0..uorder - 1 {
        let src = &sections[k];
        sections.push(Section {
            origin: src.origin,
            frame: src.frame,
            scale_yz: src.scale_yz,
        });
    }
    let total = count + uorder - 1;
    let uknots = knots::create(KnotType::BSpline, uorder, total)?;
    assemble(
        profile,
        trajectory,
        &sections,
        uorder,
        uknots,
        AxisType::Periodic,
    )
}
