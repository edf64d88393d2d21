//! Concatenating a row of patches into one, optionally bridging gaps
//! with fillets or set-backs first.
//!
//! The patches are broken into cross-section curves along the orthogonal
//! axis, the family is driven to a common basis, and one patch is
//! rebuilt. `KnotType::Custom` synthesizes a per-segment knot vector
//! (segment `s` spans `[s, s + 1]`, junction knots at multiplicity
//! `order − 1`) so the result interpolates every original patch
//! boundary; attached trim loops are copied and rescaled into the new
//! parameter space in visitation order, the first patch defining the
//! origin and later segments offset by the cumulative span length, the
//! whole band then mapped onto the result's v-domain.

use weft_core::{Result, Tolerance, WeftError};
use weft_math::DVec4;

use crate::compat::{make_curves_compatible, CompatLevel};
use crate::curve::Curve;
use crate::net::ControlNet;
use crate::ops::fillet::{fill_gap, set_back, BorderPick};
use crate::patch::Patch;
use crate::{knots, Axis, AxisType, KnotType};

/// How to treat gaps between consecutive patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilletKind {
    /// Gaps must already coincide (within tolerance they are averaged).
    #[default]
    None,
    /// Insert a degree-4 blend patch into each gap.
    Blend,
    /// Nudge both borders toward each other instead of adding material.
    SetBack,
}

#[derive(Debug, Clone)]
pub struct ConcatOptions {
    /// Axis along which the patches are stacked.
    pub axis: Axis,
    /// Closedness of the result along that axis.
    pub target: AxisType,
    /// Order along the concatenation axis; `None` keeps the maximum
    /// found among the inputs.
    pub order: Option<usize>,
    /// Knot type of the result along the concatenation axis.
    pub knot_type: KnotType,
    pub fillet: FilletKind,
    /// Tangent length for fillets/set-backs (negative = fraction of the
    /// gap).
    pub fillet_len: f64,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self {
            axis: Axis::V,
            target: AxisType::Open,
            order: None,
            knot_type: KnotType::Custom,
            fillet: FilletKind::None,
            fillet_len: -0.25,
        }
    }
}

/// One segment broken out of the input row: its cross-section curves and
/// whether it carries trim loops from an original input.
struct Segment {
    sections: Vec<Curve>,
    vknots: Vec<f64>,
    trims: Vec<Vec<Curve>>,
}

fn break_into_sections(patch: &Patch) -> Segment {
    let sections = (0..patch.height())
        .map(|j| Curve {
            order: patch.uorder,
            knot_type: patch.uknot_type,
            ctype: patch.utype,
            is_rational: patch.is_rational,
            knots: patch.uknots.clone(),
            control: patch.net.line(Axis::U, j),
        })
        .collect();
    Segment {
        sections,
        vknots: patch.vknots.clone(),
        trims: patch.trim_loops.clone(),
    }
}

/// Concatenate `inputs` into a single patch.
pub fn concat_patches(inputs: &[Patch], opts: &ConcatOptions, tol: &Tolerance) -> Result<Patch> {
    if inputs.is_empty() {
        return Err(WeftError::EmptyArgument("concat patches"));
    }
    let mut work: Vec<Patch> = inputs.to_vec();
    if opts.axis == Axis::U {
        for p in &mut work {
            p.swap_uv();
        }
    }
    if work.len() == 1 {
        let mut only = work.pop().unwrap();
        if opts.axis == Axis::U {
            only.swap_uv();
        }
        return Ok(only);
    }

    for p in &mut work {
        p.clamp(Axis::V)?;
        p.rescale_domain(Axis::V, 0.0, 1.0);
    }

    // bridge the gaps; a set-back retreats both borders first and then
    // blends across the widened gap
    if opts.fillet != FilletKind::None {
        if opts.fillet == FilletKind::SetBack {
            for k in 0..work.len() - 1 {
                let (head, tail) = work.split_at_mut(k + 1);
                set_back(
                    &mut head[k],
                    BorderPick::VEnd,
                    &mut tail[0],
                    BorderPick::VStart,
                    opts.fillet_len,
                )?;
            }
        }
        let mut bridged: Vec<Patch> = Vec::with_capacity(work.len() * 2 - 1);
        for p in &work {
            if let Some(prev) = bridged.last() {
                if let Some(mut f) =
                    fill_gap(prev, BorderPick::VEnd, p, BorderPick::VStart, opts.fillet_len, tol)?
                {
                    f.rescale_domain(Axis::V, 0.0, 1.0);
                    bridged.push(f);
                }
            }
            bridged.push(p.clone());
        }
        work = bridged;
    }

    // common order along the concatenation axis
    let vorder = opts
        .order
        .unwrap_or_else(|| work.iter().map(|p| p.vorder).max().unwrap());
    for p in &mut work {
        if p.vorder > vorder {
            return Err(WeftError::TypeMismatch(
                "concat target order below an input's order",
            ));
        }
        let t = vorder - p.vorder;
        p.elevate(Axis::V, t)?;
    }

    // break out the cross-section family and make it compatible
    let segments: Vec<Segment> = work.iter().map(break_into_sections).collect();
    let seg_heights: Vec<usize> = segments.iter().map(|s| s.sections.len()).collect();
    let mut family: Vec<Curve> = segments.iter().flat_map(|s| s.sections.clone()).collect();
    make_curves_compatible(&mut family, CompatLevel::Knots)?;

    // reassemble rows, merging each junction into one shared row
    let mut rows: Vec<Vec<DVec4>> = Vec::new();
    let mut cursor = 0;
    for (k, &h) in seg_heights.iter().enumerate() {
        for j in 0..h {
            let row = family[cursor + j].control.clone();
            if k > 0 && j == 0 {
                let last = rows.last_mut().unwrap();
                let max_gap = last
                    .iter()
                    .zip(&row)
                    .map(|(a, b)| a.truncate().distance(b.truncate()))
                    .fold(0.0, f64::max);
                if max_gap > tol.linear * 1e3 {
                    return Err(WeftError::OperationFailed(format!(
                        "concat: junction {} gap {} too wide; use a fillet",
                        k, max_gap
                    )));
                }
                for (a, b) in last.iter_mut().zip(&row) {
                    *a = 0.5 * (*a + *b);
                }
            } else {
                rows.push(row);
            }
        }
        cursor += h;
    }

    // per-segment knot vector: segment s spans [s, s+1], junctions at
    // multiplicity order-1
    let mut vknots: Vec<f64> = Vec::new();
    for (s, segment) in segments.iter().enumerate() {
        let shifted: Vec<f64> = segment.vknots.iter().map(|&k| k + s as f64).collect();
        if s == 0 {
            vknots = shifted;
        } else {
            // drop one junction copy, leaving it at multiplicity order-1
            vknots.truncate(vknots.len() - 1);
            vknots.extend_from_slice(&shifted[vorder..]);
        }
    }

    // closed / periodic wrap rows
    let mut vtype = AxisType::Open;
    match opts.target {
        AxisType::Open => {}
        AxisType::Closed => {
            rows.push(rows[0].clone());
            vtype = AxisType::Closed;
        }
        AxisType::Periodic => {
            for j in 0..vorder - 1 {
                rows.push(rows[j].clone());
            }
            vtype = AxisType::Periodic;
        }
    }
    let height = rows.len();

    let vknots = match (opts.knot_type, opts.target) {
        (KnotType::Custom, AxisType::Open) => vknots,
        (_, AxisType::Periodic) => knots::create(KnotType::BSpline, vorder, height)?,
        (KnotType::Custom, AxisType::Closed) => knots::create(KnotType::Clamped, vorder, height)?,
        (other, _) => knots::create(other, vorder, height)?,
    };
    knots::validate(vorder, height, &vknots)?;

    // rebuild the net from the rows
    let reference = &family[0];
    let width = reference.len();
    let mut points = vec![DVec4::ZERO; width * height];
    for (j, row) in rows.iter().enumerate() {
        for (i, &p) in row.iter().enumerate() {
            points[i * height + j] = p;
        }
    }
    let net = ControlNet::new(width, height, points)?;
    let mut out = Patch::new(
        reference.order,
        vorder,
        reference.knot_type,
        knots::classify(vorder, &vknots),
        net,
        Some(reference.knots.clone()),
        Some(vknots),
    )?;
    out.set_axis_type(Axis::V, vtype);

    // carry trim loops: offset by segment position in visitation order,
    // then map the per-segment band [0, K] onto the result's v-domain
    // (the identity for the Custom per-segment knot vector, a rescale
    // for fabricated Clamped/BSpline vectors living on [0, 1])
    let (vlo, vhi) = out.domain(Axis::V);
    let band = segments.len() as f64;
    for (s, segment) in segments.iter().enumerate() {
        for tloop in &segment.trims {
            let moved = tloop
                .iter()
                .map(|c| {
                    let mut c = c.clone();
                    for p in &mut c.control {
                        p.y = vlo + (p.y + s as f64) * (vhi - vlo) / band;
                    }
                    c
                })
                .collect();
            out.attach_trim_loop(moved);
        }
    }

    out.update_rational();
    if opts.axis == Axis::U {
        out.swap_uv();
    }
    Ok(out)
}
