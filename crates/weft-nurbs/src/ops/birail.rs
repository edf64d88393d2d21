//! Two-rail sweeps: the frame comes from the inter-rail vector at each
//! section instead of a single trajectory tangent, and the profile is
//! scaled by the current inter-rail distance relative to the first
//! section's.

use weft_core::{Result, WeftError};
use weft_math::{rotation_between, DQuat, Point3};

use crate::compat::{make_curves_compatible, CompatLevel};
use crate::curve::Curve;
use crate::net::ControlNet;
use crate::patch::Patch;
use crate::{knots, Axis, AxisType, KnotType};

struct RailSection {
    anchor: Point3,
    frame: DQuat,
    scale: f64,
}

fn rail_sections(rail1: &Curve, rail2: &Curve, count: usize) -> Result<Vec<RailSection>> {
    let (lo1, hi1) = rail1.domain();
    let (lo2, hi2) = rail2.domain();

    let mut sections = Vec::with_capacity(count);
    let mut frame = DQuat::IDENTITY;
    let mut prev_dir = weft_math::Vector3::ZERO;
    let mut reference_len = 0.0;

    for k in 0..count {
        let frac = k as f64 / (count - 1) as f64;
        let r1 = rail1.point_at(lo1 + (hi1 - lo1) * frac);
        let r2 = rail2.point_at(lo2 + (hi2 - lo2) * frac);
        let span = r2 - r1;
        let len = span.length();
        if len < 1e-12 {
            return Err(WeftError::OperationFailed(format!(
                "birail: rails touch at section {}",
                k
            )));
        }
        let dir = span / len;
        if k == 0 {
            reference_len = len;
            prev_dir = dir;
        } else {
            frame = rotation_between(prev_dir, dir) * frame;
            prev_dir = dir;
        }
        sections.push(RailSection {
            anchor: r1,
            frame,
            scale: len / reference_len,
        });
    }
    Ok(sections)
}

fn assemble(
    profiles: &[Vec<weft_math::DVec4>],
    vorder: usize,
    vknot_type: KnotType,
    vknots: Vec<f64>,
    rail1: &Curve,
    sections: Vec<RailSection>,
    periodic: bool,
) -> Result<Patch> {
    let anchor0 = sections[0].anchor;
    let height = profiles[0].len();
    let count = sections.len();

    let mut rows: Vec<Vec<weft_math::DVec4>> = Vec::with_capacity(count);
    for (section, profile) in sections.iter().zip(profiles) {
        let row = profile
            .iter()
            .map(|p| {
                let local = (p.truncate() - anchor0) * section.scale;
                (section.anchor + section.frame * local).extend(p.w)
            })
            .collect();
        rows.push(row);
    }

    let uorder = rail1.order.min(count);
    let (uknots, utype) = if periodic {
        for k in 0..uorder - 1 {
            let row = rows[k].clone();
            rows.push(row);
        }
        (
            knots::create(KnotType::BSpline, uorder, count + uorder - 1)?,
            AxisType::Periodic,
        )
    } else {
        (
            knots::create(KnotType::Clamped, uorder, count)?,
            AxisType::Open,
        )
    };

    let width = rows.len();
    let points = {
        let mut pts = vec![weft_math::DVec4::ZERO; width * height];
        for (i, row) in rows.iter().enumerate() {
            for (j, &p) in row.iter().enumerate() {
                pts[i * height + j] = p;
            }
        }
        pts
    };
    let net = ControlNet::new(width, height, points)?;
    let mut patch = Patch::new(
        uorder,
        vorder,
        knots::classify(uorder, &uknots),
        vknot_type,
        net,
        Some(uknots),
        Some(vknots),
    )?;
    patch.set_axis_type(Axis::U, utype);
    patch.update_rational();
    Ok(patch)
}

/// Sweep one cross-section between two rails.
pub fn birail1(
    profile: &Curve,
    rail1: &Curve,
    rail2: &Curve,
    section_count: usize,
) -> Result<Patch> {
    if profile.is_empty() || rail1.is_empty() || rail2.is_empty() {
        return Err(WeftError::EmptyArgument("birail input"));
    }
    let count = section_count.max(2);
    let sections = rail_sections(rail1, rail2, count)?;
    let profiles = vec![profile.control.clone(); count];
    assemble(
        &profiles,
        profile.order,
        profile.knot_type,
        profile.knots.clone(),
        rail1,
        sections,
        false,
    )
}

/// [`birail1`] over closed rails, producing a `Periodic` U axis.
pub fn birail1_periodic(
    profile: &Curve,
    rail1: &Curve,
    rail2: &Curve,
    section_count: usize,
) -> Result<Patch> {
    if profile.is_empty() || rail1.is_empty() || rail2.is_empty() {
        return Err(WeftError::EmptyArgument("birail input"));
    }
    let count = section_count.max(3);
    let sections = rail_sections(rail1, rail2, count)?;
    let profiles = vec![profile.control.clone(); count];
    assemble(
        &profiles,
        profile.order,
        profile.knot_type,
        profile.knots.clone(),
        rail1,
        sections,
        true,
    )
}

/// Two-rail sweep blending between two cross-sections along the sweep,
/// linearly or via `blend` (whose Y at the section fraction gives the
/// second profile's share).
pub fn birail2(
    profile1: &Curve,
    profile2: &Curve,
    rail1: &Curve,
    rail2: &Curve,
    section_count: usize,
    blend: Option<&Curve>,
) -> Result<Patch> {
    if profile1.is_empty() || profile2.is_empty() || rail1.is_empty() || rail2.is_empty() {
        return Err(WeftError::EmptyArgument("birail input"));
    }
    let mut pair = vec![profile1.clone(), profile2.clone()];
    make_curves_compatible(&mut pair, CompatLevel::Knots)?;
    let (p1, p2) = (&pair[0], &pair[1]);

    let count = section_count.max(2);
    let sections = rail_sections(rail1, rail2, count)?;

    let blend_domain = blend.map(Curve::domain);
    let profiles: Vec<Vec<weft_math::DVec4>> = (0..count)
        .map(|k| {
            let frac = k as f64 / (count - 1) as f64;
            let s = match (blend, blend_domain) {
                (Some(b), Some((lo, hi))) => b.point_at(lo + (hi - lo) * frac).y.clamp(0.0, 1.0),
                _ => frac,
            };
            p1.control
                .iter()
                .zip(&p2.control)
                .map(|(a, b)| a.lerp(*b, s))
                .collect()
        })
        .collect();

    assemble(
        &profiles,
        p1.order,
        p1.knot_type,
        p1.knots.clone(),
        rail1,
        sections,
        false,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;

    fn line(a: weft_math::Point3, b: weft_math::Point3) -> Curve {
        Curve::from_points(&[a, b], 2).unwrap()
    }

    #[test]
    fn parallel_rails_translate_the_profile() {
        let rail1 = line(dvec3(0.0, 0.0, 0.0), dvec3(4.0, 0.0, 0.0));
        let rail2 = line(dvec3(0.0, 1.0, 0.0), dvec3(4.0, 1.0, 0.0));
        let profile = line(dvec3(0.0, 0.0, 0.0), dvec3(0.0, 1.0, 0.0));
        let patch = birail1(&profile, &rail1, &rail2, 5).unwrap();
        for i in 0..=4 {
            let u = i as f64 / 4.0;
            assert!(patch.point_at(u, 0.0).distance(dvec3(4.0 * u, 0.0, 0.0)) < 1e-10);
            assert!(patch.point_at(u, 1.0).distance(dvec3(4.0 * u, 1.0, 0.0)) < 1e-10);
        }
    }

    #[test]
    fn diverging_rails_scale_the_profile() {
        let rail1 = line(dvec3(0.0, 0.0, 0.0), dvec3(4.0, 0.0, 0.0));
        // second rail pulls away linearly: gap 1 -> 3
        let rail2 = line(dvec3(0.0, 1.0, 0.0), dvec3(4.0, 3.0, 0.0));
        let profile = line(dvec3(0.0, 0.0, 0.0), dvec3(0.0, 1.0, 0.0));
        let patch = birail1(&profile, &rail1, &rail2, 9).unwrap();
        // the profile's far end tracks the second rail
        assert!(patch.point_at(1.0, 1.0).distance(dvec3(4.0, 3.0, 0.0)) < 1e-9);
        assert!(patch.point_at(1.0, 0.0).distance(dvec3(4.0, 0.0, 0.0)) < 1e-9);
    }

    #[test]
    fn touching_rails_are_rejected() {
        let rail1 = line(dvec3(0.0, 0.0, 0.0), dvec3(4.0, 0.0, 0.0));
        let rail2 = line(dvec3(0.0, 1.0, 0.0), dvec3(4.0, 0.0, 0.0));
        let profile = line(dvec3(0.0, 0.0, 0.0), dvec3(0.0, 1.0, 0.0));
        assert!(birail1(&profile, &rail1, &rail2, 5).is_err());
    }

    #[test]
    fn birail2_blends_cross_sections() {
        let rail1 = line(dvec3(0.0, 0.0, 0.0), dvec3(2.0, 0.0, 0.0));
        let rail2 = line(dvec3(0.0, 1.0, 0.0), dvec3(2.0, 1.0, 0.0));
        let flat = line(dvec3(0.0, 0.0, 0.0), dvec3(0.0, 1.0, 0.0));
        let bent = Curve::from_points(
            &[dvec3(0.0, 0.0, 0.0), dvec3(0.0, 0.5, 1.0), dvec3(0.0, 1.0, 0.0)],
            3,
        )
        .unwrap();
        let patch = birail2(&flat, &bent, &rail1, &rail2, 5, None).unwrap();
        // start is the flat section, end bulges like the bent one
        assert!(patch.point_at(0.0, 0.5).z.abs() < 1e-10);
        assert!(patch.point_at(1.0, 0.5).z > 0.3);
    }

    #[test]
    fn periodic_birail_wraps_rows() {
        let (c1, k1) = crate::ops::revolve::unit_arc(360.0).unwrap();
        let rail1 = Curve::new(3, KnotType::Custom, c1, Some(k1)).unwrap();
        let mut rail2 = rail1.clone();
        rail2.transform(&weft_math::Transform::from_translation(dvec3(0.0, 0.0, 1.0)));
        let profile = line(dvec3(1.0, 0.0, 0.0), dvec3(1.0, 0.0, 1.0));
        let patch = birail1_periodic(&profile, &rail1, &rail2, 8).unwrap();
        assert_eq!(patch.utype, AxisType::Periodic);
        assert_eq!(patch.width(), 8 + patch.uorder - 1);
    }
}
