//! End-to-end scenarios for the construction operators.

use approx::assert_relative_eq;
use glam::{dvec3, DVec4};
use weft_core::Tolerance;
use weft_nurbs::ops::{extrude, gordon, revolve, skin_v};
use weft_nurbs::{interpolate, topology, Axis, Curve, KnotType};

/// Exact rational half circle of radius 1 in the xz plane, from the
/// south pole through (1, 0, 0) to the north pole.
fn half_circle_xz() -> Curve {
    let w = std::f64::consts::FRAC_1_SQRT_2;
    let control = vec![
        DVec4::new(0.0, 0.0, -1.0, 1.0),
        DVec4::new(1.0, 0.0, -1.0, w),
        DVec4::new(1.0, 0.0, 0.0, 1.0),
        DVec4::new(1.0, 0.0, 1.0, w),
        DVec4::new(0.0, 0.0, 1.0, 1.0),
    ];
    let knots = vec![0.0, 0.0, 0.0, 0.5, 0.5, 1.0, 1.0, 1.0];
    Curve::new(3, KnotType::Custom, control, Some(knots)).unwrap()
}

#[test]
fn revolved_half_circle_is_the_unit_sphere() {
    let profile = half_circle_xz();
    let sphere = revolve(&profile, 360.0, 0, 3).unwrap();

    let (ulo, uhi) = sphere.domain(Axis::U);
    let (vlo, vhi) = sphere.domain(Axis::V);
    for iu in 0..=12 {
        for iv in 0..=12 {
            let u = ulo + (uhi - ulo) * iu as f64 / 12.0;
            let v = vlo + (vhi - vlo) * iv as f64 / 12.0;
            let p = sphere.point_at(u, v);
            assert_relative_eq!(p.length(), 1.0, epsilon = 1e-9);
        }
    }
    assert!(topology::is_closed(&sphere, Axis::U, &Tolerance::default_precision()));
    assert!(sphere.is_rational);
}

#[test]
fn half_revolution_stays_open() {
    let profile = half_circle_xz();
    let bowl = revolve(&profile, 180.0, 0, 3).unwrap();
    assert!(!topology::is_closed(&bowl, Axis::U, &Tolerance::default_precision()));

    // points still sit on the unit sphere over the half arc
    let (ulo, uhi) = bowl.domain(Axis::U);
    let p = bowl.point_at(0.5 * (ulo + uhi), 0.5);
    assert_relative_eq!(p.length(), 1.0, epsilon = 1e-9);
}

#[test]
fn skin_interpolates_stacked_square_sections() {
    let square = |z: f64| {
        let pts = [
            dvec3(0.0, 0.0, z),
            dvec3(1.0, 0.0, z),
            dvec3(1.0, 1.0, z),
            dvec3(0.0, 1.0, z),
            dvec3(0.0, 0.0, z),
        ];
        Curve::from_points(&pts, 2).unwrap()
    };
    let sections = [square(0.0), square(1.0), square(2.0)];
    let patch = skin_v(&sections, 3, KnotType::Custom, true).unwrap();

    // equally spaced sections land at v = 0, 0.5, 1 and the surface
    // passes through each of them exactly
    for (section, v) in sections.iter().zip([0.0, 0.5, 1.0]) {
        for i in 0..=10 {
            let u = i as f64 / 10.0;
            let d = patch.point_at(u, v).distance(section.point_at(u));
            assert!(d < 1e-9, "{} off section at (u = {}, v = {})", d, u, v);
        }
    }
}

#[test]
fn gordon_coons_patch_matches_the_bilinear_blend() {
    let c00 = dvec3(0.0, 0.0, 1.0);
    let c10 = dvec3(3.0, 0.0, 0.0);
    let c01 = dvec3(0.0, 2.0, 0.0);
    let c11 = dvec3(3.0, 2.0, 2.0);
    let line = |a, b| Curve::from_points(&[a, b], 2).unwrap();
    let cu = [line(c00, c10), line(c01, c11)];
    let cv = [line(c00, c01), line(c10, c11)];
    let patch = gordon(&cu, &cv, None).unwrap();

    let bilinear = |u: f64, v: f64| {
        (1.0 - u) * (1.0 - v) * c00
            + u * (1.0 - v) * c10
            + (1.0 - u) * v * c01
            + u * v * c11
    };
    for iu in 0..=8 {
        for iv in 0..=8 {
            let (u, v) = (iu as f64 / 8.0, iv as f64 / 8.0);
            let d = patch.point_at(u, v).distance(bilinear(u, v));
            assert!(d < 1e-3, "{} off bilinear at ({}, {})", d, u, v);
        }
    }
}

#[test]
fn extrusion_translates_the_profile() {
    let pts: Vec<glam::DVec3> = (0..6)
        .map(|i| {
            let x = i as f64 / 5.0;
            dvec3(x, (x * 3.0).sin() * 0.2, 0.0)
        })
        .collect();
    let profile = interpolate::interpolate_points(&pts, 4).unwrap();
    let patch = extrude(&profile, 2.5).unwrap();

    let (ulo, uhi) = patch.domain(Axis::U);
    for i in 0..=10 {
        let u = ulo + (uhi - ulo) * i as f64 / 10.0;
        let base = profile.point_at(u);
        assert!(patch.point_at(u, 0.0).distance(base) < 1e-10);
        assert!(patch.point_at(u, 1.0).distance(base + dvec3(0.0, 0.0, 2.5)) < 1e-10);
        // ruling is linear in v
        assert!(patch.point_at(u, 0.4).distance(base + dvec3(0.0, 0.0, 1.0)) < 1e-10);
    }
}
