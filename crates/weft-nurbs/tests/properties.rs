//! Structural properties of the knot algebra: operations that must not
//! move the surface, and operations that must undo each other exactly.

use glam::DVec4;
use weft_core::Tolerance;
use weft_nurbs::ops::{concat_patches, ConcatOptions};
use weft_nurbs::{split, Axis, ControlNet, Patch};

/// A 4×5 bicubic-ish patch with an uneven bump so symmetry cannot hide
/// an indexing mistake.
fn bumpy_patch() -> Patch {
    let points = (0..4)
        .flat_map(|i| {
            (0..5).map(move |j| {
                let z = ((i * 7 + j * 3) % 5) as f64 * 0.25;
                DVec4::new(i as f64, j as f64 * 0.8, z, 1.0)
            })
        })
        .collect();
    let net = ControlNet::new(4, 5, points).unwrap();
    Patch::with_default_knots(3, 3, net).unwrap()
}

fn sample_grid(patch: &Patch, n: usize) -> Vec<glam::DVec3> {
    let (ulo, uhi) = patch.domain(Axis::U);
    let (vlo, vhi) = patch.domain(Axis::V);
    let mut out = Vec::with_capacity((n + 1) * (n + 1));
    for iu in 0..=n {
        for iv in 0..=n {
            let u = ulo + (uhi - ulo) * iu as f64 / n as f64;
            let v = vlo + (vhi - vlo) * iv as f64 / n as f64;
            out.push(patch.point_at(u, v));
        }
    }
    out
}

fn assert_same_shape(a: &Patch, b: &Patch, tol: f64) {
    for (p, q) in sample_grid(a, 8).iter().zip(sample_grid(b, 8)) {
        assert!(p.distance(q) < tol, "{} away: {:?} vs {:?}", p.distance(q), p, q);
    }
}

#[test]
fn knot_insertion_does_not_move_the_surface() {
    let original = bumpy_patch();
    let mut refined = original.clone();
    refined.insert_knot(Axis::U, 0.37, 1).unwrap();
    refined.insert_knot(Axis::V, 0.61, 2).unwrap();
    refined.refine_knots(Axis::U, Some(&[0.1, 0.1, 0.9])).unwrap();
    assert_same_shape(&original, &refined, 1e-10);
    assert_eq!(refined.count(Axis::U), original.count(Axis::U) + 4);
    assert_eq!(refined.count(Axis::V), original.count(Axis::V) + 2);
}

#[test]
fn elevate_then_reduce_restores_order_and_shape() {
    for t in 1..=3 {
        let original = bumpy_patch();
        let mut p = original.clone();
        p.elevate(Axis::V, t).unwrap();
        assert_eq!(p.order(Axis::V), original.order(Axis::V) + t);
        assert_same_shape(&original, &p, 1e-10);
        for _ in 0..t {
            p.reduce(Axis::V, 1e-6).unwrap();
        }
        assert_eq!(p.order(Axis::V), original.order(Axis::V));
        assert_same_shape(&original, &p, 1e-6);
    }
}

#[test]
fn split_then_concat_is_the_identity() {
    let original = bumpy_patch();
    let mut work = original.clone();
    let (left, right) = split::split(&mut work, Axis::V, 0.5, false).unwrap();

    let joined = concat_patches(
        &[left, right],
        &ConcatOptions::default(),
        &Tolerance::default_precision(),
    )
    .unwrap();

    // each half was rescaled to one unit of the new domain, so the
    // midpoint split maps v to 2v
    let (vlo, vhi) = joined.domain(Axis::V);
    assert!((vlo - 0.0).abs() < 1e-12 && (vhi - 2.0).abs() < 1e-12);
    for iu in 0..=8 {
        for iv in 0..=8 {
            let u = iu as f64 / 8.0;
            let v = iv as f64 / 8.0;
            let d = original.point_at(u, v).distance(joined.point_at(u, 2.0 * v));
            assert!(d < 1e-9, "{} away at ({}, {})", d, u, v);
        }
    }
}

#[test]
fn swap_uv_twice_is_byte_exact() {
    let original = bumpy_patch();
    let mut p = original.clone();
    p.swap_uv();
    assert_eq!(p.count(Axis::U), original.count(Axis::V));
    p.swap_uv();
    assert_eq!(p.uknots, original.uknots);
    assert_eq!(p.vknots, original.vknots);
    assert_eq!(p.net.points, original.net.points);
    assert_eq!(p.uorder, original.uorder);
    assert_eq!(p.vorder, original.vorder);
}

#[test]
fn revert_twice_is_byte_exact() {
    for axis in [Axis::U, Axis::V] {
        let original = bumpy_patch();
        let mut p = original.clone();
        p.revert(axis);
        // a single revert mirrors the parametrization
        let (lo, hi) = original.domain(axis);
        let probe = |patch: &Patch, t: f64| match axis {
            Axis::U => patch.point_at(t, 0.3),
            Axis::V => patch.point_at(0.3, t),
        };
        assert!(probe(&p, lo).distance(probe(&original, hi)) < 1e-10);
        p.revert(axis);
        assert_eq!(p.uknots, original.uknots);
        assert_eq!(p.vknots, original.vknots);
        assert_eq!(p.net.points, original.net.points);
    }
}

#[test]
fn extracted_subpatch_matches_the_region() {
    let original = bumpy_patch();
    let sub = split::extract_subpatch(&original, 0.25, 0.75, 0.2, 0.9).unwrap();
    let (ulo, uhi) = sub.domain(Axis::U);
    let (vlo, vhi) = sub.domain(Axis::V);
    for iu in 0..=6 {
        for iv in 0..=6 {
            let fu = iu as f64 / 6.0;
            let fv = iv as f64 / 6.0;
            let p = sub.point_at(ulo + (uhi - ulo) * fu, vlo + (vhi - vlo) * fv);
            let q = original.point_at(0.25 + 0.5 * fu, 0.2 + 0.7 * fv);
            assert!(p.distance(q) < 1e-9);
        }
    }
}

#[test]
fn isocurve_extraction_leaves_the_patch_alone() {
    let original = bumpy_patch();
    let before = original.clone();
    let iso = weft_nurbs::extract::extract_isocurve(&original, Axis::V, 0.4, false).unwrap();
    assert_eq!(original.net.points, before.net.points);
    assert_eq!(original.vknots, before.vknots);
    for i in 0..=8 {
        let u = i as f64 / 8.0;
        assert!(iso.point_at(u).distance(original.point_at(u, 0.4)) < 1e-10);
    }
}
