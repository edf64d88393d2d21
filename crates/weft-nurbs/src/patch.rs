//! The tensor-product surface patch.
//!
//! A patch owns its control net, both knot vectors, the closedness tags
//! and the derived caches (breakpoints, coincident-point groups, trim
//! loops). Axis-wise knot algebra delegates to [`crate::refine`] line by
//! line; every shape-changing mutation invalidates the caches.

use serde::{Deserialize, Serialize};
use weft_core::{Result, Tolerance, WeftError};
use weft_core::traits::Validate;
use weft_math::{Aabb3, DVec4, Point3, Transform, Vector3};

use crate::curve::Curve;
use crate::net::ControlNet;
use crate::{basis, knots, refine, Axis, AxisType, KnotType};

/// A surface position cached at a distinct knot pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub point: Point3,
    pub u: f64,
    pub v: f64,
}

/// A rational tensor-product surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub uorder: usize,
    pub vorder: usize,
    pub uknot_type: KnotType,
    pub vknot_type: KnotType,
    pub utype: AxisType,
    pub vtype: AxisType,
    pub is_rational: bool,
    pub uknots: Vec<f64>,
    pub vknots: Vec<f64>,
    pub net: ControlNet,
    /// Groups of coincident control point indices (poles, collapsed
    /// rows). Rebuilt from scratch on demand, cleared by any mutation.
    pub mpoints: Vec<Vec<usize>>,
    /// Cached surface positions at every distinct knot pair.
    pub breakpoints: Option<Vec<Breakpoint>>,
    /// Trim curve loops in (u, v) parameter space (x = u, y = v).
    pub trim_loops: Vec<Vec<Curve>>,
}

impl Patch {
    pub fn new(
        uorder: usize,
        vorder: usize,
        uknot_type: KnotType,
        vknot_type: KnotType,
        net: ControlNet,
        uknot_data: Option<Vec<f64>>,
        vknot_data: Option<Vec<f64>>,
    ) -> Result<Self> {
        if net.width < uorder || net.height < vorder {
            return Err(WeftError::TypeMismatch("fewer control points than order"));
        }
        let uknots = match uknot_data {
            Some(k) => k,
            None => knots::create(uknot_type, uorder, net.width)?,
        };
        let vknots = match vknot_data {
            Some(k) => k,
            None => knots::create(vknot_type, vorder, net.height)?,
        };
        knots::validate(uorder, net.width, &uknots)?;
        knots::validate(vorder, net.height, &vknots)?;
        let is_rational = net.is_rational();
        Ok(Self {
            uorder,
            vorder,
            uknot_type,
            vknot_type,
            utype: AxisType::Open,
            vtype: AxisType::Open,
            is_rational,
            uknots,
            vknots,
            net,
            mpoints: Vec::new(),
            breakpoints: None,
            trim_loops: Vec::new(),
        })
    }

    /// Clamped default knot vectors on both axes.
    pub fn with_default_knots(uorder: usize, vorder: usize, net: ControlNet) -> Result<Self> {
        Self::new(uorder, vorder, KnotType::Clamped, KnotType::Clamped, net, None, None)
    }

    pub fn width(&self) -> usize {
        self.net.width
    }

    pub fn height(&self) -> usize {
        self.net.height
    }

    pub fn order(&self, axis: Axis) -> usize {
        match axis {
            Axis::U => self.uorder,
            Axis::V => self.vorder,
        }
    }

    pub fn count(&self, axis: Axis) -> usize {
        self.net.count(axis)
    }

    pub fn knots(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::U => &self.uknots,
            Axis::V => &self.vknots,
        }
    }

    pub fn knot_type(&self, axis: Axis) -> KnotType {
        match axis {
            Axis::U => self.uknot_type,
            Axis::V => self.vknot_type,
        }
    }

    pub fn axis_type(&self, axis: Axis) -> AxisType {
        match axis {
            Axis::U => self.utype,
            Axis::V => self.vtype,
        }
    }

    pub fn set_axis_type(&mut self, axis: Axis, t: AxisType) {
        match axis {
            Axis::U => self.utype = t,
            Axis::V => self.vtype = t,
        }
    }

    pub fn domain(&self, axis: Axis) -> (f64, f64) {
        knots::domain(self.order(axis), self.knots(axis), self.count(axis))
    }

    pub fn is_clamped(&self, axis: Axis) -> bool {
        knots::is_clamped(self.order(axis), self.knots(axis))
    }

    pub fn update_rational(&mut self) {
        self.is_rational = self.net.is_rational();
    }

    /// Drop every derived cache; called by all shape-changing mutations.
    pub fn invalidate_caches(&mut self) {
        self.breakpoints = None;
        self.mpoints.clear();
    }

    // ---- evaluation ------------------------------------------------

    /// Rational surface evaluation at `(u, v)`.
    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        let uspan = basis::find_span(self.uorder, &self.uknots, self.width(), u);
        let vspan = basis::find_span(self.vorder, &self.vknots, self.height(), v);
        let nu = basis::basis_functions(self.uorder, &self.uknots, uspan, u);
        let nv = basis::basis_functions(self.vorder, &self.vknots, vspan, v);

        let mut acc = Point3::ZERO;
        let mut w = 0.0;
        for (k, &bu) in nu.iter().enumerate() {
            let i = uspan + 1 - self.uorder + k;
            for (l, &bv) in nv.iter().enumerate() {
                let j = vspan + 1 - self.vorder + l;
                let p = self.net.get(i, j);
                let bw = bu * bv * p.w;
                acc += bw * p.truncate();
                w += bw;
            }
        }
        if w.abs() < 1e-15 {
            acc
        } else {
            acc / w
        }
    }

    /// Rational partial derivatives `(S_u, S_v)` at `(u, v)`.
    pub fn partials_at(&self, u: f64, v: f64) -> (Vector3, Vector3) {
        let uspan = basis::find_span(self.uorder, &self.uknots, self.width(), u);
        let vspan = basis::find_span(self.vorder, &self.vknots, self.height(), v);
        let (nu, dnu) = basis::basis_functions_derivs(self.uorder, &self.uknots, uspan, u);
        let (nv, dnv) = basis::basis_functions_derivs(self.vorder, &self.vknots, vspan, v);

        let mut a = Point3::ZERO;
        let mut au = Point3::ZERO;
        let mut av = Point3::ZERO;
        let mut w = 0.0;
        let mut wu = 0.0;
        let mut wv = 0.0;
        for k in 0..self.uorder {
            let i = uspan + 1 - self.uorder + k;
            for l in 0..self.vorder {
                let j = vspan + 1 - self.vorder + l;
                let p = self.net.get(i, j);
                let xyz = p.truncate();
                a += nu[k] * nv[l] * p.w * xyz;
                au += dnu[k] * nv[l] * p.w * xyz;
                av += nu[k] * dnv[l] * p.w * xyz;
                w += nu[k] * nv[l] * p.w;
                wu += dnu[k] * nv[l] * p.w;
                wv += nu[k] * dnv[l] * p.w;
            }
        }
        if w.abs() < 1e-15 {
            return (au, av);
        }
        let s = a / w;
        ((au - wu * s) / w, (av - wv * s) / w)
    }

    /// Unit surface normal at `(u, v)`; zero where the partials are
    /// degenerate (poles).
    pub fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        let (su, sv) = self.partials_at(u, v);
        su.cross(sv).normalize_or_zero()
    }

    // ---- axis-wise knot algebra ------------------------------------

    /// The premultiplied homogeneous lines running along `axis`, one per
    /// fixed index of the other axis.
    fn homogeneous_lines(&self, axis: Axis) -> Vec<Vec<DVec4>> {
        (0..self.count(axis.other()))
            .map(|f| refine::to_homogeneous(&self.net.line(axis, f)))
            .collect()
    }

    fn commit_lines(&mut self, axis: Axis, knot_data: Vec<f64>, lines: Vec<Vec<DVec4>>) {
        let lines: Vec<Vec<DVec4>> =
            lines.iter().map(|l| refine::from_homogeneous(l)).collect();
        self.net.replace_lines(axis, lines);
        let ktype = knots::classify(self.order(axis), &knot_data);
        match axis {
            Axis::U => {
                self.uknots = knot_data;
                self.uknot_type = ktype;
            }
            Axis::V => {
                self.vknots = knot_data;
                self.vknot_type = ktype;
            }
        }
        self.invalidate_caches();
    }

    /// Clamp the given axis to full end multiplicity without changing
    /// shape.
    pub fn clamp(&mut self, axis: Axis) -> Result<()> {
        if self.is_clamped(axis) {
            return Ok(());
        }
        let order = self.order(axis);
        let knot_data = self.knots(axis).to_vec();
        let mut out_knots = Vec::new();
        let mut out_lines = Vec::new();
        for line in self.homogeneous_lines(axis) {
            let (k, c) = refine::clamp(order, &knot_data, &line);
            out_knots = k;
            out_lines.push(c);
        }
        self.commit_lines(axis, out_knots, out_lines);
        Ok(())
    }

    /// Shape-preserving knot insertion on one axis.
    pub fn insert_knot(&mut self, axis: Axis, u: f64, r: usize) -> Result<()> {
        let order = self.order(axis);
        let knot_data = self.knots(axis).to_vec();
        let mut out_knots = Vec::new();
        let mut out_lines = Vec::new();
        for line in self.homogeneous_lines(axis) {
            let (k, c) = refine::insert_knot(order, &knot_data, &line, u, r)?;
            out_knots = k;
            out_lines.push(c);
        }
        self.commit_lines(axis, out_knots, out_lines);
        Ok(())
    }

    /// Insert the given knots along one axis, or span midpoints when
    /// `values` is `None`.
    pub fn refine_knots(&mut self, axis: Axis, values: Option<&[f64]>) -> Result<()> {
        let order = self.order(axis);
        let knot_data = self.knots(axis).to_vec();
        let insert: Vec<f64> = match values {
            Some(v) => v.to_vec(),
            None => knots::span_midpoints(order, &knot_data, self.count(axis)),
        };
        if insert.is_empty() {
            return Ok(());
        }
        let (lo, hi) = self.domain(axis);
        for &t in &insert {
            if t < lo || t > hi {
                return Err(WeftError::OperationFailed(format!(
                    "refine knot {} outside domain",
                    t
                )));
            }
        }
        let mut out_knots = Vec::new();
        let mut out_lines = Vec::new();
        for line in self.homogeneous_lines(axis) {
            let (k, c) = refine::refine_knots(order, &knot_data, &line, &insert);
            out_knots = k;
            out_lines.push(c);
        }
        self.commit_lines(axis, out_knots, out_lines);
        Ok(())
    }

    /// Attempt up to `max_count` removals of `u` along `axis`. A removal
    /// is committed only when every line accepts it within `tol`, so the
    /// net stays rectangular. Returns the number removed.
    pub fn remove_knot(&mut self, axis: Axis, u: f64, max_count: usize, tol: f64) -> usize {
        let order = self.order(axis);
        let mut removed_total = 0;
        for _ in 0..max_count {
            let knot_data = self.knots(axis).to_vec();
            let mut out_knots = Vec::new();
            let mut out_lines = Vec::new();
            let mut all_ok = true;
            for line in self.homogeneous_lines(axis) {
                let (k, c, removed) = refine::remove_knot(order, &knot_data, &line, u, 1, tol);
                if removed != 1 {
                    all_ok = false;
                    break;
                }
                out_knots = k;
                out_lines.push(c);
            }
            if !all_ok {
                break;
            }
            self.commit_lines(axis, out_knots, out_lines);
            removed_total += 1;
        }
        removed_total
    }

    /// Remove every interior knot on `axis` that does not contribute to
    /// the shape within `tol`.
    pub fn remove_superfluous_knots(&mut self, axis: Axis, tol: f64) -> usize {
        let mut total = 0;
        loop {
            let order = self.order(axis);
            let interior: Vec<f64> = {
                let d = knots::distinct_in_domain(order, self.knots(axis), self.count(axis));
                d[1..d.len() - 1].to_vec()
            };
            let mut removed_this_pass = 0;
            for u in interior {
                removed_this_pass += self.remove_knot(axis, u, order, tol);
            }
            if removed_this_pass == 0 {
                return total;
            }
            total += removed_this_pass;
        }
    }

    /// Raise the order on one axis by `t`.
    pub fn elevate(&mut self, axis: Axis, t: usize) -> Result<()> {
        if t == 0 {
            return Ok(());
        }
        let order = self.order(axis);
        let knot_data = self.knots(axis).to_vec();
        let mut out_knots = Vec::new();
        let mut out_lines = Vec::new();
        for line in self.homogeneous_lines(axis) {
            let (k, c) = refine::elevate_degree(order, &knot_data, &line, t);
            out_knots = k;
            out_lines.push(c);
        }
        match axis {
            Axis::U => self.uorder += t,
            Axis::V => self.vorder += t,
        }
        self.commit_lines(axis, out_knots, out_lines);
        Ok(())
    }

    /// Lower the order on one axis by one; accepted only when every line
    /// reduces within `tol`. Nothing is mutated on rejection.
    pub fn reduce(&mut self, axis: Axis, tol: f64) -> Result<()> {
        let order = self.order(axis);
        let knot_data = self.knots(axis).to_vec();
        let mut out_knots = Vec::new();
        let mut out_lines = Vec::new();
        for line in self.homogeneous_lines(axis) {
            let (k, c) = refine::reduce_degree(order, &knot_data, &line, tol)?;
            out_knots = k;
            out_lines.push(c);
        }
        match axis {
            Axis::U => self.uorder -= 1,
            Axis::V => self.vorder -= 1,
        }
        self.commit_lines(axis, out_knots, out_lines);
        Ok(())
    }

    /// Affinely map one axis's domain onto `[min, max]`, carrying any
    /// attached trim loops along in that coordinate.
    pub fn rescale_domain(&mut self, axis: Axis, min: f64, max: f64) {
        let (lo, hi) = self.domain(axis);
        let range = hi - lo;
        match axis {
            Axis::U => knots::rescale(&mut self.uknots, min, max),
            Axis::V => knots::rescale(&mut self.vknots, min, max),
        }
        if range > 0.0 {
            let scale = (max - min) / range;
            for tloop in &mut self.trim_loops {
                for curve in tloop {
                    for p in &mut curve.control {
                        match axis {
                            Axis::U => p.x = min + (p.x - lo) * scale,
                            Axis::V => p.y = min + (p.y - lo) * scale,
                        }
                    }
                }
            }
        }
        self.breakpoints = None;
    }

    // ---- structural operations -------------------------------------

    /// Swap the parametric axes. An exact involution: applying twice
    /// restores the patch bit for bit.
    pub fn swap_uv(&mut self) {
        self.net.transpose();
        std::mem::swap(&mut self.uorder, &mut self.vorder);
        std::mem::swap(&mut self.uknots, &mut self.vknots);
        std::mem::swap(&mut self.uknot_type, &mut self.vknot_type);
        std::mem::swap(&mut self.utype, &mut self.vtype);
        for tloop in &mut self.trim_loops {
            for curve in tloop {
                for p in &mut curve.control {
                    std::mem::swap(&mut p.x, &mut p.y);
                }
            }
        }
        self.invalidate_caches();
    }

    /// Reverse one parametric direction: points reversed, knot vector
    /// mirrored about the domain. An exact involution.
    pub fn revert(&mut self, axis: Axis) {
        self.net.revert(axis);
        let mirror = |k: &mut Vec<f64>| {
            let sum = k[0] + k[k.len() - 1];
            let mut m: Vec<f64> = k.iter().rev().map(|&x| sum - x).collect();
            std::mem::swap(k, &mut m);
        };
        match axis {
            Axis::U => {
                mirror(&mut self.uknots);
                self.uknot_type = knots::classify(self.uorder, &self.uknots);
            }
            Axis::V => {
                mirror(&mut self.vknots);
                self.vknot_type = knots::classify(self.vorder, &self.vknots);
            }
        }
        let (lo, hi) = self.domain(axis);
        for tloop in &mut self.trim_loops {
            for curve in tloop {
                for p in &mut curve.control {
                    match axis {
                        Axis::U => p.x = lo + hi - p.x,
                        Axis::V => p.y = lo + hi - p.y,
                    }
                }
            }
        }
        self.invalidate_caches();
    }

    /// Apply an affine transform to every control point position.
    pub fn transform(&mut self, trafo: &Transform) {
        self.net.transform(trafo);
        self.breakpoints = None;
    }

    pub fn bounding_box(&self) -> Option<Aabb3> {
        let pts: Vec<Point3> = self.net.points.iter().map(|p| p.truncate()).collect();
        Aabb3::from_points(&pts)
    }

    pub fn attach_trim_loop(&mut self, tloop: Vec<Curve>) {
        self.trim_loops.push(tloop);
    }

    // ---- caches ----------------------------------------------------

    /// Rebuild the coincident-point groups from scratch: every set of two
    /// or more control points sharing a position within `tol`.
    pub fn compute_mpoints(&mut self, tol: &Tolerance) -> &[Vec<usize>] {
        let n = self.net.points.len();
        let mut grouped = vec![false; n];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for a in 0..n {
            if grouped[a] {
                continue;
            }
            let mut group = vec![a];
            let pa = self.net.points[a].truncate();
            for b in (a + 1)..n {
                if grouped[b] {
                    continue;
                }
                if pa.distance(self.net.points[b].truncate()) < tol.linear {
                    grouped[b] = true;
                    group.push(b);
                }
            }
            if group.len() > 1 {
                grouped[a] = true;
                groups.push(group);
            }
        }
        self.mpoints = groups;
        &self.mpoints
    }

    /// Evaluate and cache the surface at every distinct knot pair.
    pub fn compute_breakpoints(&mut self) -> &[Breakpoint] {
        if self.breakpoints.is_none() {
            let us = knots::distinct_in_domain(self.uorder, &self.uknots, self.width());
            let vs = knots::distinct_in_domain(self.vorder, &self.vknots, self.height());
            let mut table = Vec::with_capacity(us.len() * vs.len());
            for &u in &us {
                for &v in &vs {
                    table.push(Breakpoint {
                        point: self.point_at(u, v),
                        u,
                        v,
                    });
                }
            }
            self.breakpoints = Some(table);
        }
        self.breakpoints.as_deref().unwrap()
    }
}

impl Validate for Patch {
    fn validate(&self) -> Result<()> {
        if self.net.points.is_empty() {
            return Err(WeftError::EmptyArgument("control net"));
        }
        if self.width() < self.uorder || self.height() < self.vorder {
            return Err(WeftError::TypeMismatch("fewer control points than order"));
        }
        knots::validate(self.uorder, self.width(), &self.uknots)?;
        knots::validate(self.vorder, self.height(), &self.vknots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec3;

    /// 4x3 bilinear-ish test patch, orders 3x2.
    fn sample() -> Patch {
        let points = (0..4)
            .flat_map(|i| {
                (0..3).map(move |j| {
                    DVec4::new(i as f64, j as f64, ((i * j) % 3) as f64 * 0.5, 1.0)
                })
            })
            .collect();
        let net = ControlNet::new(4, 3, points).unwrap();
        Patch::with_default_knots(3, 2, net).unwrap()
    }

    #[test]
    fn undersized_net_is_rejected_even_with_knot_data() {
        let points = vec![DVec4::new(0.0, 0.0, 0.0, 1.0); 4];
        let net = ControlNet::new(2, 2, points).unwrap();
        let r = Patch::new(
            3,
            2,
            KnotType::Custom,
            KnotType::Clamped,
            net,
            Some(vec![0.0, 0.25, 0.5, 0.75, 1.0]),
            None,
        );
        assert!(matches!(r, Err(WeftError::TypeMismatch(_))));
    }

    fn assert_same_shape(a: &Patch, b: &Patch, tol: f64) {
        let (ulo, uhi) = a.domain(Axis::U);
        let (vlo, vhi) = a.domain(Axis::V);
        for iu in 0..=8 {
            for iv in 0..=8 {
                let u = ulo + (uhi - ulo) * iu as f64 / 8.0;
                let v = vlo + (vhi - vlo) * iv as f64 / 8.0;
                let d = a.point_at(u, v).distance(b.point_at(u, v));
                assert!(d < tol, "shape off by {} at ({}, {})", d, u, v);
            }
        }
    }

    #[test]
    fn corners_interpolate() {
        let p = sample();
        assert!(p.point_at(0.0, 0.0).distance(dvec3(0.0, 0.0, 0.0)) < 1e-12);
        assert!(p.point_at(1.0, 1.0).distance(dvec3(3.0, 2.0, 0.0)) < 1e-12);
    }

    #[test]
    fn insertion_preserves_shape_both_axes() {
        let p = sample();
        let mut q = p.clone();
        q.insert_knot(Axis::U, 0.3, 1).unwrap();
        q.insert_knot(Axis::V, 0.6, 1).unwrap();
        assert_eq!(q.width(), 5);
        assert_eq!(q.height(), 4);
        assert_same_shape(&p, &q, 1e-12);
    }

    #[test]
    fn removal_undoes_insertion() {
        let p = sample();
        let mut q = p.clone();
        q.insert_knot(Axis::U, 0.4, 1).unwrap();
        assert_eq!(q.remove_knot(Axis::U, 0.4, 1, 1e-9), 1);
        assert_eq!(q.width(), p.width());
        assert_same_shape(&p, &q, 1e-9);
    }

    #[test]
    fn elevation_preserves_shape() {
        let p = sample();
        let mut q = p.clone();
        q.elevate(Axis::V, 2).unwrap();
        assert_eq!(q.vorder, 4);
        assert_same_shape(&p, &q, 1e-10);
    }

    #[test]
    fn elevate_reduce_roundtrip() {
        let p = sample();
        let mut q = p.clone();
        q.elevate(Axis::U, 1).unwrap();
        q.reduce(Axis::U, 0.0).unwrap();
        assert_eq!(q.uorder, p.uorder);
        assert_same_shape(&p, &q, 1e-8);
    }

    #[test]
    fn reduce_rejects_without_mutation() {
        // order-3 data that is genuinely quadratic cannot reduce to linear
        let mut p = sample();
        let before = p.clone();
        assert!(p.reduce(Axis::U, 1e-12).is_err());
        assert_eq!(p.uorder, before.uorder);
        assert_eq!(p.net, before.net);
    }

    #[test]
    fn swap_uv_is_exact_involution() {
        let mut p = sample();
        p.insert_knot(Axis::U, 0.25, 1).unwrap();
        let orig = p.clone();
        p.swap_uv();
        assert_eq!(p.width(), orig.height());
        p.swap_uv();
        assert_eq!(p.uknots, orig.uknots);
        assert_eq!(p.vknots, orig.vknots);
        assert_eq!(p.net, orig.net);
        assert_eq!(p.uorder, orig.uorder);
    }

    #[test]
    fn revert_u_is_exact_involution() {
        let mut p = sample();
        p.insert_knot(Axis::U, 0.3, 1).unwrap();
        let orig = p.clone();
        p.revert(Axis::U);
        assert!(p.point_at(0.0, 0.0).distance(orig.point_at(1.0, 0.0)) < 1e-12);
        p.revert(Axis::U);
        assert_eq!(p.uknots, orig.uknots);
        assert_eq!(p.net, orig.net);
    }

    #[test]
    fn swap_uv_transposes_evaluation() {
        let p = sample();
        let mut q = p.clone();
        q.swap_uv();
        for &(u, v) in &[(0.2, 0.7), (0.5, 0.5), (0.9, 0.1)] {
            assert!(p.point_at(u, v).distance(q.point_at(v, u)) < 1e-12);
        }
    }

    #[test]
    fn normal_of_planar_patch() {
        let points = (0..2)
            .flat_map(|i| (0..2).map(move |j| DVec4::new(i as f64, j as f64, 0.0, 1.0)))
            .collect();
        let net = ControlNet::new(2, 2, points).unwrap();
        let p = Patch::with_default_knots(2, 2, net).unwrap();
        let n = p.normal_at(0.5, 0.5);
        assert!((n.z.abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn breakpoints_cover_distinct_pairs() {
        let mut p = sample();
        p.insert_knot(Axis::U, 0.5, 1).unwrap();
        let bps = p.compute_breakpoints().to_vec();
        // distinct u = {0, 0.5, 1}, distinct v = {0, 1}
        assert_eq!(bps.len(), 3 * 2);
        assert!(bps.iter().any(|b| b.u == 0.5 && b.v == 0.0));
    }

    #[test]
    fn mpoints_find_pole() {
        let mut points: Vec<DVec4> = (0..3)
            .flat_map(|i| (0..2).map(move |j| DVec4::new(i as f64, j as f64, 0.0, 1.0)))
            .collect();
        // collapse the j = 0 row into a pole at the origin
        for i in 0..3 {
            points[i * 2] = DVec4::new(0.0, 0.0, 0.0, 1.0);
        }
        let net = ControlNet::new(3, 2, points).unwrap();
        let mut p = Patch::with_default_knots(2, 2, net).unwrap();
        let groups = p.compute_mpoints(&Tolerance::default_precision()).to_vec();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }
}
