//! The curve ingredient/extraction type.
//!
//! Construction operators consume curves as profiles, trajectories and
//! rails; extraction returns them. Control points are stored
//! non-premultiplied: (x, y, z) Euclidean plus the weight in `w`.

use serde::{Deserialize, Serialize};
use weft_core::{Result, Tolerance, WeftError};
use weft_core::traits::Validate;
use weft_math::{Aabb3, DVec4, Point3, Transform, Vector3};

use crate::{basis, knots, refine, AxisType, KnotType};

/// A NURBS curve: order, knot vector and weighted control points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    pub order: usize,
    pub knot_type: KnotType,
    pub ctype: AxisType,
    pub is_rational: bool,
    pub knots: Vec<f64>,
    pub control: Vec<DVec4>,
}

impl Curve {
    /// Create a curve from caller-supplied control points; the knot
    /// vector is fabricated from `knot_type` when `knots` is `None`.
    pub fn new(
        order: usize,
        knot_type: KnotType,
        control: Vec<DVec4>,
        knot_data: Option<Vec<f64>>,
    ) -> Result<Self> {
        if control.is_empty() {
            return Err(WeftError::EmptyArgument("control points"));
        }
        if control.len() < order {
            return Err(WeftError::TypeMismatch("fewer control points than order"));
        }
        let knots = match knot_data {
            Some(k) => k,
            None => knots::create(knot_type, order, control.len())?,
        };
        knots::validate(order, control.len(), &knots)?;
        let mut curve = Self {
            order,
            knot_type,
            ctype: AxisType::Open,
            is_rational: false,
            knots,
            control,
        };
        curve.update_rational();
        Ok(curve)
    }

    /// Clamped curve through the given Euclidean points used as the
    /// control polygon (weights 1).
    pub fn from_points(points: &[Point3], order: usize) -> Result<Self> {
        let control = points.iter().map(|p| p.extend(1.0)).collect();
        Self::new(order, KnotType::Clamped, control, None)
    }

    pub fn len(&self) -> usize {
        self.control.len()
    }

    pub fn is_empty(&self) -> bool {
        self.control.is_empty()
    }

    pub fn degree(&self) -> usize {
        self.order - 1
    }

    pub fn domain(&self) -> (f64, f64) {
        knots::domain(self.order, &self.knots, self.len())
    }

    /// Re-derive the rational flag: true iff some weight departs from 1.
    pub fn update_rational(&mut self) {
        self.is_rational = self
            .control
            .iter()
            .any(|p| (p.w - 1.0).abs() > Tolerance::KNOT_EPSILON);
    }

    /// Rational evaluation at `t`.
    pub fn point_at(&self, t: f64) -> Point3 {
        let span = basis::find_span(self.order, &self.knots, self.len(), t);
        let n = basis::basis_functions(self.order, &self.knots, span, t);
        let mut acc = Point3::ZERO;
        let mut w = 0.0;
        for (k, &value) in n.iter().enumerate() {
            let p = self.control[span + 1 - self.order + k];
            let bw = value * p.w;
            acc += bw * p.truncate();
            w += bw;
        }
        if w.abs() < 1e-15 {
            acc
        } else {
            acc / w
        }
    }

    /// First derivative (rational quotient rule) at `t`.
    pub fn tangent_at(&self, t: f64) -> Vector3 {
        let span = basis::find_span(self.order, &self.knots, self.len(), t);
        let (n, dn) = basis::basis_functions_derivs(self.order, &self.knots, span, t);
        let mut a = Point3::ZERO;
        let mut da = Point3::ZERO;
        let mut w = 0.0;
        let mut dw = 0.0;
        for k in 0..self.order {
            let p = self.control[span + 1 - self.order + k];
            let bw = n[k] * p.w;
            let dbw = dn[k] * p.w;
            a += bw * p.truncate();
            da += dbw * p.truncate();
            w += bw;
            dw += dbw;
        }
        if w.abs() < 1e-15 {
            da
        } else {
            let c = a / w;
            (da - dw * c) / w
        }
    }

    /// Whether start and end positions coincide.
    pub fn is_closed(&self, tol: &Tolerance) -> bool {
        let (lo, hi) = self.domain();
        self.point_at(lo).distance(self.point_at(hi)) < tol.linear
    }

    pub fn is_clamped(&self) -> bool {
        knots::is_clamped(self.order, &self.knots)
    }

    /// Clamp both ends to full multiplicity without changing shape.
    pub fn clamp(&mut self) -> Result<()> {
        if self.is_clamped() {
            return Ok(());
        }
        let hom = refine::to_homogeneous(&self.control);
        let (k, c) = refine::clamp(self.order, &self.knots, &hom);
        self.knots = k;
        self.control = refine::from_homogeneous(&c);
        self.knot_type = knots::classify(self.order, &self.knots);
        Ok(())
    }

    /// Shape-preserving knot insertion; rejected when `r` exceeds
    /// `order − multiplicity(u)`.
    pub fn insert_knot(&mut self, u: f64, r: usize) -> Result<()> {
        let hom = refine::to_homogeneous(&self.control);
        let (k, c) = refine::insert_knot(self.order, &self.knots, &hom, u, r)?;
        self.knots = k;
        self.control = refine::from_homogeneous(&c);
        self.knot_type = knots::classify(self.order, &self.knots);
        Ok(())
    }

    /// Insert the given knots, or one at the midpoint of every nonempty
    /// span when `values` is `None`.
    pub fn refine_knots(&mut self, values: Option<&[f64]>) -> Result<()> {
        let insert: Vec<f64> = match values {
            Some(v) => v.to_vec(),
            None => knots::span_midpoints(self.order, &self.knots, self.len()),
        };
        if insert.is_empty() {
            return Ok(());
        }
        let (lo, hi) = self.domain();
        for &u in &insert {
            if u < lo || u > hi {
                return Err(WeftError::OperationFailed(format!(
                    "refine knot {} outside domain",
                    u
                )));
            }
        }
        let hom = refine::to_homogeneous(&self.control);
        let (k, c) = refine::refine_knots(self.order, &self.knots, &hom, &insert);
        self.knots = k;
        self.control = refine::from_homogeneous(&c);
        self.knot_type = knots::classify(self.order, &self.knots);
        Ok(())
    }

    /// Attempt up to `max_count` removals of `u`; returns the number
    /// actually removed. Rejection by tolerance is normal termination.
    pub fn remove_knot(&mut self, u: f64, max_count: usize, tol: f64) -> usize {
        let hom = refine::to_homogeneous(&self.control);
        let (k, c, removed) = refine::remove_knot(self.order, &self.knots, &hom, u, max_count, tol);
        if removed > 0 {
            self.knots = k;
            self.control = refine::from_homogeneous(&c);
            self.knot_type = knots::classify(self.order, &self.knots);
        }
        removed
    }

    /// Remove every interior knot that does not contribute to the shape
    /// within `tol`. Returns the total number removed.
    pub fn remove_superfluous_knots(&mut self, tol: f64) -> usize {
        let mut total = 0;
        loop {
            let interior: Vec<f64> = {
                let d = knots::distinct_in_domain(self.order, &self.knots, self.len());
                d[1..d.len() - 1].to_vec()
            };
            let mut removed_this_pass = 0;
            for u in interior {
                removed_this_pass += self.remove_knot(u, self.order, tol);
            }
            if removed_this_pass == 0 {
                return total;
            }
            total += removed_this_pass;
        }
    }

    /// Raise the order by `t`; clamps first when needed. The resulting
    /// knot type is Custom (or whatever `classify` recognizes).
    pub fn elevate(&mut self, t: usize) -> Result<()> {
        if t == 0 {
            return Ok(());
        }
        let hom = refine::to_homogeneous(&self.control);
        let (k, c) = refine::elevate_degree(self.order, &self.knots, &hom, t);
        self.order += t;
        self.knots = k;
        self.control = refine::from_homogeneous(&c);
        self.knot_type = knots::classify(self.order, &self.knots);
        Ok(())
    }

    /// Lower the order by one; accepted only within `tol`.
    pub fn reduce(&mut self, tol: f64) -> Result<()> {
        let hom = refine::to_homogeneous(&self.control);
        let (k, c) = refine::reduce_degree(self.order, &self.knots, &hom, tol)?;
        self.order -= 1;
        self.knots = k;
        self.control = refine::from_homogeneous(&c);
        self.knot_type = knots::classify(self.order, &self.knots);
        Ok(())
    }

    /// Affinely map the knot vector onto `[min, max]`.
    pub fn rescale_domain(&mut self, min: f64, max: f64) {
        knots::rescale(&mut self.knots, min, max);
    }

    /// Reverse the parametric direction: control points reversed, knot
    /// vector mirrored about the domain.
    pub fn revert(&mut self) {
        self.control.reverse();
        let sum = self.knots[0] + self.knots[self.knots.len() - 1];
        let mirrored: Vec<f64> = self.knots.iter().rev().map(|&k| sum - k).collect();
        self.knots = mirrored;
        self.knot_type = knots::classify(self.order, &self.knots);
    }

    /// Apply an affine transform to the Euclidean part of every control
    /// point; weights are untouched.
    pub fn transform(&mut self, trafo: &Transform) {
        for p in &mut self.control {
            let moved = trafo.transform_point(p.truncate());
            *p = moved.extend(p.w);
        }
    }

    /// Append `other` (clamped, adjacent range) to this curve.
    ///
    /// Orders must match; `other`'s knots are shifted so its range starts
    /// where this curve's ends, and the coincident junction point is
    /// merged.
    pub fn concat(&mut self, other: &Curve) -> Result<()> {
        if self.order != other.order {
            return Err(WeftError::TypeMismatch("concat: differing orders"));
        }
        if !self.is_clamped() || !other.is_clamped() {
            return Err(WeftError::OperationFailed(
                "concat: both curves must be clamped".into(),
            ));
        }
        let (_, hi) = self.domain();
        let mut tail = other.clone();
        let (olo, _) = tail.domain();
        let shift = hi - olo;
        for k in &mut tail.knots {
            *k += shift;
        }

        let junction_self = *self.control.last().unwrap();
        let junction_other = tail.control[0];
        if junction_self.truncate().distance(junction_other.truncate())
            > Tolerance::default_precision().linear * 10.0
        {
            // keep both points and the full clamp run: the junction knot
            // stays at multiplicity `order` and the seam is a hard break
            self.control.push(junction_other);
        } else {
            // merged junction point, junction knot at multiplicity
            // order-1 (C0)
            self.knots.truncate(self.knots.len() - 1);
        }
        self.control.extend_from_slice(&tail.control[1..]);
        self.knots.extend_from_slice(&tail.knots[self.order..]);

        knots::validate(self.order, self.control.len(), &self.knots)?;
        self.knot_type = knots::classify(self.order, &self.knots);
        self.update_rational();
        Ok(())
    }

    pub fn bounding_box(&self) -> Option<Aabb3> {
        let pts: Vec<Point3> = self.control.iter().map(|p| p.truncate()).collect();
        Aabb3::from_points(&pts)
    }
}

impl Validate for Curve {
    fn validate(&self) -> Result<()> {
        if self.control.is_empty() {
            return Err(WeftError::EmptyArgument("control points"));
        }
        if self.control.len() < self.order {
            return Err(WeftError::TypeMismatch("fewer control points than order"));
        }
        knots::validate(self.order, self.control.len(), &self.knots)
    }
}
