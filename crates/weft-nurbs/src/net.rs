//! The rectangular control net backing a patch.
//!
//! Points are weighted but non-premultiplied: (x, y, z) Euclidean and the
//! weight in `w`. Storage is row-major over u, `index = i * height + j`,
//! so a fixed-u column of `height` points is one contiguous slice.

use serde::{Deserialize, Serialize};
use weft_core::{Result, WeftError};
use weft_math::{DVec4, Point3, Transform};

use crate::Axis;

/// A `width × height` grid of homogeneous control points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlNet {
    pub width: usize,
    pub height: usize,
    pub points: Vec<DVec4>,
}

impl ControlNet {
    pub fn new(width: usize, height: usize, points: Vec<DVec4>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(WeftError::EmptyArgument("control net dimensions"));
        }
        if points.len() != width * height {
            return Err(WeftError::TypeMismatch(
                "control point count does not match width * height",
            ));
        }
        Ok(Self { width, height, points })
    }

    pub fn filled(width: usize, height: usize, value: DVec4) -> Self {
        Self {
            width,
            height,
            points: vec![value; width * height],
        }
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.width && j < self.height);
        i * self.height + j
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> DVec4 {
        self.points[self.index(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, p: DVec4) {
        let idx = self.index(i, j);
        self.points[idx] = p;
    }

    /// Euclidean position of a control point (weight dropped).
    #[inline]
    pub fn position(&self, i: usize, j: usize) -> Point3 {
        self.get(i, j).truncate()
    }

    /// Count of points along the given axis.
    pub fn count(&self, axis: Axis) -> usize {
        match axis {
            Axis::U => self.width,
            Axis::V => self.height,
        }
    }

    /// The line of points varying along `axis` at the fixed opposite
    /// index: `line(U, j)` has `width` points, `line(V, i)` has `height`.
    pub fn line(&self, axis: Axis, fixed: usize) -> Vec<DVec4> {
        match axis {
            Axis::U => (0..self.width).map(|i| self.get(i, fixed)).collect(),
            Axis::V => self.points[fixed * self.height..(fixed + 1) * self.height].to_vec(),
        }
    }

    /// Overwrite one line; `points` must match the axis count.
    pub fn set_line(&mut self, axis: Axis, fixed: usize, points: &[DVec4]) {
        match axis {
            Axis::U => {
                debug_assert_eq!(points.len(), self.width);
                for (i, &p) in points.iter().enumerate() {
                    self.set(i, fixed, p);
                }
            }
            Axis::V => {
                debug_assert_eq!(points.len(), self.height);
                self.points[fixed * self.height..(fixed + 1) * self.height]
                    .copy_from_slice(points);
            }
        }
    }

    /// Rebuild the net from freshly refined lines along `axis`: for U the
    /// lines are the `height` rows of the new width, for V the `width`
    /// columns of the new height.
    pub fn replace_lines(&mut self, axis: Axis, lines: Vec<Vec<DVec4>>) {
        let new_count = lines[0].len();
        match axis {
            Axis::U => {
                debug_assert_eq!(lines.len(), self.height);
                self.width = new_count;
                self.points = vec![DVec4::ZERO; self.width * self.height];
                for (j, line) in lines.iter().enumerate() {
                    for (i, &p) in line.iter().enumerate() {
                        let idx = i * self.height + j;
                        self.points[idx] = p;
                    }
                }
            }
            Axis::V => {
                debug_assert_eq!(lines.len(), self.width);
                self.height = new_count;
                self.points = lines.into_iter().flatten().collect();
            }
        }
    }

    /// Change the point count along `axis`. Shrinking truncates from the
    /// far side; growing distributes new lines evenly across the existing
    /// gaps, each new line linearly interpolated between its neighbors at
    /// `t = k / (inserted + 1)`.
    pub fn resize(&mut self, axis: Axis, new_count: usize) -> Result<()> {
        if new_count == 0 {
            return Err(WeftError::EmptyArgument("resize target"));
        }
        let old = self.count(axis);
        if new_count == old {
            return Ok(());
        }

        let other = self.count(axis.other());
        let mut lines: Vec<Vec<DVec4>> = (0..old)
            .map(|a| {
                (0..other)
                    .map(|b| match axis {
                        Axis::U => self.get(a, b),
                        Axis::V => self.get(b, a),
                    })
                    .collect()
            })
            .collect();

        if new_count < old {
            lines.truncate(new_count);
        } else {
            let add = new_count - old;
            let gaps = old - 1;
            if gaps == 0 {
                // single line: replicate it
                let only = lines[0].clone();
                for _ in 0..add {
                    lines.push(only.clone());
                }
            } else {
                let mut grown: Vec<Vec<DVec4>> = Vec::with_capacity(new_count);
                for g in 0..gaps {
                    let inserted = add / gaps + usize::from(g < add % gaps);
                    grown.push(lines[g].clone());
                    for k in 1..=inserted {
                        let t = k as f64 / (inserted + 1) as f64;
                        let blended = lines[g]
                            .iter()
                            .zip(&lines[g + 1])
                            .map(|(a, b)| a.lerp(*b, t))
                            .collect();
                        grown.push(blended);
                    }
                }
                grown.push(lines[gaps].clone());
                lines = grown;
            }
        }

        match axis {
            Axis::U => {
                self.width = new_count;
                self.points = vec![DVec4::ZERO; self.width * self.height];
                for (i, line) in lines.iter().enumerate() {
                    for (j, &p) in line.iter().enumerate() {
                        let idx = i * self.height + j;
                        self.points[idx] = p;
                    }
                }
            }
            Axis::V => {
                self.height = new_count;
                self.points = vec![DVec4::ZERO; self.width * self.height];
                for (j, line) in lines.iter().enumerate() {
                    for (i, &p) in line.iter().enumerate() {
                        let idx = i * self.height + j;
                        self.points[idx] = p;
                    }
                }
            }
        }
        Ok(())
    }

    /// Swap the two axes: `(i, j)` becomes `(j, i)`.
    pub fn transpose(&mut self) {
        let mut out = vec![DVec4::ZERO; self.points.len()];
        for i in 0..self.width {
            for j in 0..self.height {
                out[j * self.width + i] = self.get(i, j);
            }
        }
        std::mem::swap(&mut self.width, &mut self.height);
        self.points = out;
    }

    /// Reverse the point order along `axis`.
    pub fn revert(&mut self, axis: Axis) {
        match axis {
            Axis::U => {
                for i in 0..self.width / 2 {
                    let opp = self.width - 1 - i;
                    for j in 0..self.height {
                        let a = self.index(i, j);
                        let b = self.index(opp, j);
                        self.points.swap(a, b);
                    }
                }
            }
            Axis::V => {
                for chunk in self.points.chunks_mut(self.height) {
                    chunk.reverse();
                }
            }
        }
    }

    /// Apply an affine transform to every Euclidean position; weights are
    /// untouched.
    pub fn transform(&mut self, trafo: &Transform) {
        for p in &mut self.points {
            let moved = trafo.transform_point(p.truncate());
            *p = moved.extend(p.w);
        }
    }

    /// Whether any weight departs from 1.
    pub fn is_rational(&self) -> bool {
        self.points
            .iter()
            .any(|p| (p.w - 1.0).abs() > weft_core::Tolerance::KNOT_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec4;

    fn grid(w: usize, h: usize) -> ControlNet {
        let points = (0..w)
            .flat_map(|i| (0..h).map(move |j| dvec4(i as f64, j as f64, 0.0, 1.0)))
            .collect();
        ControlNet::new(w, h, points).unwrap()
    }

    #[test]
    fn indexing_is_row_major_over_u() {
        let n = grid(3, 2);
        assert_eq!(n.get(0, 0), dvec4(0.0, 0.0, 0.0, 1.0));
        assert_eq!(n.get(2, 1), dvec4(2.0, 1.0, 0.0, 1.0));
        assert_eq!(n.line(Axis::V, 1), vec![
            dvec4(1.0, 0.0, 0.0, 1.0),
            dvec4(1.0, 1.0, 0.0, 1.0),
        ]);
        assert_eq!(n.line(Axis::U, 0).len(), 3);
    }

    #[test]
    fn transpose_is_involution_and_swaps_dims() {
        let n = grid(4, 3);
        let mut t = n.clone();
        t.transpose();
        assert_eq!(t.width, 3);
        assert_eq!(t.height, 4);
        assert_eq!(t.get(1, 2), n.get(2, 1));
        t.transpose();
        assert_eq!(t, n);
    }

    #[test]
    fn revert_u_is_involution() {
        let n = grid(4, 3);
        let mut r = n.clone();
        r.revert(Axis::U);
        assert_eq!(r.get(0, 1), n.get(3, 1));
        r.revert(Axis::U);
        assert_eq!(r, n);
    }

    #[test]
    fn revert_v_reverses_columns() {
        let n = grid(2, 3);
        let mut r = n.clone();
        r.revert(Axis::V);
        assert_eq!(r.get(0, 0), n.get(0, 2));
        assert_eq!(r.get(1, 2), n.get(1, 0));
    }

    #[test]
    fn resize_grow_interpolates_midway() {
        // 2 -> 3 along u: the new middle row sits halfway
        let mut n = grid(2, 2);
        n.resize(Axis::U, 3).unwrap();
        assert_eq!(n.width, 3);
        assert_eq!(n.get(1, 0), dvec4(0.5, 0.0, 0.0, 1.0));
        assert_eq!(n.get(2, 1), dvec4(1.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn resize_grow_distributes_across_gaps() {
        // 3 -> 5 along v: 2 new columns over 2 gaps, one each
        let mut n = grid(2, 3);
        n.resize(Axis::V, 5).unwrap();
        assert_eq!(n.height, 5);
        assert_eq!(n.get(0, 1), dvec4(0.0, 0.5, 0.0, 1.0));
        assert_eq!(n.get(0, 3), dvec4(0.0, 1.5, 0.0, 1.0));
        assert_eq!(n.get(0, 4), dvec4(0.0, 2.0, 0.0, 1.0));
    }

    #[test]
    fn resize_shrink_truncates() {
        let mut n = grid(4, 2);
        n.resize(Axis::U, 2).unwrap();
        assert_eq!(n.width, 2);
        assert_eq!(n.get(1, 0), dvec4(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn replace_lines_along_u() {
        let mut n = grid(2, 2);
        let lines = vec![
            vec![dvec4(0.0, 0.0, 0.0, 1.0), dvec4(0.5, 0.0, 0.0, 1.0), dvec4(1.0, 0.0, 0.0, 1.0)],
            vec![dvec4(0.0, 1.0, 0.0, 1.0), dvec4(0.5, 1.0, 0.0, 1.0), dvec4(1.0, 1.0, 0.0, 1.0)],
        ];
        n.replace_lines(Axis::U, lines);
        assert_eq!(n.width, 3);
        assert_eq!(n.get(1, 1), dvec4(0.5, 1.0, 0.0, 1.0));
    }
}
