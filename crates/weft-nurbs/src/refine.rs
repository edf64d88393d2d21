//! Shape-preserving knot algebra on homogeneous control polygons.
//!
//! Every function here operates on premultiplied homogeneous points
//! (x·w, y·w, z·w, w). Curves and patches store non-premultiplied
//! coordinates; they convert on the way in and out via
//! [`to_homogeneous`]/[`from_homogeneous`]. Rational inputs therefore get
//! the mathematically correct treatment for free, and non-rational ones
//! (w = 1) pass through unchanged.

use weft_math::DVec4;

use weft_core::{Result, Tolerance, WeftError};

use crate::{basis, knots};

/// Premultiply Euclidean coordinates by their weight.
pub fn to_homogeneous(ctrl: &[DVec4]) -> Vec<DVec4> {
    ctrl.iter()
        .map(|p| DVec4::new(p.x * p.w, p.y * p.w, p.z * p.w, p.w))
        .collect()
}

/// Divide premultiplied coordinates back out by their weight.
pub fn from_homogeneous(ctrl: &[DVec4]) -> Vec<DVec4> {
    ctrl.iter()
        .map(|p| {
            if p.w.abs() < 1e-15 {
                *p
            } else {
                DVec4::new(p.x / p.w, p.y / p.w, p.z / p.w, p.w)
            }
        })
        .collect()
}

fn lerp(a: DVec4, b: DVec4, t: f64) -> DVec4 {
    a * (1.0 - t) + b * t
}

/// Knot refinement (NURBS Book A5.4): insert every value of `insert`
/// (non-decreasing, inside the domain) without changing shape.
pub fn refine_knots(
    order: usize,
    knots: &[f64],
    ctrl: &[DVec4],
    insert: &[f64],
) -> (Vec<f64>, Vec<DVec4>) {
    if insert.is_empty() {
        return (knots.to_vec(), ctrl.to_vec());
    }
    let p = order - 1;
    let n = ctrl.len() - 1;
    let m = n + p + 1;
    let r = insert.len() - 1;
    let a = basis::find_span(order, knots, ctrl.len(), insert[0]);
    let b = basis::find_span(order, knots, ctrl.len(), insert[r]) + 1;

    let mut new_ctrl = vec![DVec4::ZERO; n + r + 2];
    let mut new_knots = vec![0.0; m + r + 2];

    new_ctrl[..(a - p + 1)].copy_from_slice(&ctrl[..(a - p + 1)]);
    for i in (b - 1)..=n {
        new_ctrl[i + r + 1] = ctrl[i];
    }
    new_knots[..(a + 1)].copy_from_slice(&knots[..(a + 1)]);
    for i in (b + p)..=m {
        new_knots[i + r + 1] = knots[i];
    }

    let mut i = b + p - 1;
    let mut k = b + p + r;
    for j in (0..=r).rev() {
        while insert[j] <= knots[i] && i > a {
            new_ctrl[k - p - 1] = ctrl[i - p - 1];
            new_knots[k] = knots[i];
            k -= 1;
            i -= 1;
        }
        new_ctrl[k - p - 1] = new_ctrl[k - p];
        for l in 1..=p {
            let ind = k - p + l;
            let alpha = new_knots[k + l] - insert[j];
            if alpha.abs() < f64::EPSILON {
                new_ctrl[ind - 1] = new_ctrl[ind];
            } else {
                let denom = new_knots[k + l] - knots[i - p + l];
                let ratio = if denom != 0.0 { alpha / denom } else { 0.0 };
                new_ctrl[ind - 1] = lerp(new_ctrl[ind], new_ctrl[ind - 1], ratio);
            }
        }
        new_knots[k] = insert[j];
        k -= 1;
    }

    (new_knots, new_ctrl)
}

/// Insert knot `u` with multiplicity `r`.
///
/// Rejected when `u` lies outside the domain or `r` exceeds
/// `order − multiplicity(u)`.
pub fn insert_knot(
    order: usize,
    knots: &[f64],
    ctrl: &[DVec4],
    u: f64,
    r: usize,
) -> Result<(Vec<f64>, Vec<DVec4>)> {
    if ctrl.is_empty() {
        return Err(WeftError::EmptyArgument("control points"));
    }
    let (lo, hi) = knots::domain(order, knots, ctrl.len());
    if u < lo - Tolerance::KNOT_EPSILON || u > hi + Tolerance::KNOT_EPSILON {
        return Err(WeftError::OperationFailed(format!(
            "knot {} outside domain [{}, {}]",
            u, lo, hi
        )));
    }
    let s = knots::multiplicity(knots, u);
    if r + s > order {
        return Err(WeftError::OperationFailed(format!(
            "insertion to multiplicity {} exceeds order {}",
            r + s,
            order
        )));
    }
    Ok(refine_knots(order, knots, ctrl, &vec![u; r]))
}

/// Iterative knot removal (NURBS Book A5.8).
///
/// Attempts up to `max_count` removals of `u`; each is accepted only if
/// the reconstruction error stays within `tol` (measured in homogeneous
/// space). Stops at the first rejected attempt and returns the number
/// actually removed. Rejection is an ordinary outcome, not an error.
pub fn remove_knot(
    order: usize,
    knots: &[f64],
    ctrl: &[DVec4],
    u: f64,
    max_count: usize,
    tol: f64,
) -> (Vec<f64>, Vec<DVec4>, usize) {
    let p = order - 1;
    let mut knots = knots.to_vec();
    let mut ctrl = ctrl.to_vec();
    let n = ctrl.len() - 1;
    let m = n + p + 1;

    let s = knots::multiplicity(&knots, u);
    let r = match knots.iter().rposition(|&k| Tolerance::knot_eq(k, u)) {
        Some(idx) => idx,
        None => return (knots, ctrl, 0),
    };
    // End knots of a clamped vector are not removable.
    if r <= p || r >= ctrl.len() {
        return (knots, ctrl, 0);
    }
    let tol = tol.max(1e-10);
    let max_count = max_count.min(s);

    let mut first = r - p;
    let mut last = r - s;
    let fout = (2 * r - s - p) / 2;
    let mut temp = vec![DVec4::ZERO; 2 * p + s + 3];

    let mut removed = 0usize;
    for t in 0..max_count {
        if first == 0 {
            break;
        }
        let off = first - 1;
        temp[0] = ctrl[off];
        temp[last + 1 - off] = ctrl[last + 1];
        let mut i = first;
        let mut j = last;
        let mut ii = 1usize;
        let mut jj = last - off;

        while j as isize - i as isize > t as isize {
            let alfi = (u - knots[i]) / (knots[i + order + t] - knots[i]);
            let alfj = (u - knots[j - t]) / (knots[j + order] - knots[j - t]);
            temp[ii] = (ctrl[i] - temp[ii - 1] * (1.0 - alfi)) / alfi;
            temp[jj] = (ctrl[j] - temp[jj + 1] * alfj) / (1.0 - alfj);
            i += 1;
            ii += 1;
            j -= 1;
            jj -= 1;
        }

        let removable = if (j as isize - i as isize) < t as isize {
            temp[ii - 1].distance(temp[jj + 1]) <= tol
        } else {
            let alfi = (u - knots[i]) / (knots[i + order + t] - knots[i]);
            let reconstructed = temp[ii + t + 1] * alfi + temp[ii - 1] * (1.0 - alfi);
            ctrl[i].distance(reconstructed) <= tol
        };
        if !removable {
            break;
        }

        let mut i = first;
        let mut j = last;
        while j as isize - i as isize > t as isize {
            ctrl[i] = temp[i - off];
            ctrl[j] = temp[j - off];
            i += 1;
            j -= 1;
        }
        first -= 1;
        last += 1;
        removed += 1;
    }

    if removed == 0 {
        return (knots, ctrl, 0);
    }

    for k in (r + 1)..=m {
        knots[k - removed] = knots[k];
    }
    knots.truncate(knots.len() - removed);

    let mut j = fout;
    let mut i = j;
    for k in 1..removed {
        if k % 2 == 1 {
            i += 1;
        } else {
            j -= 1;
        }
    }
    for k in (i + 1)..=n {
        ctrl[j] = ctrl[k];
        j += 1;
    }
    ctrl.truncate(ctrl.len() - removed);

    (knots, ctrl, removed)
}

/// Clamp both ends to full multiplicity by inserting the domain-limit
/// knots and discarding the spans outside the domain.
pub fn clamp(order: usize, knots: &[f64], ctrl: &[DVec4]) -> (Vec<f64>, Vec<DVec4>) {
    let (lo, hi) = knots::domain(order, knots, ctrl.len());

    let mut knots = knots.to_vec();
    let mut ctrl = ctrl.to_vec();

    let need_lo = order - knots::multiplicity(&knots, lo).min(order);
    if need_lo > 0 {
        let (k, c) = refine_knots(order, &knots, &ctrl, &vec![lo; need_lo]);
        knots = k;
        ctrl = c;
    }
    let need_hi = order - knots::multiplicity(&knots, hi).min(order);
    if need_hi > 0 {
        let (k, c) = refine_knots(order, &knots, &ctrl, &vec![hi; need_hi]);
        knots = k;
        ctrl = c;
    }

    // Keep only the fully clamped region between the domain limits.
    let start = knots.iter().position(|&k| Tolerance::knot_eq(k, lo)).unwrap();
    let end = knots.iter().rposition(|&k| Tolerance::knot_eq(k, hi)).unwrap();
    let count = end - start + 1 - order;
    let ctrl: Vec<DVec4> = ctrl[start..start + count].to_vec();
    let knots: Vec<f64> = knots[start..=end].to_vec();

    (knots, ctrl)
}

/// Degree elevation by `t` (NURBS Book A5.9). Clamps first when the
/// input is not fully clamped.
pub fn elevate_degree(
    order: usize,
    knots: &[f64],
    ctrl: &[DVec4],
    t: usize,
) -> (Vec<f64>, Vec<DVec4>) {
    if t == 0 {
        return (knots.to_vec(), ctrl.to_vec());
    }
    let (knots, ctrl) = if knots::is_clamped(order, knots) {
        (knots.to_vec(), ctrl.to_vec())
    } else {
        clamp(order, knots, ctrl)
    };

    let p = order - 1;
    let n = ctrl.len() - 1;
    let m = n + p + 1;
    let ph = p + t;
    let ph2 = ph / 2;

    // Bezier coefficients of the elevation.
    let mut bezalfs = vec![vec![0.0; p + 1]; ph + 1];
    bezalfs[0][0] = 1.0;
    bezalfs[ph][p] = 1.0;
    for i in 1..=ph2 {
        let inv = 1.0 / binomial(ph, i);
        for j in i.saturating_sub(t)..=p.min(i) {
            bezalfs[i][j] = inv * binomial(p, j) * binomial(t, i - j);
        }
    }
    for i in (ph2 + 1)..ph {
        for j in i.saturating_sub(t)..=p.min(i) {
            bezalfs[i][j] = bezalfs[ph - i][p - j];
        }
    }

    let cap = ctrl.len() + t * (ctrl.len()) + ph + 3;
    let mut bpts = vec![DVec4::ZERO; p + 1];
    let mut e_bpts = vec![DVec4::ZERO; ph + 1];
    let mut next_bpts = vec![DVec4::ZERO; p.max(1) - 1 + 1];
    let mut alfs = vec![0.0; p.max(1)];
    let mut new_ctrl = vec![DVec4::ZERO; cap];
    let mut new_knots = vec![0.0; cap + ph + 1];

    let mut kind = ph + 1;
    let mut r: isize = -1;
    let mut a = p;
    let mut b = p + 1;
    let mut cind = 1usize;
    let mut ua = knots[0];
    new_ctrl[0] = ctrl[0];
    for k in new_knots.iter_mut().take(ph + 1) {
        *k = ua;
    }
    bpts[..=p].copy_from_slice(&ctrl[..=p]);

    while b < m {
        let i = b;
        while b < m && knots[b] == knots[b + 1] {
            b += 1;
        }
        let mul = b - i + 1;
        let ub = knots[b];
        let oldr = r;
        r = p as isize - mul as isize;
        let lbz = if oldr > 0 { ((oldr + 2) / 2) as usize } else { 1 };
        let rbz = if r > 0 {
            ph - (r as usize + 1) / 2
        } else {
            ph
        };

        // Insert ub to full multiplicity to isolate the Bezier segment.
        if r > 0 {
            let numer = ub - ua;
            let mut k = p;
            while k > mul {
                alfs[k - mul - 1] = numer / (knots[a + k] - ua);
                k -= 1;
            }
            for j in 1..=(r as usize) {
                let save = r as usize - j;
                let s = mul + j;
                let mut k = p;
                while k >= s {
                    bpts[k] = lerp(bpts[k - 1], bpts[k], alfs[k - s]);
                    k -= 1;
                }
                next_bpts[save] = bpts[p];
            }
        }

        // Elevate the segment.
        for i in lbz..=ph {
            e_bpts[i] = DVec4::ZERO;
            for j in i.saturating_sub(t)..=p.min(i) {
                e_bpts[i] += bpts[j] * bezalfs[i][j];
            }
        }

        // Remove the knot ub oldr times.
        if oldr > 1 {
            let mut first = kind - 2;
            let mut last = kind;
            let den = ub - ua;
            let bet = (ub - new_knots[kind - 1]) / den;
            for tr in 1..oldr {
                let mut i = first as isize;
                let mut j = last as isize;
                let mut kj = j - kind as isize + 1;
                while j - i > tr {
                    if (i as usize) < cind {
                        let alf = (ub - new_knots[i as usize]) / (ua - new_knots[i as usize]);
                        new_ctrl[i as usize] =
                            lerp(new_ctrl[i as usize - 1], new_ctrl[i as usize], alf);
                    }
                    if j >= lbz as isize {
                        if j - tr <= kind as isize - ph as isize + oldr {
                            let gam = (ub - new_knots[(j - tr) as usize]) / den;
                            e_bpts[kj as usize] =
                                lerp(e_bpts[kj as usize + 1], e_bpts[kj as usize], gam);
                        } else {
                            e_bpts[kj as usize] =
                                lerp(e_bpts[kj as usize + 1], e_bpts[kj as usize], bet);
                        }
                    }
                    i += 1;
                    j -= 1;
                    kj -= 1;
                }
                first -= 1;
                last += 1;
            }
        }

        // Load the knot ua.
        if a != p {
            for _ in 0..(ph as isize - oldr) {
                new_knots[kind] = ua;
                kind += 1;
            }
        }
        // Load control points.
        for j in lbz..=rbz {
            new_ctrl[cind] = e_bpts[j];
            cind += 1;
        }

        if b < m {
            let ur = r.max(0) as usize;
            bpts[..ur].copy_from_slice(&next_bpts[..ur]);
            for j in ur..=p {
                bpts[j] = ctrl[b - p + j];
            }
            a = b;
            b += 1;
            ua = ub;
        } else {
            for i in 0..=ph {
                new_knots[kind + i] = ub;
            }
        }
    }

    new_ctrl.truncate(cind);
    new_knots.truncate(kind + ph + 1);
    (new_knots, new_ctrl)
}

/// Decompose a clamped curve into its Bezier segments by raising every
/// interior knot to full multiplicity (refinement form of A5.6).
pub fn decompose_bezier(
    order: usize,
    knots: &[f64],
    ctrl: &[DVec4],
) -> (Vec<f64>, Vec<DVec4>) {
    let distinct = knots::distinct_in_domain(order, knots, ctrl.len());
    let mut insert = Vec::new();
    for &u in &distinct[1..distinct.len() - 1] {
        let s = knots::multiplicity(knots, u);
        for _ in s..(order - 1) {
            insert.push(u);
        }
    }
    refine_knots(order, knots, ctrl, &insert)
}

/// Degree reduction by one (Bezier-segment reduction, NURBS Book
/// A5.11 formulation). Accepted only when every segment's reduction
/// error stays within `tol`.
pub fn reduce_degree(
    order: usize,
    knots: &[f64],
    ctrl: &[DVec4],
    tol: f64,
) -> Result<(Vec<f64>, Vec<DVec4>)> {
    let p = order - 1;
    if p < 2 {
        return Err(WeftError::OperationFailed(
            "cannot reduce below order 2".into(),
        ));
    }
    let tol = tol.max(1e-10);

    let (knots, ctrl) = if knots::is_clamped(order, knots) {
        (knots.to_vec(), ctrl.to_vec())
    } else {
        clamp(order, knots, ctrl)
    };
    let (bez_knots, bez_ctrl) = decompose_bezier(order, &knots, &ctrl);
    let distinct = knots::distinct_in_domain(order, &bez_knots, bez_ctrl.len());
    let segments = distinct.len() - 1;

    let q = p - 1; // new degree
    let mut out_ctrl: Vec<DVec4> = Vec::with_capacity(segments * q + 1);
    let mut out_knots: Vec<f64> = Vec::with_capacity(segments * q + 2 * order);

    for seg in 0..segments {
        let b = &bez_ctrl[seg * p..seg * p + p + 1];
        let (reduced, err) = bezier_reduce(b);
        if err > tol {
            return Err(WeftError::OperationFailed(format!(
                "degree reduction error {} exceeds tolerance {}",
                err, tol
            )));
        }
        if seg == 0 {
            out_ctrl.extend_from_slice(&reduced);
        } else {
            // Shared endpoint: average the join for robustness.
            let last = out_ctrl.len() - 1;
            out_ctrl[last] = (out_ctrl[last] + reduced[0]) * 0.5;
            out_ctrl.extend_from_slice(&reduced[1..]);
        }
    }
    // Ends at multiplicity q+1 (the new order), interior boundaries at q.
    out_knots.extend(std::iter::repeat(distinct[0]).take(p));
    for &d in &distinct[1..segments] {
        out_knots.extend(std::iter::repeat(d).take(q));
    }
    out_knots.extend(std::iter::repeat(distinct[segments]).take(p));
    debug_assert_eq!(out_knots.len(), out_ctrl.len() + p);

    // Clean superfluous knots the exact reduction left behind.
    let mut knots_out = out_knots;
    let mut ctrl_out = out_ctrl;
    for &u in &distinct[1..segments] {
        let (k, c, _) = remove_knot(p, &knots_out, &ctrl_out, u, q, tol);
        knots_out = k;
        ctrl_out = c;
    }

    Ok((knots_out, ctrl_out))
}

/// Reduce one Bezier segment of degree `p` to degree `p-1`, returning
/// the reduced points and the maximum error introduced.
fn bezier_reduce(b: &[DVec4]) -> (Vec<DVec4>, f64) {
    let p = b.len() - 1;
    let mut rb = vec![DVec4::ZERO; p];
    let r = (p - 1) / 2;
    let alf = |i: usize| i as f64 / p as f64;

    rb[0] = b[0];
    rb[p - 1] = b[p];

    if p % 2 == 0 {
        for i in 1..=r {
            rb[i] = (b[i] - rb[i - 1] * alf(i)) / (1.0 - alf(i));
        }
        for i in ((r + 1)..=(p - 2)).rev() {
            rb[i] = (b[i + 1] - rb[i + 1] * (1.0 - alf(i + 1))) / alf(i + 1);
        }
        let err = b[r + 1].distance((rb[r] + rb[r + 1]) * 0.5);
        (rb, err)
    } else {
        for i in 1..r {
            rb[i] = (b[i] - rb[i - 1] * alf(i)) / (1.0 - alf(i));
        }
        for i in ((r + 1)..=(p - 2)).rev() {
            rb[i] = (b[i + 1] - rb[i + 1] * (1.0 - alf(i + 1))) / alf(i + 1);
        }
        let pl = (b[r] - rb[r - 1] * alf(r)) / (1.0 - alf(r));
        let pr = (b[r + 1] - rb[r + 1] * (1.0 - alf(r + 1))) / alf(r + 1);
        rb[r] = (pl + pr) * 0.5;
        let err = pl.distance(pr);
        (rb, err)
    }
}

fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut acc = 1.0;
    for i in 0..k {
        acc = acc * (n - i) as f64 / (i + 1) as f64;
    }
    acc
}
