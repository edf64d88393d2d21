use crate::{DMat4, DQuat, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Affine transform (rotation + translation + scale).
///
/// Construction operators accumulate per-section frames as quaternions
/// and only build the matrix when applying it to a control row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Transform {
    pub matrix: [f64; 16],
}

impl Transform {
    pub fn identity() -> Self {
        Self::from_mat4(DMat4::IDENTITY)
    }

    pub fn from_translation(t: Vector3) -> Self {
        Self::from_mat4(DMat4::from_translation(t))
    }

    pub fn from_scale(s: Vector3) -> Self {
        Self::from_mat4(DMat4::from_scale(s))
    }

    pub fn from_quat(q: DQuat) -> Self {
        Self::from_mat4(DMat4::from_quat(q))
    }

    pub fn from_axis_angle(axis: Vector3, angle: f64) -> Self {
        Self::from_mat4(DMat4::from_axis_angle(axis, angle))
    }

    pub fn from_mat4(m: DMat4) -> Self {
        Self {
            matrix: m.to_cols_array(),
        }
    }

    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from_cols_array(&self.matrix)
    }

    pub fn transform_point(&self, p: Point3) -> Point3 {
        self.to_mat4().transform_point3(p)
    }

    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        self.to_mat4().transform_vector3(v)
    }

    /// `self` first, then `other`.
    pub fn then(&self, other: &Transform) -> Transform {
        Self::from_mat4(other.to_mat4() * self.to_mat4())
    }

    pub fn inverse(&self) -> Option<Transform> {
        let m = self.to_mat4();
        if m.determinant().abs() < 1e-15 {
            None
        } else {
            Some(Self::from_mat4(m.inverse()))
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Quaternion rotating `from` onto `to`, both assumed normalized.
///
/// Returns the identity for (near-)parallel inputs and a half-turn about
/// an arbitrary perpendicular axis for anti-parallel inputs, so frame
/// accumulation never produces NaN at inflections.
pub fn rotation_between(from: Vector3, to: Vector3) -> DQuat {
    let dot = from.dot(to).clamp(-1.0, 1.0);
    if dot > 1.0 - 1e-12 {
        return DQuat::IDENTITY;
    }
    if dot < -1.0 + 1e-12 {
        let axis = perpendicular(from);
        return DQuat::from_axis_angle(axis, std::f64::consts::PI);
    }
    let axis = from.cross(to).normalize();
    DQuat::from_axis_angle(axis, dot.acos())
}

/// Any unit vector perpendicular to `v`.
pub fn perpendicular(v: Vector3) -> Vector3 {
    let candidate = if v.x.abs() < 0.9 {
        Vector3::X
    } else {
        Vector3::Y
    };
    v.cross(candidate).normalize()
}
