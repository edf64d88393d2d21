pub mod aabb;
pub mod plane;
pub mod transform;

pub use glam::{DMat3, DMat4, DQuat, DVec2, DVec3, DVec4};
pub use aabb::Aabb3;
pub use plane::Plane;
pub use transform::{perpendicular, rotation_between, Transform};

pub type Point2 = DVec2;
pub type Point3 = DVec3;
pub type Vector2 = DVec2;
pub type Vector3 = DVec3;
