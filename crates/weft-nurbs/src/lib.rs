//! Weft NURBS kernel: rational tensor-product surfaces and the curves
//! derived from them.
//!
//! The kernel is synchronous and single-threaded; every operation takes
//! explicit [`Patch`]/[`Curve`] arguments and returns explicit results
//! with no ambient state. Serializing concurrent mutation of the same
//! patch is the caller's responsibility.

use serde::{Deserialize, Serialize};

pub mod basis;
pub mod compat;
pub mod curve;
pub mod extract;
pub mod interpolate;
pub mod knots;
pub mod net;
pub mod ops;
pub mod patch;
pub mod refine;
pub mod split;
pub mod topology;

pub use compat::CompatLevel;
pub use curve::Curve;
pub use knots::KnotType;
pub use net::ControlNet;
pub use patch::{Breakpoint, Patch};

/// Parametric axis selector for operations that work per-direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    U,
    V,
}

impl Axis {
    pub fn other(self) -> Axis {
        match self {
            Axis::U => Axis::V,
            Axis::V => Axis::U,
        }
    }
}

/// Closedness of one parametric axis.
///
/// `Closed` nets wrap by one point across the seam; `Periodic` nets carry
/// order−1 redundant rows/columns exactly mirroring the opposite edge.
/// Neighbor traversal and construction operators match on this once per
/// call instead of dispatching through per-axis function tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisType {
    #[default]
    Open,
    Closed,
    Periodic,
}
