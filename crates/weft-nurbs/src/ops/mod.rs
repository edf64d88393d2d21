//! Construction operators: composing the knot algebra into
//! shape-generation tools.

pub mod birail;
pub mod concat;
pub mod extrude;
pub mod fillet;
pub mod gordon;
pub mod offset;
pub mod revolve;
pub mod skin;
pub mod sweep;

pub use birail::{birail1, birail1_periodic, birail2};
pub use concat::{concat_patches, ConcatOptions, FilletKind};
pub use extrude::extrude;
pub use fillet::{fill_gap, set_back, BorderPick};
pub use gordon::gordon;
pub use offset::offset;
pub use revolve::{revolve, swing};
pub use skin::{dual_skin, skin_u, skin_v};
pub use sweep::{sweep, sweep_periodic, SweepOptions};
