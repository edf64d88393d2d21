pub mod error;
pub mod tolerance;
pub mod traits;

pub use error::{Result, WeftError};
pub use tolerance::Tolerance;
