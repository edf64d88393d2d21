use thiserror::Error;

/// Closed error taxonomy of the kernel.
///
/// `OperationFailed` covers numerically rejected steps (knot removal or
/// degree reduction outside tolerance, a fillet that cannot be built).
/// Callers iterating such steps treat it as normal termination.
#[derive(Debug, Error)]
pub enum WeftError {
    #[error("empty argument: {0}")]
    EmptyArgument(&'static str),

    #[error("type mismatch: {0}")]
    TypeMismatch(&'static str),

    #[error("invalid knot vector: {0}")]
    InvalidKnots(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),
}

pub type Result<T> = std::result::Result<T, WeftError>;
