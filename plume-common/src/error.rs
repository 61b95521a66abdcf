use thiserror::Error;

/// Construction-time configuration failures. None of these are recoverable:
/// a simulation is never built from parameters that produced one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} has length {actual}, expected {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("swarm must contain at least one agent")]
    EmptySwarm,

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown fly mode value {0}")]
    UnknownMode(u8),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised by batched field queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("x has {x_len} elements but y has {y_len}")]
    ShapeMismatch { x_len: usize, y_len: usize },
}
