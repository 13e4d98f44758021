// src/errors.rs

// error handling for the leaky bucket types

// dependencies
use crate::clock::ClockError;

/// Error type for bucket configuration and decision calls.
/// Running out of room is not an error; it is reported as a rejected decision.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LeakyBucketError {
    /// `capacity`, `leak_rate` or `cost` was zero, negative or not finite.
    #[error("{name} must be a positive finite number, got {value}")]
    InvalidArgument { name: &'static str, value: f64 },
    #[error("clock error: {0}")]
    Clock(#[from] ClockError),
}

impl LeakyBucketError {
    pub(crate) fn invalid(name: &'static str, value: f64) -> Self {
        LeakyBucketError::InvalidArgument { name, value }
    }
}

// positive and finite; NaN fails both comparisons
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<f64, LeakyBucketError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(LeakyBucketError::invalid(name, value))
    }
}
