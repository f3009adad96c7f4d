//! Error types shared across the pantry crates

use thiserror::Error;

/// Malformed input rejected before it reaches a store or the feasibility engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A measurement or quantity that is zero, negative or not a number
    #[error("{field} must be greater than 0 (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    /// A batch count below one
    #[error("batches must be greater than 0 (got {0})")]
    NonPositiveBatches(i64),
}
