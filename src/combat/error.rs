//! Validation errors for combat operations

use thiserror::Error;

/// Caller-supplied data violates an invariant; the operation was not applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("entity name must not be empty")]
    EmptyName,

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("amount must be positive (got {0})")]
    NonPositiveAmount(i32),

    #[error("participant id must not be empty")]
    EmptyParticipant,
}
