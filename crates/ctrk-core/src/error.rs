//! # Error Types
//!
//! The single error enum surfaced by every tracker store. All failures are
//! local to the call that produced them; nothing here is fatal to the
//! process and no operation retries on its own.
//!
//! - `NotFound` carries the id namespace and the missing id.
//! - `Validation` carries the field-level reason a command was rejected.
//! - `IllegalOperation` marks a well-formed command that a business
//!   invariant forbids (e.g. disabling a mandatory compliance type).

use thiserror::Error;

/// Errors raised by tracker stores and registries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The referenced id does not resolve in its store.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Id namespace (e.g. "compliance", "subscription").
        kind: &'static str,
        /// The id that failed to resolve.
        id: String,
    },

    /// A required field is missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// The command is well-formed but forbidden by a business invariant.
    #[error("illegal operation: {0}")]
    IllegalOperation(String),
}

impl TrackerError {
    /// Construct a `NotFound` error for the given namespace and id.
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Construct a `Validation` error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Construct an `IllegalOperation` error.
    pub fn illegal(msg: impl Into<String>) -> Self {
        Self::IllegalOperation(msg.into())
    }
}

/// Convenience alias used across the store crates.
pub type TrackerResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_kind_and_id() {
        let err = TrackerError::not_found("compliance", "cmp-42");
        assert_eq!(err.to_string(), "compliance cmp-42 not found");
    }

    #[test]
    fn validation_display() {
        let err = TrackerError::validation("due_date is required");
        assert_eq!(err.to_string(), "validation error: due_date is required");
    }

    #[test]
    fn illegal_operation_display() {
        let err = TrackerError::illegal("GST_MONTHLY_RETURN is mandatory");
        assert!(err.to_string().starts_with("illegal operation:"));
    }
}
