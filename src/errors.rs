// Copyright 2025 Cowboy AI, LLC.

//! Error types for domain operations

use std::fmt;
use thiserror::Error;

/// A required measurement field a line item is still missing
///
/// Carried by [`DomainError::IncompleteMeasurement`] so callers can tell
/// the submitting user exactly which fields block the transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMeasurement {
    /// Product key of the incomplete line item
    pub product: String,
    /// Name of the field that has no value yet
    pub field: String,
}

impl MissingMeasurement {
    /// Create a missing-field record
    pub fn new(product: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for MissingMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.product, self.field)
    }
}

fn format_missing(missing: &[MissingMeasurement]) -> String {
    missing
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur in domain operations
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Validation error (missing required customer field, zero total, malformed value)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Submitted value outside the field's declared domain
    #[error("Value {value:?} is outside the domain of {product}.{field}")]
    OutOfDomainValue {
        /// Product key of the rejected line item
        product: String,
        /// Field whose domain was violated
        field: String,
        /// The rejected value, as submitted
        value: String,
    },

    /// Product key absent from the catalog
    #[error("Unknown product: {key}")]
    UnknownProduct {
        /// The key that was looked up
        key: String,
    },

    /// Order id not present in the repository
    #[error("Order {id} is not registered")]
    NotFound {
        /// The id that was searched for
        id: u64,
    },

    /// Measurement fields still missing for quantity>0 line items
    #[error("Incomplete measurement: missing {}", format_missing(.missing))]
    IncompleteMeasurement {
        /// The product/field pairs that still need values
        missing: Vec<MissingMeasurement>,
    },

    /// Mutation attempted on a completed order
    #[error("Order {id} is completed and locked against changes")]
    OrderLocked {
        /// Id of the locked order
        id: u64,
    },

    /// Invalid state transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
    },

    /// Repository I/O failure (retryable)
    #[error("Repository unavailable: {message}")]
    RepositoryUnavailable {
        /// Error message from the store
        message: String,
    },

    /// Address lookup failure (retryable)
    #[error("Address lookup unavailable: {message}")]
    LookupUnavailable {
        /// Error message from the lookup service
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::ValidationError(msg.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            DomainError::ValidationError(_) | DomainError::OutOfDomainValue { .. }
        )
    }

    /// Check if retrying the same operation may succeed
    ///
    /// True only for transient collaborator failures. Guard rejections
    /// (locked order, incomplete measurement) are not retryable: the
    /// state has to change first.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::RepositoryUnavailable { .. } | DomainError::LookupUnavailable { .. }
        )
    }
}
