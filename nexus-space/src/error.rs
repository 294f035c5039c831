//! Errors for fallible range construction.

use thiserror::Error;

/// Error building a range from text or from mixed endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// Text that is not an IPv4 or IPv6 address.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// Network prefix longer than the address, or not a number.
    #[error("invalid prefix length: {0:?}")]
    InvalidPrefix(String),

    /// Endpoints from different address families.
    #[error("address family mismatch between range endpoints")]
    FamilyMismatch,

    /// Minimum greater than maximum.
    #[error("range minimum is greater than maximum")]
    Inverted,
}
