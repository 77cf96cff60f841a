//! Error taxonomy for the catalog engine.
//!
//! Category-name resolution failure is deliberately *not* an error: an
//! unresolvable name selects zero rows instead (see `query::translate`).

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from the backing product store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// The store rejected the query.
    #[error("query rejected: {0}")]
    Rejected(String),

    /// The fetch did not complete within the configured timeout, including
    /// the retry attempt.
    #[error("fetch timed out after {attempts} attempt(s)")]
    TimedOut { attempts: u32 },

    /// Database operation failed.
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Top-level error type for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Malformed price bounds, rejected before any query is issued.
    #[error("invalid price bounds: minimum {min} exceeds maximum {max}")]
    InvalidPriceBounds { min: Decimal, max: Decimal },

    /// A fetch against the product store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::InvalidPriceBounds {
            min: Decimal::from(100),
            max: Decimal::from(10),
        };
        assert_eq!(
            err.to_string(),
            "invalid price bounds: minimum 100 exceeds maximum 10"
        );

        let err = StoreError::TimedOut { attempts: 2 };
        assert_eq!(err.to_string(), "fetch timed out after 2 attempt(s)");
    }
}
