// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types returned by chain adapters.

use super::{ConfigError, FetchError};

/// Errors that can end a chain adapter call.
///
/// Cancellation is not represented here: a cancelled fetch returns
/// `Ok` with a partial [`crate::FetchOutcome`]. Malformed individual records
/// are not represented either; they are logged and skipped.
///
/// # Examples
///
/// ```rust
/// use awakenscan::AdapterError;
///
/// let error = AdapterError::invalid_address("Kaspa", "kaspa:q... (bech32, 61-63 characters)");
/// assert!(error.is_validation());
/// assert_eq!(
///     error.to_string(),
///     "Invalid Kaspa address, expected format kaspa:q... (bech32, 61-63 characters)"
/// );
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The address failed validation. Raised before any network access.
    #[error("Invalid {chain} address, expected format {expected}")]
    InvalidAddress {
        /// Display name of the chain
        chain: String,
        /// Human readable description of the accepted format
        expected: String,
    },

    /// Required configuration (usually a credential) is missing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The upstream provider call failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The adapter does not implement the requested operation.
    #[error("{chain} does not support {operation}")]
    Unsupported {
        /// Display name of the chain
        chain: String,
        /// Operation that was requested
        operation: String,
    },
}

impl AdapterError {
    /// Create an `InvalidAddress` error.
    pub fn invalid_address(chain: impl Into<String>, expected: impl Into<String>) -> Self {
        AdapterError::InvalidAddress {
            chain: chain.into(),
            expected: expected.into(),
        }
    }

    /// Create an `Unsupported` error.
    pub fn unsupported(chain: impl Into<String>, operation: impl Into<String>) -> Self {
        AdapterError::Unsupported {
            chain: chain.into(),
            operation: operation.into(),
        }
    }

    /// Whether this is a validation failure (never retried, no I/O happened).
    pub fn is_validation(&self) -> bool {
        matches!(self, AdapterError::InvalidAddress { .. })
    }

    /// Whether retrying the whole fetch later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterError::Fetch(e) if e.is_transient())
    }
}
