// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the awakenscan library.
//!
//! This module follows a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained handling ([`FetchError`],
//!   [`AdapterError`], [`ConfigError`], ...)
//! - **Unified error type** ([`ExportError`]) for callers that don't need to
//!   distinguish between error sources
//!
//! # Taxonomy
//!
//! | Situation | Type | Retried |
//! |-----------|------|---------|
//! | Malformed address | [`AdapterError::InvalidAddress`] | never |
//! | Missing API key | [`ConfigError::MissingCredential`] | never |
//! | HTTP 429/5xx, network failure | [`FetchError::Transient`] | yes, then fatal |
//! | Other HTTP 4xx | [`FetchError::ProviderClient`] | never |
//! | One malformed record | [`ClassificationError`] | skipped and logged |
//! | Cancellation | not an error, see [`crate::Completion::Cancelled`] | - |
//!
//! # Example
//!
//! ```rust,ignore
//! use awakenscan::{AdapterError, AdapterRegistry, FetchOptions};
//!
//! match adapter.fetch_transactions(address, &FetchOptions::default()).await {
//!     Ok(outcome) => println!("{} transactions", outcome.transactions.len()),
//!     Err(AdapterError::InvalidAddress { expected, .. }) => eprintln!("expected {expected}"),
//!     Err(e) if e.is_retryable() => eprintln!("provider unavailable, try again: {e}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

mod adapter;
mod classify;
mod config;
mod fetch;
mod registry;

pub use adapter::AdapterError;
pub use classify::ClassificationError;
pub use config::ConfigError;
pub use fetch::{extract_error_detail, FetchError};
pub use registry::RegistryError;

/// Unified error type for all awakenscan operations.
///
/// All module-specific error types convert to `ExportError` via `From`, so `?`
/// works across module boundaries.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Error from a chain adapter.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Error from the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested chain id is not registered.
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),
}

impl From<FetchError> for ExportError {
    fn from(error: FetchError) -> Self {
        ExportError::Adapter(AdapterError::Fetch(error))
    }
}
