// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration errors.

/// Errors raised while building or reading configuration.
///
/// A missing credential is fatal for the call that needs it and is raised
/// before any network attempt.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A provider credential is required but was not supplied.
    #[error("{chain} requires an API key; set {variable}")]
    MissingCredential {
        /// Display name of the chain that needs it
        chain: String,
        /// Environment variable that supplies it
        variable: String,
    },

    /// A configuration value could not be used.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the offending field
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ConfigError {
    /// Create a `MissingCredential` error.
    pub fn missing_credential(chain: impl Into<String>, variable: impl Into<String>) -> Self {
        ConfigError::MissingCredential {
            chain: chain.into(),
            variable: variable.into(),
        }
    }

    /// Create an `InvalidValue` error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
