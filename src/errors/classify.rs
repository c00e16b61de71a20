// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Errors from classifying a single raw provider record.
//!
//! These never abort a fetch. Pagination handlers log them at `warn` and
//! continue with the next record.

/// Errors that can occur while turning one raw record into a transaction.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    /// A field required for classification is missing.
    #[error("Missing field {field} in record {record}")]
    MissingField {
        /// Name of the missing field
        field: String,
        /// Identifier of the record (usually its hash)
        record: String,
    },

    /// An amount string could not be parsed.
    #[error("Invalid amount {value:?}: {reason}")]
    InvalidAmount {
        /// The raw amount text
        value: String,
        /// Why parsing failed
        reason: String,
    },

    /// A timestamp could not be converted to a UTC instant.
    #[error("Invalid timestamp {value:?} in record {record}")]
    InvalidTimestamp {
        /// The raw timestamp text
        value: String,
        /// Identifier of the record
        record: String,
    },
}

impl ClassificationError {
    /// Create a `MissingField` error.
    pub fn missing_field(field: impl Into<String>, record: impl Into<String>) -> Self {
        ClassificationError::MissingField {
            field: field.into(),
            record: record.into(),
        }
    }

    /// Create an `InvalidAmount` error.
    pub fn invalid_amount(value: impl Into<String>, reason: impl Into<String>) -> Self {
        ClassificationError::InvalidAmount {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an `InvalidTimestamp` error.
    pub fn invalid_timestamp(value: impl ToString, record: impl Into<String>) -> Self {
        ClassificationError::InvalidTimestamp {
            value: value.to_string(),
            record: record.into(),
        }
    }
}
