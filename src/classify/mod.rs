// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Classification engine shared by the chain adapters.
//!
//! Chain-specific classifiers live next to their adapters. This module holds
//! what several of them share:
//!
//! - [`netting`]: per-asset UTXO netting (Kaspa, Ergo) also used to merge
//!   EVM native and token transfers
//! - timestamp conversion with record context for error messages
//!
//! Classification functions are pure: the same raw record always yields a
//! structurally equal result.

use chrono::{DateTime, Utc};

use crate::errors::ClassificationError;

pub mod netting;

/// Convert a Unix timestamp in milliseconds.
pub fn from_millis(millis: i64, record: &str) -> Result<DateTime<Utc>, ClassificationError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| ClassificationError::invalid_timestamp(millis, record))
}

/// Convert a Unix timestamp in seconds.
pub fn from_secs(secs: i64, record: &str) -> Result<DateTime<Utc>, ClassificationError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| ClassificationError::invalid_timestamp(secs, record))
}

/// Parse an RFC 3339 timestamp (`2024-01-02T03:04:05Z`).
pub fn from_rfc3339(text: &str, record: &str) -> Result<DateTime<Utc>, ClassificationError> {
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| ClassificationError::invalid_timestamp(text, record))
}

/// Parse a decimal string holding a Unix timestamp in seconds (Etherscan style).
pub fn from_secs_str(text: &str, record: &str) -> Result<DateTime<Utc>, ClassificationError> {
    let secs = text
        .trim()
        .parse::<i64>()
        .map_err(|_| ClassificationError::invalid_timestamp(text, record))?;
    from_secs(secs, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn converts_millis_and_secs() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(from_millis(1_704_164_645_000, "r").unwrap(), expected);
        assert_eq!(from_secs(1_704_164_645, "r").unwrap(), expected);
        assert_eq!(from_secs_str("1704164645", "r").unwrap(), expected);
        assert_eq!(from_rfc3339("2024-01-02T03:04:05Z", "r").unwrap(), expected);
    }

    #[test]
    fn rejects_garbage() {
        assert!(from_secs_str("soon", "r").is_err());
        assert!(from_rfc3339("yesterday", "r").is_err());
        assert!(from_millis(i64::MAX, "r").is_err());
    }
}
