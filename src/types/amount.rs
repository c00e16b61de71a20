// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Conversion of raw smallest-unit amounts into decimal quantities.
//!
//! Upstream APIs report amounts as integer strings in a chain-specific
//! smallest unit (sompi, nanoERG, uatom, planck, wei). Conversion scales the
//! integer by `10^-decimals` exactly, so no precision is lost regardless of the
//! asset's declared decimal count.

use std::str::FromStr;

use alloy_primitives::U256;
use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::errors::ClassificationError;

/// Decimal precision of an asset's smallest unit.
///
/// # Examples
///
/// ```
/// use awakenscan::Decimals;
///
/// assert_eq!(Decimals::KASPA.as_u8(), 8);
/// assert_eq!(Decimals::new(6).as_u8(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Decimals(u8);

impl Decimals {
    /// Kaspa: 1 KAS = 10^8 sompi
    pub const KASPA: Self = Self(8);
    /// Ergo: 1 ERG = 10^9 nanoERG
    pub const ERGO: Self = Self(9);
    /// Cosmos SDK micro denominations (uatom, uosmo)
    pub const COSMOS_MICRO: Self = Self(6);
    /// Polkadot: 1 DOT = 10^10 planck
    pub const POLKADOT: Self = Self(10);
    /// EVM native tokens: 1 ETH = 10^18 wei
    pub const EVM_NATIVE: Self = Self(18);

    pub const fn new(decimals: u8) -> Self {
        Self(decimals)
    }

    pub const fn as_u8(&self) -> u8 {
        self.0
    }
}

/// Convert an integer string in smallest units into a decimal quantity.
///
/// Leading/trailing whitespace is ignored. Only unsigned integers are accepted.
///
/// # Examples
///
/// ```
/// use awakenscan::{to_decimal, Decimals};
/// use bigdecimal::BigDecimal;
/// use std::str::FromStr;
///
/// let kas = to_decimal("999995000", Decimals::KASPA).unwrap();
/// assert_eq!(kas, BigDecimal::from_str("9.99995").unwrap());
/// ```
pub fn to_decimal(raw: &str, decimals: Decimals) -> Result<BigDecimal, ClassificationError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClassificationError::invalid_amount(
            raw,
            "expected an unsigned integer in smallest units",
        ));
    }
    let integer = BigInt::from_str(raw)
        .map_err(|e| ClassificationError::invalid_amount(raw, e.to_string()))?;
    Ok(BigDecimal::new(integer, i64::from(decimals.as_u8())))
}

/// Convert an unsigned integer amount in smallest units.
pub fn u64_to_decimal(raw: u64, decimals: Decimals) -> BigDecimal {
    BigDecimal::new(BigInt::from(raw), i64::from(decimals.as_u8()))
}

/// Convert a U256 amount (wei, token base units) without overflow.
///
/// # Examples
///
/// ```
/// use alloy_primitives::U256;
/// use awakenscan::{u256_to_decimal, Decimals};
/// use bigdecimal::BigDecimal;
///
/// let wei = U256::from(1_500_000_000_000_000_000u128);
/// assert_eq!(u256_to_decimal(wei, Decimals::EVM_NATIVE), "1.5".parse::<BigDecimal>().unwrap());
/// ```
pub fn u256_to_decimal(raw: U256, decimals: Decimals) -> BigDecimal {
    // U256's decimal rendering is always a valid unsigned integer
    let integer = BigInt::from_str(&raw.to_string()).unwrap_or_default();
    BigDecimal::new(integer, i64::from(decimals.as_u8()))
}

/// Parse an already-decimal string (e.g. `"-12.5"` from Hyperliquid).
pub fn parse_decimal(text: &str) -> Result<BigDecimal, ClassificationError> {
    BigDecimal::from_str(text.trim())
        .map_err(|e| ClassificationError::invalid_amount(text, e.to_string()))
}
