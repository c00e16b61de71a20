// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Perpetual futures records for the Awaken perpetuals CSV layout.

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of perpetuals event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerpTag {
    OpenPosition,
    ClosePosition,
    FundingPayment,
}

impl PerpTag {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PerpTag::OpenPosition => "open_position",
            PerpTag::ClosePosition => "close_position",
            PerpTag::FundingPayment => "funding_payment",
        }
    }
}

impl fmt::Display for PerpTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One perpetuals event. `amount` is a magnitude; `pnl` is signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerpTransaction {
    pub date: DateTime<Utc>,
    pub asset: String,
    pub amount: BigDecimal,
    pub fee: Option<BigDecimal>,
    pub pnl: BigDecimal,
    pub payment_token: String,
    pub notes: Option<String>,
    pub tx_hash: Option<String>,
    pub tag: PerpTag,
}

impl PerpTransaction {
    /// Create a record; `amount` and `fee` are stored as magnitudes.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: DateTime<Utc>,
        asset: impl Into<String>,
        amount: BigDecimal,
        fee: Option<BigDecimal>,
        pnl: BigDecimal,
        payment_token: impl Into<String>,
        tx_hash: Option<String>,
        tag: PerpTag,
    ) -> Self {
        Self {
            date,
            asset: asset.into(),
            amount: amount.abs(),
            fee: fee.map(|f| f.abs()),
            pnl,
            payment_token: payment_token.into(),
            notes: None,
            tx_hash,
            tag,
        }
    }

    /// Attach free-text notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
