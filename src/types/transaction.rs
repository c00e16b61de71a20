// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Canonical transaction record shared by every chain adapter.

use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Economic classification of a transaction.
///
/// The type stays reassignable after construction so that records in the
/// `other` bucket can be reclassified by the user (see
/// [`Transaction::reclassify`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Send,
    Receive,
    Trade,
    LpAdd,
    LpRemove,
    Stake,
    Unstake,
    Claim,
    Bridge,
    Approval,
    Other,
}

impl TransactionType {
    /// All variants, in declaration order.
    pub const ALL: [TransactionType; 11] = [
        TransactionType::Send,
        TransactionType::Receive,
        TransactionType::Trade,
        TransactionType::LpAdd,
        TransactionType::LpRemove,
        TransactionType::Stake,
        TransactionType::Unstake,
        TransactionType::Claim,
        TransactionType::Bridge,
        TransactionType::Approval,
        TransactionType::Other,
    ];

    /// Wire name of the type (`"lp_add"`, `"send"`, ...).
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Send => "send",
            TransactionType::Receive => "receive",
            TransactionType::Trade => "trade",
            TransactionType::LpAdd => "lp_add",
            TransactionType::LpRemove => "lp_remove",
            TransactionType::Stake => "stake",
            TransactionType::Unstake => "unstake",
            TransactionType::Claim => "claim",
            TransactionType::Bridge => "bridge",
            TransactionType::Approval => "approval",
            TransactionType::Other => "other",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown transaction type: {s}"))
    }
}

/// A quantity of one currency. The quantity is always a non-negative magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub quantity: BigDecimal,
    pub currency: String,
}

impl AssetAmount {
    /// Create an amount, storing the magnitude of `quantity`.
    pub fn new(quantity: BigDecimal, currency: impl Into<String>) -> Self {
        Self {
            quantity: quantity.abs(),
            currency: currency.into(),
        }
    }
}

/// An extra leg of a multi-asset transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalAsset {
    pub quantity: BigDecimal,
    pub currency: String,
    pub fiat_amount: Option<BigDecimal>,
}

impl AdditionalAsset {
    /// Create an extra leg without a fiat valuation.
    pub fn new(quantity: BigDecimal, currency: impl Into<String>) -> Self {
        Self {
            quantity: quantity.abs(),
            currency: currency.into(),
            fiat_amount: None,
        }
    }
}

/// The canonical, chain-agnostic transaction record.
///
/// Direction is encoded by which leg holds a value (`sent` vs `received`),
/// never by sign. Construct through [`Transaction::builder`], which enforces
/// that a record carries some economic content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub sent: Option<AssetAmount>,
    pub received: Option<AssetAmount>,
    pub fee: Option<AssetAmount>,
    pub tx_hash: Option<String>,
    pub notes: Option<String>,
    pub tag: Option<String>,
    #[serde(default)]
    pub additional_sent: Vec<AdditionalAsset>,
    #[serde(default)]
    pub additional_received: Vec<AdditionalAsset>,
}

impl Transaction {
    /// Start building a transaction of the given type.
    pub fn builder(date: DateTime<Utc>, kind: TransactionType) -> TransactionBuilder {
        TransactionBuilder::new(date, kind)
    }

    /// Reassign the economic type (user-driven reclassification).
    pub fn reclassify(&mut self, kind: TransactionType) {
        self.kind = kind;
    }

    /// Whether the record carries extra legs and needs the multi-asset CSV layout.
    pub fn has_additional_assets(&self) -> bool {
        !self.additional_sent.is_empty() || !self.additional_received.is_empty()
    }

    /// Number of received assets, counting the primary leg.
    pub fn received_count(&self) -> usize {
        usize::from(self.received.is_some()) + self.additional_received.len()
    }

    /// Number of sent assets, counting the primary leg.
    pub fn sent_count(&self) -> usize {
        usize::from(self.sent.is_some()) + self.additional_sent.len()
    }

    /// Received legs in column order: the primary leg first, then the extras.
    pub fn received_legs(&self) -> Vec<AdditionalAsset> {
        legs(self.received.as_ref(), &self.additional_received)
    }

    /// Sent legs in column order: the primary leg first, then the extras.
    pub fn sent_legs(&self) -> Vec<AdditionalAsset> {
        legs(self.sent.as_ref(), &self.additional_sent)
    }
}

fn legs(primary: Option<&AssetAmount>, extra: &[AdditionalAsset]) -> Vec<AdditionalAsset> {
    primary
        .map(|a| AdditionalAsset::new(a.quantity.clone(), a.currency.clone()))
        .into_iter()
        .chain(extra.iter().cloned())
        .collect()
}

/// Builder for [`Transaction`].
///
/// Zero-quantity legs are dropped, negative quantities are stored as
/// magnitudes, and [`build`](Self::build) returns `None` when nothing of
/// economic value is left.
///
/// # Examples
///
/// ```rust
/// use awakenscan::{Transaction, TransactionType};
/// use bigdecimal::BigDecimal;
/// use chrono::Utc;
///
/// let tx = Transaction::builder(Utc::now(), TransactionType::Send)
///     .sent(BigDecimal::from(5), "KAS")
///     .tx_hash("abc")
///     .build()
///     .unwrap();
/// assert_eq!(tx.sent.unwrap().currency, "KAS");
///
/// let empty = Transaction::builder(Utc::now(), TransactionType::Other)
///     .sent(BigDecimal::from(0), "KAS")
///     .build();
/// assert!(empty.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx: Transaction,
}

impl TransactionBuilder {
    fn new(date: DateTime<Utc>, kind: TransactionType) -> Self {
        Self {
            tx: Transaction {
                date,
                kind,
                sent: None,
                received: None,
                fee: None,
                tx_hash: None,
                notes: None,
                tag: None,
                additional_sent: Vec::new(),
                additional_received: Vec::new(),
            },
        }
    }

    pub fn sent(mut self, quantity: BigDecimal, currency: impl Into<String>) -> Self {
        self.tx.sent = non_zero(quantity, currency);
        self
    }

    pub fn received(mut self, quantity: BigDecimal, currency: impl Into<String>) -> Self {
        self.tx.received = non_zero(quantity, currency);
        self
    }

    pub fn fee(mut self, quantity: BigDecimal, currency: impl Into<String>) -> Self {
        self.tx.fee = non_zero(quantity, currency);
        self
    }

    /// Set the fee only when one was paid.
    pub fn maybe_fee(self, fee: Option<AssetAmount>) -> Self {
        match fee {
            Some(fee) => self.fee(fee.quantity, fee.currency),
            None => self,
        }
    }

    pub fn additional_sent(mut self, quantity: BigDecimal, currency: impl Into<String>) -> Self {
        if !quantity.is_zero() {
            self.tx
                .additional_sent
                .push(AdditionalAsset::new(quantity, currency));
        }
        self
    }

    pub fn additional_received(mut self, quantity: BigDecimal, currency: impl Into<String>) -> Self {
        if !quantity.is_zero() {
            self.tx
                .additional_received
                .push(AdditionalAsset::new(quantity, currency));
        }
        self
    }

    pub fn tx_hash(mut self, hash: impl Into<String>) -> Self {
        self.tx.tx_hash = Some(hash.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        if !notes.is_empty() {
            self.tx.notes = Some(notes);
        }
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tx.tag = Some(tag.into());
        self
    }

    /// Finish the record, or `None` if it holds no quantity and no fee.
    pub fn build(self) -> Option<Transaction> {
        let tx = self.tx;
        let has_content = tx.sent.is_some()
            || tx.received.is_some()
            || tx.fee.is_some()
            || tx.has_additional_assets();
        has_content.then_some(tx)
    }

    /// Finish the record even if it moves nothing, for activity that must
    /// stay visible (unrecognized messages).
    pub fn finish(self) -> Transaction {
        self.tx
    }
}

fn non_zero(quantity: BigDecimal, currency: impl Into<String>) -> Option<AssetAmount> {
    (!quantity.is_zero()).then(|| AssetAmount::new(quantity, currency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn builder_stores_magnitudes() {
        let tx = Transaction::builder(date(), TransactionType::Send)
            .sent(BigDecimal::from(-3), "ATOM")
            .build()
            .unwrap();
        assert_eq!(tx.sent.unwrap().quantity, BigDecimal::from(3));
    }

    #[test]
    fn fee_only_transaction_is_kept() {
        let tx = Transaction::builder(date(), TransactionType::Other)
            .fee(BigDecimal::from(1), "ETH")
            .build();
        assert!(tx.is_some());
    }

    #[test]
    fn empty_transaction_is_rejected() {
        let tx = Transaction::builder(date(), TransactionType::Receive)
            .tx_hash("0xabc")
            .notes("nothing moved")
            .build();
        assert!(tx.is_none());
    }

    #[test]
    fn finish_keeps_an_empty_record() {
        let tx = Transaction::builder(date(), TransactionType::Other)
            .notes("/cosmos.unknown.MsgThing")
            .finish();
        assert!(tx.sent.is_none() && tx.received.is_none() && tx.fee.is_none());
        assert_eq!(tx.notes.as_deref(), Some("/cosmos.unknown.MsgThing"));
    }

    #[test]
    fn type_remains_reassignable() {
        let mut tx = Transaction::builder(date(), TransactionType::Other)
            .received(BigDecimal::from(1), "OSMO")
            .build()
            .unwrap();
        tx.reclassify(TransactionType::Claim);
        assert_eq!(tx.kind, TransactionType::Claim);
    }

    #[test]
    fn leg_counts_include_primary() {
        let tx = Transaction::builder(date(), TransactionType::Trade)
            .sent(BigDecimal::from(1), "ERG")
            .received(BigDecimal::from(2), "SigUSD")
            .additional_received(BigDecimal::from(3), "SigRSV")
            .build()
            .unwrap();
        assert_eq!(tx.sent_count(), 1);
        assert_eq!(tx.received_count(), 2);
        assert!(tx.has_additional_assets());
        assert_eq!(tx.received_legs()[1].currency, "SigRSV");
    }

    #[test]
    fn type_names_round_trip() {
        for kind in TransactionType::ALL {
            assert_eq!(kind.as_str().parse::<TransactionType>().unwrap(), kind);
        }
        assert!("swap".parse::<TransactionType>().is_err());
    }
}
