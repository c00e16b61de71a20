// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Per-asset netting of UTXO inputs and outputs for one address.
//!
//! A UTXO transaction does not say "Alice sent Bob 5 KAS". It says which
//! boxes were consumed and which were created. [`AssetLedger`] sums the
//! boxes the target address owns on each side, per asset, together with the
//! all-party totals of the native asset so the miner fee can be derived.
//! [`classify`] turns the net effect into at most one [`Transaction`].
//!
//! The same ledger is used for account-model chains whose transfers arrive
//! as separate lists for one hash (EVM normal and token transfers): every
//! outgoing transfer is an "input" of the address and every incoming one an
//! "output".

use bigdecimal::{BigDecimal, Signed, Zero};
use chrono::{DateTime, Utc};

use crate::types::transaction::{AssetAmount, Transaction, TransactionType};

/// Sums for one asset.
#[derive(Debug, Clone, PartialEq)]
struct AssetEntry {
    asset_id: String,
    currency: String,
    input_sum: BigDecimal,
    output_sum: BigDecimal,
}

/// Accumulates one transaction's inputs and outputs from the point of view of
/// one address.
///
/// The native asset always comes first in the result legs; tokens keep the
/// order in which they were first seen.
#[derive(Debug, Clone)]
pub struct AssetLedger {
    native_currency: String,
    entries: Vec<AssetEntry>,
    native_total_in: BigDecimal,
    native_total_out: BigDecimal,
    explicit_fee: Option<BigDecimal>,
    address_spent: bool,
    touched: bool,
    coinbase: bool,
}

impl AssetLedger {
    /// New ledger for a chain whose native coin is displayed as `native_currency`.
    pub fn new(native_currency: impl Into<String>) -> Self {
        let native_currency = native_currency.into();
        Self {
            entries: vec![AssetEntry {
                asset_id: native_currency.clone(),
                currency: native_currency.clone(),
                input_sum: BigDecimal::zero(),
                output_sum: BigDecimal::zero(),
            }],
            native_currency,
            native_total_in: BigDecimal::zero(),
            native_total_out: BigDecimal::zero(),
            explicit_fee: None,
            address_spent: false,
            touched: false,
            coinbase: false,
        }
    }

    /// Mark the transaction as a coinbase/block reward (no inputs, no fee).
    pub fn mark_coinbase(&mut self) {
        self.coinbase = true;
    }

    /// Use a fee reported by the chain instead of deriving it from the totals.
    pub fn set_explicit_fee(&mut self, fee: BigDecimal) {
        self.explicit_fee = Some(fee.abs());
    }

    /// Record a native-coin input. `owned` is true when the target address spent it.
    pub fn add_native_input(&mut self, owned: bool, amount: BigDecimal) {
        self.native_total_in += &amount;
        if owned {
            self.address_spent = true;
            self.touched = true;
            self.entries[0].input_sum += amount;
        }
    }

    /// Record a native-coin output. `owned` is true when it pays the target address.
    pub fn add_native_output(&mut self, owned: bool, amount: BigDecimal) {
        self.native_total_out += &amount;
        if owned {
            self.touched = true;
            self.entries[0].output_sum += amount;
        }
    }

    /// Record a token amount spent by the target address.
    pub fn add_token_input(&mut self, asset_id: &str, currency: &str, amount: BigDecimal) {
        self.address_spent = true;
        self.touched = true;
        self.entry_mut(asset_id, currency).input_sum += amount;
    }

    /// Record a token amount received by the target address.
    pub fn add_token_output(&mut self, asset_id: &str, currency: &str, amount: BigDecimal) {
        self.touched = true;
        self.entry_mut(asset_id, currency).output_sum += amount;
    }

    /// Whether the address appeared on either side for any asset.
    pub fn involves_address(&self) -> bool {
        self.touched
    }

    /// Whether the address funded any input.
    pub fn address_spent(&self) -> bool {
        self.address_spent
    }

    /// Sum of owned native inputs.
    pub fn native_input_sum(&self) -> &BigDecimal {
        &self.entries[0].input_sum
    }

    /// Sum of owned native outputs.
    pub fn native_output_sum(&self) -> &BigDecimal {
        &self.entries[0].output_sum
    }

    /// Fee paid by the address, in the native coin.
    ///
    /// Coinbase transactions and transactions the address did not fund pay no
    /// fee. Otherwise the explicit fee wins, and the fallback is
    /// `sum(all native inputs) - sum(all native outputs)`.
    pub fn fee(&self) -> Option<BigDecimal> {
        if self.coinbase || !self.address_spent {
            return None;
        }
        let fee = match &self.explicit_fee {
            Some(fee) => fee.clone(),
            None => &self.native_total_in - &self.native_total_out,
        };
        fee.is_positive().then_some(fee)
    }

    fn entry_mut(&mut self, asset_id: &str, currency: &str) -> &mut AssetEntry {
        let index = match self.entries.iter().position(|e| e.asset_id == asset_id) {
            Some(index) => index,
            None => {
                self.entries.push(AssetEntry {
                    asset_id: asset_id.to_string(),
                    currency: currency.to_string(),
                    input_sum: BigDecimal::zero(),
                    output_sum: BigDecimal::zero(),
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }

    /// Net movement per asset, excluding the fee.
    pub fn net_effect(&self) -> NetEffect {
        let fee = self.fee();
        let mut decreased = Vec::new();
        let mut increased = Vec::new();

        for (index, entry) in self.entries.iter().enumerate() {
            let mut delta = &entry.output_sum - &entry.input_sum;
            if index == 0 {
                if let Some(fee) = &fee {
                    delta += fee;
                }
            }
            if delta.is_negative() {
                decreased.push(AssetAmount::new(delta, entry.currency.clone()));
            } else if delta.is_positive() {
                increased.push(AssetAmount::new(delta, entry.currency.clone()));
            }
        }

        NetEffect {
            decreased,
            increased,
            fee: fee.map(|f| AssetAmount::new(f, self.native_currency.clone())),
        }
    }
}

/// What one transaction did to one address.
#[derive(Debug, Clone, PartialEq)]
pub struct NetEffect {
    /// Assets the address lost, native first
    pub decreased: Vec<AssetAmount>,
    /// Assets the address gained, native first
    pub increased: Vec<AssetAmount>,
    /// Fee paid by the address
    pub fee: Option<AssetAmount>,
}

impl NetEffect {
    /// Economic type implied by the movement.
    ///
    /// Opposite movement of different assets is treated as a trade. This can
    /// misclassify multi-purpose transactions (a deposit that returns change in
    /// another token); such records can be reclassified afterwards.
    pub fn kind(&self) -> TransactionType {
        match (self.decreased.is_empty(), self.increased.is_empty()) {
            (false, false) => TransactionType::Trade,
            (false, true) => TransactionType::Send,
            (true, false) => TransactionType::Receive,
            (true, true) => TransactionType::Other,
        }
    }
}

/// Classify a netted transaction.
///
/// Returns `None` when the address is not involved or nothing of value moved.
///
/// # Examples
///
/// ```rust
/// use awakenscan::classify::netting::{classify, AssetLedger};
/// use awakenscan::{to_decimal, Decimals, TransactionType};
/// use bigdecimal::BigDecimal;
/// use chrono::Utc;
///
/// let mut ledger = AssetLedger::new("KAS");
/// ledger.add_native_input(true, to_decimal("1000000000", Decimals::KASPA).unwrap());
/// ledger.add_native_output(false, to_decimal("999995000", Decimals::KASPA).unwrap());
///
/// let tx = classify(&ledger, Utc::now(), "abc").unwrap();
/// assert_eq!(tx.kind, TransactionType::Send);
/// assert_eq!(tx.sent.unwrap().quantity, "9.99995".parse::<BigDecimal>().unwrap());
/// ```
pub fn classify(ledger: &AssetLedger, date: DateTime<Utc>, tx_hash: &str) -> Option<Transaction> {
    if !ledger.involves_address() {
        return None;
    }

    let effect = ledger.net_effect();
    let kind = effect.kind();

    let mut builder = Transaction::builder(date, kind)
        .tx_hash(tx_hash)
        .maybe_fee(effect.fee);

    let mut sent = effect.decreased.into_iter();
    if let Some(primary) = sent.next() {
        builder = builder.sent(primary.quantity, primary.currency);
    }
    for extra in sent {
        builder = builder.additional_sent(extra.quantity, extra.currency);
    }

    let mut received = effect.increased.into_iter();
    if let Some(primary) = received.next() {
        builder = builder.received(primary.quantity, primary.currency);
    }
    for extra in received {
        builder = builder.additional_received(extra.quantity, extra.currency);
    }

    if kind == TransactionType::Other {
        builder = builder.notes("Self-transfer");
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::amount::{to_decimal, Decimals};
    use chrono::TimeZone;
    use std::str::FromStr;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
    }

    fn kas(sompi: &str) -> BigDecimal {
        to_decimal(sompi, Decimals::KASPA).unwrap()
    }

    fn dec(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    #[test]
    fn spend_without_change_is_send_net_of_fee() {
        let mut ledger = AssetLedger::new("KAS");
        ledger.add_native_input(true, kas("1000000000"));
        ledger.add_native_output(false, kas("999995000"));

        let tx = classify(&ledger, date(), "h").unwrap();
        assert_eq!(tx.kind, TransactionType::Send);
        assert_eq!(tx.sent.unwrap().quantity, dec("9.99995"));
        let fee = tx.fee.unwrap();
        assert_eq!(fee.quantity, dec("0.00005"));
        assert_eq!(fee.currency, "KAS");
        assert!(tx.received.is_none());
    }

    #[test]
    fn outputs_only_is_receive_without_fee() {
        let mut ledger = AssetLedger::new("KAS");
        ledger.add_native_input(false, kas("500000000"));
        ledger.add_native_output(true, kas("300000000"));
        ledger.add_native_output(false, kas("199990000"));

        let tx = classify(&ledger, date(), "h").unwrap();
        assert_eq!(tx.kind, TransactionType::Receive);
        assert_eq!(tx.received.unwrap().quantity, dec("3"));
        assert!(tx.fee.is_none());
    }

    #[test]
    fn coinbase_is_receive() {
        let mut ledger = AssetLedger::new("KAS");
        ledger.mark_coinbase();
        ledger.add_native_output(true, kas("5000000000"));

        let tx = classify(&ledger, date(), "h").unwrap();
        assert_eq!(tx.kind, TransactionType::Receive);
        assert!(tx.fee.is_none());
    }

    #[test]
    fn change_back_to_self_nets_the_send() {
        let mut ledger = AssetLedger::new("KAS");
        ledger.add_native_input(true, kas("1000000000"));
        ledger.add_native_output(false, kas("200000000"));
        ledger.add_native_output(true, kas("799990000"));

        let tx = classify(&ledger, date(), "h").unwrap();
        assert_eq!(tx.kind, TransactionType::Send);
        assert_eq!(tx.sent.unwrap().quantity, dec("2"));
        assert_eq!(tx.fee.unwrap().quantity, dec("0.0001"));
    }

    #[test]
    fn consolidation_is_fee_only_other() {
        let mut ledger = AssetLedger::new("KAS");
        ledger.add_native_input(true, kas("600000000"));
        ledger.add_native_input(true, kas("400000000"));
        ledger.add_native_output(true, kas("999990000"));

        let tx = classify(&ledger, date(), "h").unwrap();
        assert_eq!(tx.kind, TransactionType::Other);
        assert!(tx.sent.is_none());
        assert!(tx.received.is_none());
        assert_eq!(tx.fee.unwrap().quantity, dec("0.0001"));
    }

    #[test]
    fn equal_inputs_and_outputs_never_send_or_receive() {
        let mut ledger = AssetLedger::new("ERG");
        ledger.add_native_input(true, dec("4"));
        ledger.add_native_output(true, dec("4"));

        let tx = classify(&ledger, date(), "h");
        // no fee, nothing moved: nothing to emit
        assert!(tx.is_none());
        assert_eq!(ledger.net_effect().kind(), TransactionType::Other);
    }

    #[test]
    fn unrelated_transaction_is_skipped() {
        let mut ledger = AssetLedger::new("KAS");
        ledger.add_native_input(false, kas("100"));
        ledger.add_native_output(false, kas("90"));
        assert!(classify(&ledger, date(), "h").is_none());
    }

    #[test]
    fn token_for_native_is_trade() {
        let mut ledger = AssetLedger::new("ERG");
        ledger.add_native_input(true, dec("10"));
        ledger.add_native_output(true, dec("1"));
        ledger.add_native_output(false, dec("8.9989"));
        ledger.add_native_output(false, dec("0.0011"));
        ledger.set_explicit_fee(dec("0.0011"));
        ledger.add_token_output("03faf2cb", "SigUSD", dec("100"));

        let tx = classify(&ledger, date(), "h").unwrap();
        assert_eq!(tx.kind, TransactionType::Trade);
        let sent = tx.sent.unwrap();
        assert_eq!(sent.currency, "ERG");
        assert_eq!(sent.quantity, dec("8.9989"));
        let received = tx.received.unwrap();
        assert_eq!(received.currency, "SigUSD");
        assert_eq!(received.quantity, dec("100"));
    }

    #[test]
    fn extra_assets_go_to_additional_legs() {
        let mut ledger = AssetLedger::new("ERG");
        ledger.add_native_output(true, dec("1"));
        ledger.add_token_output("a", "TokenA", dec("5"));
        ledger.add_token_output("b", "TokenB", dec("7"));

        let tx = classify(&ledger, date(), "h").unwrap();
        assert_eq!(tx.kind, TransactionType::Receive);
        assert_eq!(tx.received.as_ref().unwrap().currency, "ERG");
        assert_eq!(tx.additional_received.len(), 2);
        assert_eq!(tx.additional_received[1].currency, "TokenB");
    }

    #[test]
    fn classification_is_idempotent() {
        let mut ledger = AssetLedger::new("KAS");
        ledger.add_native_input(true, kas("1000000000"));
        ledger.add_native_output(false, kas("999995000"));
        assert_eq!(
            classify(&ledger, date(), "h"),
            classify(&ledger, date(), "h")
        );
    }
}
