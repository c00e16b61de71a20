// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Kaspa adapter (api.kaspa.org).
//!
//! Kaspa is a UTXO chain. The full-transactions endpoint resolves every
//! input's previous outpoint, so each transaction carries the owning address
//! and amount of both inputs and outputs and can be netted directly.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, Instrument};

use super::wire::{amount_text, lenient_i64, null_as_empty};
use super::{client_for, ensure_valid_address, is_bech32_data, ChainAdapter, ChainInfo};
use super::{FetchOptions, FetchOutcome};
use crate::classify::{self, netting};
use crate::config::constants::{chains, endpoints, explorers};
use crate::config::ExporterConfig;
use crate::errors::{AdapterError, ClassificationError, FetchError};
use crate::pagination::{drive_offset, ClassifyingHandler, FetchControl, OffsetPage, OffsetParams};
use crate::spans;
use crate::transport::{ApiClient, ApiRequest, HttpService};
use crate::types::amount::{to_decimal, Decimals};
use crate::types::transaction::Transaction;

/// Largest page the API accepts.
const MAX_PAGE_SIZE: u32 = 500;
const TICKER: &str = "KAS";
const ADDRESS_PREFIX: &str = "kaspa:";

/// One transaction from `/addresses/{address}/full-transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct KaspaTransaction {
    pub transaction_id: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub block_time: i64,
    #[serde(default = "default_accepted")]
    pub is_accepted: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub inputs: Vec<KaspaInput>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub outputs: Vec<KaspaOutput>,
}

fn default_accepted() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct KaspaInput {
    #[serde(default)]
    pub previous_outpoint_address: Option<String>,
    #[serde(default, deserialize_with = "amount_text")]
    pub previous_outpoint_amount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KaspaOutput {
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    #[serde(default)]
    pub script_public_key_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionCount {
    total: u64,
}

/// Net one Kaspa transaction for `address`.
///
/// Unaccepted (orphaned) transactions are skipped. A transaction without
/// inputs is a coinbase.
pub fn classify_transaction(
    tx: &KaspaTransaction,
    address: &str,
) -> Result<Option<Transaction>, ClassificationError> {
    if !tx.is_accepted {
        return Ok(None);
    }

    let mut ledger = netting::AssetLedger::new(TICKER);
    if tx.inputs.is_empty() {
        ledger.mark_coinbase();
    }
    for input in &tx.inputs {
        let owned = input.previous_outpoint_address.as_deref() == Some(address);
        ledger.add_native_input(owned, to_decimal(&input.previous_outpoint_amount, Decimals::KASPA)?);
    }
    for output in &tx.outputs {
        let owned = output.script_public_key_address.as_deref() == Some(address);
        ledger.add_native_output(owned, to_decimal(&output.amount, Decimals::KASPA)?);
    }

    let date = classify::from_millis(tx.block_time, &tx.transaction_id)?;
    Ok(netting::classify(&ledger, date, &tx.transaction_id))
}

/// Kaspa mainnet adapter.
#[derive(Debug, Clone)]
pub struct KaspaAdapter {
    client: ApiClient,
    base_url: String,
    page_size: u32,
    enabled: bool,
}

impl KaspaAdapter {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            base_url: endpoints::KASPA_API.to_string(),
            page_size: MAX_PAGE_SIZE,
            enabled: true,
        }
    }

    pub fn from_config(config: &ExporterConfig, http: &HttpService) -> Self {
        Self {
            client: client_for(config, chains::KASPA, http),
            base_url: config.get_base_url(chains::KASPA, endpoints::KASPA_API),
            page_size: config.get_page_size(chains::KASPA, MAX_PAGE_SIZE),
            enabled: config.is_enabled(chains::KASPA),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    async fn fetch_page(
        &self,
        address: &str,
        offset: u64,
        limit: u32,
    ) -> Result<OffsetPage<KaspaTransaction>, FetchError> {
        let url = format!(
            "{}/addresses/{}/full-transactions?limit={}&offset={}&resolve_previous_outpoints=light",
            self.base_url, address, limit, offset
        );
        let records: Vec<KaspaTransaction> = self
            .client
            .fetch_as(ApiRequest::get(url, "Kaspa transactions"))
            .await?;
        Ok(OffsetPage::new(records))
    }

    /// Best-effort total for progress reporting.
    async fn estimated_total(&self, address: &str) -> Option<u64> {
        let url = format!("{}/addresses/{}/transactions-count", self.base_url, address);
        match self
            .client
            .fetch_as::<TransactionCount>(ApiRequest::get(url, "Kaspa transaction count"))
            .await
        {
            Ok(count) => Some(count.total),
            Err(error) => {
                debug!(error = %error, "Transaction count unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl ChainAdapter for KaspaAdapter {
    fn info(&self) -> ChainInfo {
        ChainInfo {
            chain_id: chains::KASPA,
            chain_name: "Kaspa",
            ticker: TICKER,
            enabled: self.enabled,
            perps_capable: false,
        }
    }

    fn address_format(&self) -> &'static str {
        "kaspa:q... or kaspa:p... (bech32, 61-63 characters after the prefix)"
    }

    fn validate_address(&self, address: &str) -> bool {
        let Some(payload) = address.strip_prefix(ADDRESS_PREFIX) else {
            return false;
        };
        (61..=63).contains(&payload.len())
            && (payload.starts_with('q') || payload.starts_with('p'))
            && is_bech32_data(payload)
    }

    async fn fetch_transactions(
        &self,
        address: &str,
        options: &FetchOptions,
    ) -> Result<FetchOutcome, AdapterError> {
        ensure_valid_address(self, address)?;
        let span = spans::fetch_transactions(chains::KASPA, address);

        async move {
            let control = FetchControl::from_options(options);
            if let Some(total) = self.estimated_total(address).await {
                control.emit_total(total).await;
            }

            let mut handler = ClassifyingHandler::new(
                chains::KASPA,
                options.date_range(),
                |tx: KaspaTransaction| classify_transaction(&tx, address),
            );
            let result = drive_offset(
                &control,
                OffsetParams::resume(options.cursor.as_deref(), self.page_size),
                |offset, limit| self.fetch_page(address, offset, limit),
                &mut handler,
            )
            .await?;

            info!(
                records = result.records,
                transactions = result.transactions.len(),
                skipped = handler.skipped(),
                completion = ?result.completion,
                "Kaspa fetch finished"
            );
            Ok(FetchOutcome::from_drive(result))
        }
        .instrument(span)
        .await
    }

    fn explorer_url(&self, tx_hash: &str) -> String {
        format!("{}{}", explorers::KASPA, tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::TransactionType;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    const ME: &str = "kaspa:qqkqkzjvr7zwxxmjxjkmxxdwju9kjs6e9u82uh59z07vgaks6gg62v8707g73";
    const OTHER: &str = "kaspa:qpauqsvk7yf9unexwmxsnmg547mhyga37csh0kj53q6xxgl24ydxjsgzthw5j";

    fn parse(json: &str) -> KaspaTransaction {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn end_to_end_send_net_of_fee() {
        let tx = parse(&format!(
            r#"{{
                "transaction_id": "f1e2",
                "block_time": 1714552200000,
                "is_accepted": true,
                "inputs": [{{"previous_outpoint_address": "{ME}", "previous_outpoint_amount": 1000000000}}],
                "outputs": [{{"amount": 999995000, "script_public_key_address": "{OTHER}"}}]
            }}"#
        ));

        let classified = classify_transaction(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Send);
        let sent = classified.sent.unwrap();
        assert_eq!(sent.quantity, BigDecimal::from_str("9.99995").unwrap());
        assert_eq!(sent.currency, "KAS");
        assert_eq!(classified.tx_hash.as_deref(), Some("f1e2"));
    }

    #[test]
    fn coinbase_with_null_inputs_is_receive() {
        let tx = parse(&format!(
            r#"{{
                "transaction_id": "cb",
                "block_time": 1714552200000,
                "inputs": null,
                "outputs": [{{"amount": "1200000000", "script_public_key_address": "{ME}"}}]
            }}"#
        ));
        let classified = classify_transaction(&tx, ME).unwrap().unwrap();
        assert_eq!(classified.kind, TransactionType::Receive);
        assert!(classified.fee.is_none());
    }

    #[test]
    fn unaccepted_transactions_are_skipped() {
        let tx = parse(&format!(
            r#"{{
                "transaction_id": "x",
                "block_time": 1714552200000,
                "is_accepted": false,
                "inputs": [],
                "outputs": [{{"amount": 5, "script_public_key_address": "{ME}"}}]
            }}"#
        ));
        assert!(classify_transaction(&tx, ME).unwrap().is_none());
    }

    #[test]
    fn malformed_amount_is_an_error() {
        let tx = parse(&format!(
            r#"{{
                "transaction_id": "bad",
                "block_time": 1714552200000,
                "inputs": [],
                "outputs": [{{"amount": "12.5", "script_public_key_address": "{ME}"}}]
            }}"#
        ));
        assert!(classify_transaction(&tx, ME).is_err());
    }
}
