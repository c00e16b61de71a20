// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Ergo adapter (Ergo explorer API v1).
//!
//! Ergo boxes carry native ERG and any number of tokens. Each transaction is
//! netted per asset, so a box swap on a DEX shows up as a trade. Outputs to
//! the miner fee contract are the transaction's explicit fee.

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use serde::Deserialize;
use tracing::{info, Instrument};

use super::wire::{amount_text, lenient_i64, null_as_empty};
use super::{client_for, ensure_valid_address, ChainAdapter, ChainInfo, FetchOptions, FetchOutcome};
use crate::classify::{self, netting};
use crate::config::constants::{chains, endpoints, explorers, ERGO_FEE_ADDRESS};
use crate::config::ExporterConfig;
use crate::errors::{AdapterError, ClassificationError, FetchError};
use crate::pagination::{drive_offset, ClassifyingHandler, FetchControl, OffsetPage, OffsetParams};
use crate::spans;
use crate::transport::{ApiClient, ApiRequest, HttpService};
use crate::types::amount::{to_decimal, Decimals};
use crate::types::transaction::Transaction;

const MAX_PAGE_SIZE: u32 = 500;
const TICKER: &str = "ERG";

/// Network prefix bytes of mainnet P2PK, P2SH and P2S addresses.
const MAINNET_ADDRESS_TYPES: [u8; 3] = [0x01, 0x02, 0x03];
/// Prefix byte, 33-byte public key and 4-byte checksum of the shortest (P2PK) address.
const MIN_ADDRESS_BYTES: usize = 38;

#[derive(Debug, Deserialize)]
struct TransactionsPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    items: Vec<ErgoTransaction>,
    #[serde(default)]
    total: Option<u64>,
}

/// One transaction from `/addresses/{address}/transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErgoTransaction {
    pub id: String,
    /// Milliseconds since the epoch
    #[serde(deserialize_with = "lenient_i64")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub inputs: Vec<ErgoBox>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub outputs: Vec<ErgoBox>,
}

/// An input or output box.
#[derive(Debug, Clone, Deserialize)]
pub struct ErgoBox {
    #[serde(deserialize_with = "amount_text")]
    pub value: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub assets: Vec<ErgoAsset>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErgoAsset {
    pub token_id: String,
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

impl ErgoAsset {
    /// Display name; unnamed tokens fall back to a short form of the id.
    fn currency(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.token_id.chars().take(8).collect(),
        }
    }

    fn quantity(&self) -> Result<BigDecimal, ClassificationError> {
        to_decimal(&self.amount, Decimals::new(self.decimals.unwrap_or(0)))
    }
}

/// Net one Ergo transaction for `address`.
pub fn classify_transaction(
    tx: &ErgoTransaction,
    address: &str,
) -> Result<Option<Transaction>, ClassificationError> {
    let mut ledger = netting::AssetLedger::new(TICKER);

    for input in &tx.inputs {
        let owned = input.address.as_deref() == Some(address);
        ledger.add_native_input(owned, to_decimal(&input.value, Decimals::ERGO)?);
        if owned {
            for asset in &input.assets {
                ledger.add_token_input(&asset.token_id, &asset.currency(), asset.quantity()?);
            }
        }
    }

    let mut fee = None;
    for output in &tx.outputs {
        let value = to_decimal(&output.value, Decimals::ERGO)?;
        let recipient = output.address.as_deref();
        if recipient == Some(ERGO_FEE_ADDRESS) {
            fee = Some(fee.unwrap_or_else(BigDecimal::zero) + &value);
        }
        let owned = recipient == Some(address);
        ledger.add_native_output(owned, value);
        if owned {
            for asset in &output.assets {
                ledger.add_token_output(&asset.token_id, &asset.currency(), asset.quantity()?);
            }
        }
    }
    if let Some(fee) = fee {
        ledger.set_explicit_fee(fee);
    }

    let date = classify::from_millis(tx.timestamp, &tx.id)?;
    Ok(netting::classify(&ledger, date, &tx.id))
}

/// Ergo mainnet adapter.
#[derive(Debug, Clone)]
pub struct ErgoAdapter {
    client: ApiClient,
    base_url: String,
    page_size: u32,
    enabled: bool,
}

impl ErgoAdapter {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            base_url: endpoints::ERGO_API.to_string(),
            page_size: MAX_PAGE_SIZE,
            enabled: true,
        }
    }

    pub fn from_config(config: &ExporterConfig, http: &HttpService) -> Self {
        Self {
            client: client_for(config, chains::ERGO, http),
            base_url: config.get_base_url(chains::ERGO, endpoints::ERGO_API),
            page_size: config.get_page_size(chains::ERGO, MAX_PAGE_SIZE),
            enabled: config.is_enabled(chains::ERGO),
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
    ) -> Result<OffsetPage<ErgoTransaction>, FetchError> {
        let url = format!(
            "{}/addresses/{}/transactions?offset={}&limit={}",
            self.base_url, address, offset, limit
        );
        let page: TransactionsPage = self
            .client
            .fetch_as(ApiRequest::get(url, "Ergo transactions"))
            .await?;
        Ok(match page.total {
            Some(total) => OffsetPage::with_total(page.items, total),
            None => OffsetPage::new(page.items),
        })
    }
}

#[async_trait]
impl ChainAdapter for ErgoAdapter {
    fn info(&self) -> ChainInfo {
        ChainInfo {
            chain_id: chains::ERGO,
            chain_name: "Ergo",
            ticker: TICKER,
            enabled: self.enabled,
            perps_capable: false,
        }
    }

    fn address_format(&self) -> &'static str {
        "base58 mainnet address (9... for P2PK)"
    }

    fn validate_address(&self, address: &str) -> bool {
        match bs58::decode(address).into_vec() {
            Ok(bytes) => {
                bytes.len() >= MIN_ADDRESS_BYTES && MAINNET_ADDRESS_TYPES.contains(&bytes[0])
            }
            Err(_) => false,
        }
    }

    async fn fetch_transactions(
        &self,
        address: &str,
        options: &FetchOptions,
    ) -> Result<FetchOutcome, AdapterError> {
        ensure_valid_address(self, address)?;
        let span = spans::fetch_transactions(chains::ERGO, address);

        async move {
            let control = FetchControl::from_options(options);
            let mut handler = ClassifyingHandler::new(
                chains::ERGO,
                options.date_range(),
                |tx: ErgoTransaction| classify_transaction(&tx, address),
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
                "Ergo fetch finished"
            );
            Ok(FetchOutcome::from_drive(result))
        }
        .instrument(span)
        .await
    }

    fn explorer_url(&self, tx_hash: &str) -> String {
        format!("{}{}", explorers::ERGO, tx_hash)
    }
}
