// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Polkadot adapter (Subscan).
//!
//! Subscan needs an API key. The history is the union of balance transfers
//! and staking reward/slash events, fetched concurrently with page-number
//! pagination (pages start at 0). Both sources share the page cursor, and
//! each classified page is streamed as it arrives.

use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, Instrument};

use super::wire::{amount_text, lenient_i64, null_as_empty};
use super::{client_for, earliest_cursor, ensure_valid_address, finish_merged, require_credential};
use super::{ChainAdapter, ChainInfo, FetchOptions, FetchOutcome};
use crate::classify;
use crate::config::constants::{chains, endpoints, env_vars, explorers};
use crate::config::ExporterConfig;
use crate::errors::{AdapterError, ClassificationError, FetchError};
use crate::pagination::{
    drive_pages, ClassifyingHandler, FetchControl, NumberedPage, PageParams, PageTagging,
};
use crate::spans;
use crate::transport::{ApiClient, ApiRequest, HttpService};
use crate::types::amount::{parse_decimal, to_decimal, Decimals};
use crate::types::transaction::{Transaction, TransactionType};

const MAX_PAGE_SIZE: u32 = 100;
const TICKER: &str = "DOT";
const CHAIN_NAME: &str = "Polkadot";
/// Network prefix 0, 32-byte public key, 2-byte checksum.
const SS58_LENGTH: usize = 35;
const SS58_PREFIX: u8 = 0;

/// Subscan response envelope. Errors arrive with HTTP 200 and `code != 0`.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TransfersData {
    #[serde(default)]
    count: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    transfers: Vec<SubscanTransfer>,
}

#[derive(Debug, Deserialize)]
struct RewardsData {
    #[serde(default)]
    count: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    list: Vec<SubscanReward>,
}

/// A balance transfer from `/api/v2/scan/transfers`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscanTransfer {
    pub from: String,
    pub to: String,
    /// Already scaled to whole tokens
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    /// Planck
    #[serde(default, deserialize_with = "amount_text")]
    pub fee: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub block_timestamp: i64,
    #[serde(default)]
    pub hash: String,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub asset_symbol: Option<String>,
}

fn default_success() -> bool {
    true
}

/// A staking event from `/api/v2/scan/account/reward_slash`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscanReward {
    /// Planck
    #[serde(deserialize_with = "amount_text")]
    pub amount: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub block_timestamp: i64,
    pub event_id: String,
    #[serde(default)]
    pub event_index: String,
    #[serde(default)]
    pub extrinsic_hash: Option<String>,
}

/// Classify a transfer for `address`.
pub fn classify_transfer(
    transfer: &SubscanTransfer,
    address: &str,
) -> Result<Option<Transaction>, ClassificationError> {
    let outgoing = transfer.from == address;
    let incoming = transfer.to == address;
    if !outgoing && !incoming {
        return Ok(None);
    }

    let date = classify::from_secs(transfer.block_timestamp, &transfer.hash)?;
    let amount = parse_decimal(&transfer.amount)?;
    let symbol = transfer
        .asset_symbol
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(TICKER);
    let fee = if outgoing {
        to_decimal(&transfer.fee, Decimals::POLKADOT)?
    } else {
        BigDecimal::zero()
    };

    let builder = match (outgoing, incoming, transfer.success) {
        (true, _, false) => Transaction::builder(date, TransactionType::Other).notes("Failed transfer"),
        (true, true, true) => {
            Transaction::builder(date, TransactionType::Other).notes("Self-transfer")
        }
        (true, false, true) => Transaction::builder(date, TransactionType::Send).sent(amount, symbol),
        (false, _, true) => Transaction::builder(date, TransactionType::Receive).received(amount, symbol),
        (false, _, false) => return Ok(None),
    };
    Ok(builder.fee(fee, TICKER).tx_hash(&transfer.hash).build())
}

/// Classify a staking reward or slash.
pub fn classify_reward(reward: &SubscanReward) -> Result<Option<Transaction>, ClassificationError> {
    let record = reward
        .extrinsic_hash
        .as_deref()
        .filter(|h| !h.is_empty())
        .unwrap_or(&reward.event_index);
    let date = classify::from_secs(reward.block_timestamp, record)?;
    let amount = to_decimal(&reward.amount, Decimals::POLKADOT)?;

    let builder = match reward.event_id.as_str() {
        "Reward" | "Rewarded" => Transaction::builder(date, TransactionType::Claim)
            .received(amount, TICKER)
            .tag("staked")
            .notes("Staking reward"),
        "Slash" | "Slashed" => Transaction::builder(date, TransactionType::Other)
            .sent(amount, TICKER)
            .tag("slash")
            .notes("Staking slash"),
        _ => return Ok(None),
    };
    Ok(builder.tx_hash(record).build())
}

/// Polkadot relay chain adapter.
#[derive(Debug, Clone)]
pub struct PolkadotAdapter {
    client: ApiClient,
    api_key: Option<String>,
    base_url: String,
    page_size: u32,
    enabled: bool,
}

impl PolkadotAdapter {
    pub fn new(client: ApiClient, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: endpoints::SUBSCAN_POLKADOT.to_string(),
            page_size: MAX_PAGE_SIZE,
            enabled: true,
        }
    }

    pub fn from_config(config: &ExporterConfig, http: &HttpService) -> Self {
        Self {
            client: client_for(config, chains::POLKADOT, http),
            api_key: config.credentials.subscan_api_key.clone(),
            base_url: config.get_base_url(chains::POLKADOT, endpoints::SUBSCAN_POLKADOT),
            page_size: config.get_page_size(chains::POLKADOT, MAX_PAGE_SIZE),
            enabled: config.is_enabled(chains::POLKADOT),
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

    /// POST to a Subscan endpoint and unwrap the envelope.
    async fn post<T: DeserializeOwned>(
        &self,
        api_key: &str,
        path: &str,
        body: Value,
        label: &str,
    ) -> Result<T, FetchError> {
        let request = ApiRequest::post_json(format!("{}{}", self.base_url, path), body, label)
            .header("X-API-Key", api_key);
        let envelope: Envelope = self.client.fetch_as(request).await?;
        if envelope.code != 0 {
            return Err(FetchError::provider_client(
                label,
                200,
                format!("Subscan code {}: {}", envelope.code, envelope.message),
            ));
        }
        serde_json::from_value(envelope.data.unwrap_or(Value::Null))
            .map_err(|e| FetchError::decode(label, e.to_string()))
    }

    async fn transfers_page(
        &self,
        api_key: &str,
        address: &str,
        page: u32,
        row: u32,
    ) -> Result<NumberedPage<SubscanTransfer>, FetchError> {
        let body = json!({ "address": address, "row": row, "page": page, "direction": "all" });
        let data: Option<TransfersData> = self
            .post(api_key, "/api/v2/scan/transfers", body, "Subscan transfers")
            .await?;
        Ok(numbered(data.map(|d| (d.transfers, d.count)), page, row))
    }

    async fn rewards_page(
        &self,
        api_key: &str,
        address: &str,
        page: u32,
        row: u32,
    ) -> Result<NumberedPage<SubscanReward>, FetchError> {
        let body = json!({ "address": address, "row": row, "page": page, "is_stash": true });
        let data: Option<RewardsData> = self
            .post(api_key, "/api/v2/scan/account/reward_slash", body, "Subscan rewards")
            .await?;
        Ok(numbered(data.map(|d| (d.list, d.count)), page, row))
    }
}

/// Page with a next-page signal from both the page size and the reported count.
fn numbered<R>(data: Option<(Vec<R>, u64)>, page: u32, row: u32) -> NumberedPage<R> {
    let Some((records, count)) = data else {
        return NumberedPage::sized(Vec::new(), row);
    };
    let seen = (u64::from(page) + 1) * u64::from(row);
    let page = NumberedPage::sized(records, row).with_total(count);
    let has_next = page.has_next && seen < count;
    page.with_has_next(has_next)
}

#[async_trait]
impl ChainAdapter for PolkadotAdapter {
    fn info(&self) -> ChainInfo {
        ChainInfo {
            chain_id: chains::POLKADOT,
            chain_name: CHAIN_NAME,
            ticker: TICKER,
            enabled: self.enabled,
            perps_capable: false,
        }
    }

    fn address_format(&self) -> &'static str {
        "SS58 address with network prefix 0 (starts with 1)"
    }

    fn validate_address(&self, address: &str) -> bool {
        match bs58::decode(address).into_vec() {
            Ok(bytes) => bytes.len() == SS58_LENGTH && bytes[0] == SS58_PREFIX,
            Err(_) => false,
        }
    }

    async fn fetch_transactions(
        &self,
        address: &str,
        options: &FetchOptions,
    ) -> Result<FetchOutcome, AdapterError> {
        ensure_valid_address(self, address)?;
        let api_key = require_credential(
            self.api_key.as_deref(),
            CHAIN_NAME,
            env_vars::SUBSCAN_API_KEY,
        )?;
        let span = spans::fetch_transactions(chains::POLKADOT, address);

        async move {
            let control = FetchControl::from_options(options);
            let sources = control.for_sources();
            let params = PageParams::resume(options.cursor.as_deref(), 0, self.page_size);
            let range = options.date_range();

            let mut transfer_handler = PageTagging::new(
                ClassifyingHandler::new(chains::POLKADOT, range, |transfer: SubscanTransfer| {
                    classify_transfer(&transfer, address)
                }),
                params.start_page,
            );
            let mut reward_handler = PageTagging::new(
                ClassifyingHandler::new(chains::POLKADOT, range, |reward: SubscanReward| {
                    classify_reward(&reward)
                }),
                params.start_page,
            );

            // The transfer count is the progress hint.
            let reward_sources = sources.without_totals();
            let (transfers, rewards) = futures::try_join!(
                drive_pages(
                    &sources,
                    params,
                    |page, row| self.transfers_page(api_key, address, page, row),
                    &mut transfer_handler,
                ),
                drive_pages(
                    &reward_sources,
                    params,
                    |page, row| self.rewards_page(api_key, address, page, row),
                    &mut reward_handler,
                ),
            )?;

            let completion = transfers.completion.merge(rewards.completion);
            let next_cursor = earliest_cursor([transfers.next_cursor, rewards.next_cursor]);
            let mut positioned = transfer_handler.tag(transfers.transactions);
            positioned.extend(reward_handler.tag(rewards.transactions));

            info!(
                transfers = transfers.records,
                rewards = rewards.records,
                transactions = positioned.len(),
                completion = ?completion,
                "Polkadot fetch finished"
            );
            Ok(finish_merged(&control, &sources, positioned, completion, next_cursor).await)
        }
        .instrument(span)
        .await
    }

    fn explorer_url(&self, tx_hash: &str) -> String {
        format!("{}{}", explorers::POLKADOT, tx_hash)
    }
}
