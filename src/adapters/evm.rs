// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! EVM adapter (Etherscan API v2), one instance per chain.
//!
//! Three account lists are fetched concurrently: normal transactions,
//! ERC-20 transfers and internal (contract-initiated) transfers. Records are
//! grouped by transaction hash and each group is netted per asset, so a
//! swap that sends ETH and receives a token is one trade.
//!
//! Etherscan serves at most `page * offset <= 10000` records per query. A
//! list that fills the window is continued with a new query starting at the
//! block of its last record, and the resume cursor is a start block.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn, Instrument};

use super::{client_for, earliest_cursor, ensure_valid_address, finish_merged, require_credential};
use super::{ChainAdapter, ChainInfo, FetchOptions, FetchOutcome};
use crate::classify::{self, netting};
use crate::config::constants::{chains, endpoints, env_vars, evm_chain_ids, explorers};
use crate::config::ExporterConfig;
use crate::errors::{AdapterError, ClassificationError, FetchError};
use crate::pagination::{
    drive_pages, ClassifyingHandler, Completion, DedupCollector, FetchControl, NumberedPage,
    PageHandler, PageParams,
};
use crate::spans;
use crate::transport::{ApiClient, ApiRequest, HttpService};
use crate::types::amount::{to_decimal, u256_to_decimal, Decimals};
use crate::types::transaction::{Transaction, TransactionType};

const MAX_PAGE_SIZE: u32 = 1_000;
/// Etherscan refuses `page * offset` beyond this many records.
const RESULT_WINDOW: u64 = 10_000;
const END_BLOCK: u64 = 99_999_999;

/// An EVM chain served through Etherscan v2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvmChain {
    Ethereum,
    Base,
}

impl EvmChain {
    pub const fn chain_id(&self) -> &'static str {
        match self {
            EvmChain::Ethereum => chains::ETHEREUM,
            EvmChain::Base => chains::BASE,
        }
    }

    pub const fn chain_name(&self) -> &'static str {
        match self {
            EvmChain::Ethereum => "Ethereum",
            EvmChain::Base => "Base",
        }
    }

    /// Native gas token; ETH on both chains.
    pub const fn ticker(&self) -> &'static str {
        "ETH"
    }

    /// EIP-155 chain id, passed as `chainid` to Etherscan v2.
    pub const fn numeric_id(&self) -> u64 {
        match self {
            EvmChain::Ethereum => evm_chain_ids::ETHEREUM,
            EvmChain::Base => evm_chain_ids::BASE,
        }
    }

    const fn explorer(&self) -> &'static str {
        match self {
            EvmChain::Ethereum => explorers::ETHEREUM,
            EvmChain::Base => explorers::BASE,
        }
    }
}

/// `action=txlist`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalTx {
    pub hash: String,
    #[serde(default)]
    pub block_number: String,
    pub time_stamp: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub gas_used: String,
    #[serde(default)]
    pub gas_price: String,
    #[serde(default)]
    pub is_error: String,
    #[serde(default)]
    pub function_name: String,
}

/// `action=tokentx`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTx {
    pub hash: String,
    #[serde(default)]
    pub block_number: String,
    pub time_stamp: String,
    pub from: String,
    pub to: String,
    pub value: String,
    pub contract_address: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub token_decimal: String,
}

/// `action=txlistinternal`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalTx {
    pub hash: String,
    #[serde(default)]
    pub block_number: String,
    pub time_stamp: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub is_error: String,
}

/// A record that knows the block it was mined in.
pub trait Mined {
    fn block_number(&self) -> &str;

    fn block(&self) -> Option<u64> {
        self.block_number().trim().parse().ok()
    }
}

impl Mined for NormalTx {
    fn block_number(&self) -> &str {
        &self.block_number
    }
}

impl Mined for TokenTx {
    fn block_number(&self) -> &str {
        &self.block_number
    }
}

impl Mined for InternalTx {
    fn block_number(&self) -> &str {
        &self.block_number
    }
}

/// Every record sharing one transaction hash.
#[derive(Debug, Clone, Default)]
pub struct TxGroup {
    pub hash: String,
    pub normal: Option<NormalTx>,
    pub tokens: Vec<TokenTx>,
    pub internals: Vec<InternalTx>,
}

impl TxGroup {
    fn timestamp(&self) -> Option<&str> {
        self.normal
            .as_ref()
            .map(|tx| tx.time_stamp.as_str())
            .or_else(|| self.tokens.first().map(|tx| tx.time_stamp.as_str()))
            .or_else(|| self.internals.first().map(|tx| tx.time_stamp.as_str()))
    }

    /// Lowest block any record of the group reports.
    pub fn block(&self) -> Option<u64> {
        let normal = self.normal.iter().filter_map(Mined::block);
        let tokens = self.tokens.iter().filter_map(Mined::block);
        let internals = self.internals.iter().filter_map(Mined::block);
        normal.chain(tokens).chain(internals).min()
    }
}

/// Group the three lists by hash, in first-seen order (normal, then token,
/// then internal). Hashes compare case-insensitively.
pub fn group_by_hash(
    normal: Vec<NormalTx>,
    tokens: Vec<TokenTx>,
    internals: Vec<InternalTx>,
) -> Vec<TxGroup> {
    let mut groups = HashGroups::default();
    for tx in normal {
        let i = groups.slot(&tx.hash);
        groups.list[i].normal = Some(tx);
    }
    for tx in tokens {
        let i = groups.slot(&tx.hash);
        groups.list[i].tokens.push(tx);
    }
    for tx in internals {
        let i = groups.slot(&tx.hash);
        groups.list[i].internals.push(tx);
    }
    groups.list
}

#[derive(Default)]
struct HashGroups {
    index: HashMap<String, usize>,
    list: Vec<TxGroup>,
}

impl HashGroups {
    fn slot(&mut self, hash: &str) -> usize {
        if let Some(&i) = self.index.get(&hash.to_ascii_lowercase()) {
            return i;
        }
        self.list.push(TxGroup {
            hash: hash.to_string(),
            ..TxGroup::default()
        });
        self.index.insert(hash.to_ascii_lowercase(), self.list.len() - 1);
        self.list.len() - 1
    }
}

fn parse_u256(text: &str, field: &str, record: &str) -> Result<U256, ClassificationError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(U256::ZERO);
    }
    text.parse::<U256>()
        .map_err(|_| ClassificationError::invalid_amount(text, format!("{field} of {record}")))
}

/// Short function name from Etherscan's `functionName` (`"approve(address,uint256)"` → `"approve"`).
fn function_label(function_name: &str) -> Option<&str> {
    let name = function_name.split('(').next().unwrap_or_default().trim();
    (!name.is_empty()).then_some(name)
}

/// Classify one hash group for `address` (lowercase `0x` hex).
pub fn classify_group(
    group: &TxGroup,
    address: &str,
    ticker: &str,
) -> Result<Option<Transaction>, ClassificationError> {
    let Some(timestamp) = group.timestamp() else {
        return Ok(None);
    };
    let date = classify::from_secs_str(timestamp, &group.hash)?;
    let is_ours = |party: &str| party.eq_ignore_ascii_case(address);

    let mut ledger = netting::AssetLedger::new(ticker);
    if let Some(tx) = &group.normal {
        let paid_by_address = is_ours(&tx.from);
        let fee_wei = if paid_by_address {
            parse_u256(&tx.gas_used, "gasUsed", &tx.hash)?
                .saturating_mul(parse_u256(&tx.gas_price, "gasPrice", &tx.hash)?)
        } else {
            U256::ZERO
        };
        let fee = u256_to_decimal(fee_wei, Decimals::EVM_NATIVE);

        if tx.is_error == "1" {
            if !paid_by_address {
                return Ok(None);
            }
            return Ok(Transaction::builder(date, TransactionType::Other)
                .fee(fee, ticker)
                .tx_hash(&group.hash)
                .notes("Failed transaction")
                .build());
        }

        let value = parse_u256(&tx.value, "value", &tx.hash)?;
        let function = function_label(&tx.function_name);
        if paid_by_address
            && value.is_zero()
            && group.tokens.is_empty()
            && function == Some("approve")
        {
            return Ok(Transaction::builder(date, TransactionType::Approval)
                .fee(fee, ticker)
                .tx_hash(&group.hash)
                .notes(tx.function_name.trim())
                .build());
        }

        // Account chains report value and gas separately; the ledger expects
        // the spent input to include the fee, as UTXO inputs do.
        if paid_by_address {
            ledger.add_native_input(true, u256_to_decimal(value.saturating_add(fee_wei), Decimals::EVM_NATIVE));
            ledger.set_explicit_fee(fee);
        }
        if is_ours(&tx.to) {
            ledger.add_native_output(true, u256_to_decimal(value, Decimals::EVM_NATIVE));
        }
    }

    for internal in group.internals.iter().filter(|tx| tx.is_error != "1") {
        let value = u256_to_decimal(
            parse_u256(&internal.value, "value", &internal.hash)?,
            Decimals::EVM_NATIVE,
        );
        if is_ours(&internal.from) {
            ledger.add_native_input(true, value.clone());
        }
        if is_ours(&internal.to) {
            ledger.add_native_output(true, value);
        }
    }

    for token in &group.tokens {
        let decimals = token.token_decimal.trim().parse::<u8>().map_err(|_| {
            ClassificationError::invalid_amount(
                token.token_decimal.trim(),
                format!("tokenDecimal of {}", token.hash),
            )
        })?;
        let amount = to_decimal(token.value.trim(), Decimals::new(decimals))?;
        let contract = token.contract_address.to_ascii_lowercase();
        let symbol = if token.token_symbol.trim().is_empty() {
            contract.chars().take(10).collect::<String>()
        } else {
            token.token_symbol.trim().to_string()
        };
        if is_ours(&token.from) {
            ledger.add_token_input(&contract, &symbol, amount.clone());
        }
        if is_ours(&token.to) {
            ledger.add_token_output(&contract, &symbol, amount);
        }
    }

    let Some(mut tx) = netting::classify(&ledger, date, &group.hash) else {
        return Ok(None);
    };
    if tx.kind == TransactionType::Other {
        if let Some(name) = group
            .normal
            .as_ref()
            .and_then(|n| function_label(&n.function_name))
        {
            tx.notes = Some(format!("Contract call: {name}"));
        }
    }
    Ok(Some(tx))
}

/// Etherscan response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

/// Which account list to page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Normal,
    Token,
    Internal,
}

impl Action {
    fn as_str(&self) -> &'static str {
        match self {
            Action::Normal => "txlist",
            Action::Token => "tokentx",
            Action::Internal => "txlistinternal",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Action::Normal => "Etherscan transactions",
            Action::Token => "Etherscan token transfers",
            Action::Internal => "Etherscan internal transfers",
        }
    }
}

/// Adapter for one EVM chain.
#[derive(Debug, Clone)]
pub struct EvmAdapter {
    chain: EvmChain,
    client: ApiClient,
    api_key: Option<String>,
    base_url: String,
    page_size: u32,
    result_window: u64,
    enabled: bool,
}

impl EvmAdapter {
    pub fn new(chain: EvmChain, client: ApiClient, api_key: Option<String>) -> Self {
        Self {
            chain,
            client,
            api_key,
            base_url: endpoints::ETHERSCAN_V2.to_string(),
            page_size: MAX_PAGE_SIZE,
            result_window: RESULT_WINDOW,
            enabled: true,
        }
    }

    pub fn from_config(chain: EvmChain, config: &ExporterConfig, http: &HttpService) -> Self {
        let chain_id = chain.chain_id();
        Self {
            chain,
            client: client_for(config, chain_id, http),
            api_key: config.credentials.etherscan_api_key.clone(),
            base_url: config.get_base_url(chain_id, endpoints::ETHERSCAN_V2),
            page_size: config.get_page_size(chain_id, MAX_PAGE_SIZE),
            result_window: RESULT_WINDOW,
            enabled: config.is_enabled(chain_id),
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

    /// Records one query can page through (Etherscan's is 10000).
    pub fn with_result_window(mut self, records: u64) -> Self {
        self.result_window = records.max(1);
        self
    }

    pub fn chain(&self) -> EvmChain {
        self.chain
    }

    async fn fetch_page<R: DeserializeOwned>(
        &self,
        action: Action,
        api_key: &str,
        address: &str,
        start_block: u64,
        page: u32,
        offset: u32,
    ) -> Result<NumberedPage<R>, FetchError> {
        let url = format!(
            "{}?chainid={}&module=account&action={}&address={}&startblock={}&endblock={}&page={}&offset={}&sort=asc&apikey={}",
            self.base_url,
            self.chain.numeric_id(),
            action.as_str(),
            address,
            start_block,
            END_BLOCK,
            page,
            offset,
            api_key
        );
        let label = action.label();
        let request = ApiRequest::get(url, label).throttled_when(is_rate_limit_reply);
        let envelope: Envelope = self.client.fetch_as(request).await?;
        let records = parse_result::<R>(label, envelope)?;

        let next_end = (u64::from(page) + 1) * u64::from(offset);
        let numbered = NumberedPage::sized(records, offset);
        if numbered.has_next && next_end > self.result_window {
            debug!(action = action.as_str(), start_block, page, "Result window exhausted");
            return Ok(numbered.with_has_next(false));
        }
        Ok(numbered)
    }

    /// Page one account list from `start_block` to the end, opening a new
    /// result window at the last block whenever one fills up.
    ///
    /// Records of the last block of a full window are dropped and read again
    /// by the next window, since the window may have cut that block short.
    async fn collect<R: DeserializeOwned + Mined>(
        &self,
        control: &FetchControl,
        start_block: u64,
        action: Action,
        api_key: &str,
        address: &str,
        key: fn(&R) -> Option<String>,
    ) -> Result<ListSweep<R>, FetchError> {
        let per_page = self.page_size;
        let capacity = window_capacity(self.result_window, per_page);
        let mut collector = DedupCollector::new(key);
        let mut from_block = start_block;

        loop {
            let window_control = match control.remaining(collector.len()) {
                Some(remaining) => control.clone().with_limit(remaining),
                None => control.clone(),
            };
            let result = drive_pages(
                &window_control,
                PageParams::resume(None, 1, per_page),
                |page, offset| self.fetch_page::<R>(action, api_key, address, from_block, page, offset),
                &mut collector,
            )
            .await?;

            let last_block = collector.last().and_then(Mined::block);
            if !result.completion.is_complete() {
                return Ok(ListSweep {
                    records: collector.into_records(),
                    completion: result.completion,
                    next_block: Some(last_block.unwrap_or(from_block)),
                });
            }
            if (result.records as u64) < capacity {
                return Ok(ListSweep {
                    records: collector.into_records(),
                    completion: Completion::Complete,
                    next_block: None,
                });
            }

            match last_block {
                Some(block) if block > from_block => {
                    collector.retain(|record| record.block() != Some(block));
                    debug!(action = action.as_str(), block, "Result window full, continuing from its last block");
                    from_block = block;
                }
                Some(block) => {
                    warn!(
                        action = action.as_str(),
                        block,
                        "Block holds more records than one result window, the rest are not reachable"
                    );
                    from_block = block + 1;
                }
                None => {
                    warn!(action = action.as_str(), "Result window full but records carry no block number");
                    return Ok(ListSweep {
                        records: collector.into_records(),
                        completion: Completion::Complete,
                        next_block: None,
                    });
                }
            }
        }
    }
}

/// One account list read to its end (or until stopped).
struct ListSweep<R> {
    records: Vec<R>,
    completion: Completion,
    /// Start block to resume from when the sweep stopped early
    next_block: Option<u64>,
}

/// Records that fit in one window of whole pages.
fn window_capacity(window: u64, per_page: u32) -> u64 {
    let per_page = u64::from(per_page.max(1));
    (window / per_page).max(1) * per_page
}

/// Whether a 2xx body is Etherscan's rate-limit reply.
fn is_rate_limit_reply(body: &str) -> bool {
    serde_json::from_str::<Envelope>(body).is_ok_and(|envelope| {
        envelope.status != "1" && is_rate_limit_detail(&envelope_detail(&envelope))
    })
}

fn is_rate_limit_detail(detail: &str) -> bool {
    detail.to_ascii_lowercase().contains("rate limit")
}

fn envelope_detail(envelope: &Envelope) -> String {
    match &envelope.result {
        Value::String(text) if !text.is_empty() => text.clone(),
        _ => envelope.message.clone(),
    }
}

/// Unwrap Etherscan's `status`/`result` envelope.
fn parse_result<R: DeserializeOwned>(
    label: &str,
    envelope: Envelope,
) -> Result<Vec<R>, FetchError> {
    if envelope.status == "1" {
        return serde_json::from_value(envelope.result)
            .map_err(|e| FetchError::decode(label, e.to_string()));
    }
    let detail = envelope_detail(&envelope);
    if envelope.message.starts_with("No transactions found")
        || matches!(&envelope.result, Value::Array(items) if items.is_empty())
    {
        return Ok(Vec::new());
    }
    if is_rate_limit_detail(&detail) {
        return Err(FetchError::transient(label, 1, detail));
    }
    Err(FetchError::provider_client(label, 200, detail))
}

fn normal_key(tx: &NormalTx) -> Option<String> {
    Some(tx.hash.to_ascii_lowercase())
}

fn keep_all<R>(_: &R) -> Option<String> {
    None
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    fn info(&self) -> ChainInfo {
        ChainInfo {
            chain_id: self.chain.chain_id(),
            chain_name: self.chain.chain_name(),
            ticker: self.chain.ticker(),
            enabled: self.enabled,
            perps_capable: false,
        }
    }

    fn address_format(&self) -> &'static str {
        "0x followed by 40 hex characters (EIP-55 checksum when mixed case)"
    }

    fn validate_address(&self, address: &str) -> bool {
        is_evm_address(address)
    }

    async fn fetch_transactions(
        &self,
        address: &str,
        options: &FetchOptions,
    ) -> Result<FetchOutcome, AdapterError> {
        ensure_valid_address(self, address)?;
        let api_key = require_credential(
            self.api_key.as_deref(),
            self.chain.chain_name(),
            env_vars::ETHERSCAN_API_KEY,
        )?;
        let chain_id = self.chain.chain_id();
        let span = spans::fetch_transactions(chain_id, address);
        let address = address.to_ascii_lowercase();

        async move {
            // Groups need all three lists, so pages are held back; a dropped
            // receiver still stops every list.
            let control = FetchControl::from_options(options);
            let sources = control.without_progress();
            let start_block = options
                .cursor
                .as_deref()
                .and_then(|cursor| cursor.trim().parse::<u64>().ok())
                .unwrap_or(0);

            let (normal, tokens, internals) = futures::try_join!(
                self.collect::<NormalTx>(&sources, start_block, Action::Normal, api_key, &address, normal_key),
                self.collect::<TokenTx>(&sources, start_block, Action::Token, api_key, &address, keep_all),
                self.collect::<InternalTx>(&sources, start_block, Action::Internal, api_key, &address, keep_all),
            )?;

            let completion = normal
                .completion
                .merge(tokens.completion)
                .merge(internals.completion);
            let next_cursor = earliest_cursor(
                [normal.next_block, tokens.next_block, internals.next_block]
                    .map(|block| block.map(|b| b.to_string())),
            );

            let groups = group_by_hash(normal.records, tokens.records, internals.records);
            let blocks: HashMap<String, u64> = groups
                .iter()
                .filter_map(|group| Some((group.hash.to_ascii_lowercase(), group.block()?)))
                .collect();
            let classify_span = spans::classify_union(chain_id, groups.len());
            let ticker = self.chain.ticker();
            let mut handler = ClassifyingHandler::new(
                chain_id,
                options.date_range(),
                |group: TxGroup| classify_group(&group, &address, ticker),
            );
            let transactions = classify_span.in_scope(|| handler.handle_page(groups));
            let positioned: Vec<_> = transactions
                .into_iter()
                .map(|tx| {
                    let block = tx
                        .tx_hash
                        .as_ref()
                        .and_then(|hash| blocks.get(&hash.to_ascii_lowercase()).copied());
                    (tx, block)
                })
                .collect();

            info!(
                transactions = positioned.len(),
                skipped = handler.skipped(),
                completion = ?completion,
                "EVM fetch finished"
            );
            Ok(finish_merged(&control, &sources, positioned, completion, next_cursor).await)
        }
        .instrument(span)
        .await
    }

    fn explorer_url(&self, tx_hash: &str) -> String {
        format!("{}{}", self.chain.explorer(), tx_hash)
    }
}

/// `0x` followed by 40 hex characters. Mixed-case input must carry a valid
/// EIP-55 checksum; all-lowercase and all-uppercase input is accepted as is.
pub fn is_evm_address(address: &str) -> bool {
    let Some(hex) = address.strip_prefix("0x") else {
        return false;
    };
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(address, None).is_ok();
    }
    true
}
