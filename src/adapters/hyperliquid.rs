// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Hyperliquid adapter (info API).
//!
//! Spot fills and USDC ledger movements map to standard transactions;
//! perpetual fills and funding map to [`PerpTransaction`]s. Every endpoint
//! is paged by time: the next request starts one millisecond after the last
//! record of a full page. Spot pages are classified and streamed as they
//! arrive; perpetual records are returned together once both feeds finish.

use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn, Instrument};

use super::evm::is_evm_address;
use super::{client_for, earliest_cursor, ensure_valid_address, finish_merged};
use super::{ChainAdapter, ChainInfo, FetchOptions, FetchOutcome};
use crate::classify;
use crate::config::constants::{chains, endpoints, explorers};
use crate::config::ExporterConfig;
use crate::errors::{AdapterError, ClassificationError, FetchError};
use crate::pagination::{
    drive_cursor, ClassifyingHandler, CursorPage, DedupCollector, DriveResult, FetchControl,
    UniqueRecords,
};
use crate::spans;
use crate::transport::{ApiClient, ApiRequest, HttpService};
use crate::types::amount::parse_decimal;
use crate::types::perp::{PerpTag, PerpTransaction};
use crate::types::transaction::{Transaction, TransactionType};

const TICKER: &str = "HYPE";
const USDC: &str = "USDC";
/// Largest response of `userFillsByTime`.
const FILLS_PAGE: usize = 2_000;
/// Largest response of `userFunding` and `userNonFundingLedgerUpdates`.
const LEDGER_PAGE: usize = 500;

/// A trade fill (spot or perp).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    /// Perp asset name (`"BTC"`), spot pair name (`"PURR/USDC"`) or spot
    /// index (`"@107"`)
    pub coin: String,
    pub px: String,
    pub sz: String,
    /// `"B"` buy, `"A"` sell
    pub side: String,
    pub time: i64,
    #[serde(default)]
    pub dir: String,
    #[serde(default)]
    pub closed_pnl: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub fee: String,
    #[serde(default)]
    pub fee_token: String,
    #[serde(default)]
    pub tid: Option<u64>,
}

impl Fill {
    pub fn is_spot(&self) -> bool {
        self.coin.starts_with('@') || self.coin.contains('/')
    }
}

/// An entry of `userFunding` or `userNonFundingLedgerUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerEntry {
    pub time: i64,
    #[serde(default)]
    pub hash: String,
    pub delta: Value,
}

impl LedgerEntry {
    fn delta_type(&self) -> &str {
        self.delta.get("type").and_then(Value::as_str).unwrap_or_default()
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.delta.get(key).and_then(Value::as_str)
    }

    fn decimal(&self, key: &str) -> Result<BigDecimal, ClassificationError> {
        let text = self
            .text(key)
            .ok_or_else(|| ClassificationError::missing_field(key, &self.hash))?;
        parse_decimal(text)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotMeta {
    #[serde(default)]
    pub tokens: Vec<SpotToken>,
    #[serde(default)]
    pub universe: Vec<SpotPair>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotToken {
    pub name: String,
    pub index: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotPair {
    pub name: String,
    pub tokens: Vec<usize>,
    pub index: usize,
}

/// Base and quote token names by spot coin identifier.
#[derive(Debug, Clone, Default)]
pub struct SpotPairs {
    pairs: HashMap<String, (String, String)>,
}

impl SpotPairs {
    pub fn from_meta(meta: &SpotMeta) -> Self {
        let names: HashMap<usize, &str> = meta
            .tokens
            .iter()
            .map(|t| (t.index, t.name.as_str()))
            .collect();
        let mut pairs = HashMap::new();
        for pair in &meta.universe {
            let [base, quote] = pair.tokens.as_slice() else {
                continue;
            };
            let (Some(base), Some(quote)) = (names.get(base), names.get(quote)) else {
                continue;
            };
            let entry = (base.to_string(), quote.to_string());
            pairs.insert(format!("@{}", pair.index), entry.clone());
            pairs.insert(pair.name.clone(), entry);
        }
        Self { pairs }
    }

    /// Resolve a fill's coin. Unlisted `BASE/QUOTE` names split on the slash.
    pub fn resolve(&self, coin: &str) -> Option<(String, String)> {
        if let Some(pair) = self.pairs.get(coin) {
            return Some(pair.clone());
        }
        let (base, quote) = coin.split_once('/')?;
        Some((base.to_string(), quote.to_string()))
    }
}

/// Classify a spot fill as a trade.
pub fn classify_spot_fill(
    fill: &Fill,
    pairs: &SpotPairs,
) -> Result<Option<Transaction>, ClassificationError> {
    if !fill.is_spot() {
        return Ok(None);
    }
    let date = classify::from_millis(fill.time, &fill.hash)?;
    let (base, quote) = pairs
        .resolve(&fill.coin)
        .unwrap_or_else(|| (fill.coin.clone(), USDC.to_string()));
    let size = parse_decimal(&fill.sz)?;
    let notional = parse_decimal(&fill.px)? * &size;

    let builder = Transaction::builder(date, TransactionType::Trade);
    let builder = if fill.side == "B" {
        builder.sent(notional, quote).received(size, base)
    } else {
        builder.sent(size, base).received(notional, quote)
    };
    let fee_token = if fill.fee_token.is_empty() {
        USDC
    } else {
        fill.fee_token.as_str()
    };
    Ok(builder
        .fee(parse_decimal_or_zero(&fill.fee)?, fee_token)
        .tx_hash(&fill.hash)
        .build())
}

/// Classify a deposit, withdrawal or transfer for `address` (lowercase).
pub fn classify_ledger_update(
    entry: &LedgerEntry,
    address: &str,
) -> Result<Option<Transaction>, ClassificationError> {
    let date = classify::from_millis(entry.time, &entry.hash)?;
    let is_ours = |key: &str| {
        entry
            .text(key)
            .is_some_and(|party| party.eq_ignore_ascii_case(address))
    };

    let builder = match entry.delta_type() {
        "deposit" => Transaction::builder(date, TransactionType::Bridge)
            .received(entry.decimal("usdc")?, USDC)
            .notes("Deposit"),
        "withdraw" => Transaction::builder(date, TransactionType::Bridge)
            .sent(entry.decimal("usdc")?, USDC)
            .fee(optional_decimal(entry, "fee")?, USDC)
            .notes("Withdrawal"),
        kind @ ("spotTransfer" | "internalTransfer") => {
            let (amount, token) = if kind == "spotTransfer" {
                (entry.decimal("amount")?, entry.text("token").unwrap_or(USDC).to_string())
            } else {
                (entry.decimal("usdc")?, USDC.to_string())
            };
            if is_ours("user") {
                Transaction::builder(date, TransactionType::Send)
                    .sent(amount, token)
                    .fee(optional_decimal(entry, "fee")?, USDC)
            } else if is_ours("destination") {
                Transaction::builder(date, TransactionType::Receive).received(amount, token)
            } else {
                return Ok(None);
            }
        }
        other => {
            debug!(delta_type = other, hash = %entry.hash, "Ignoring ledger update");
            return Ok(None);
        }
    };
    Ok(builder.tx_hash(&entry.hash).build())
}

/// Classify a perpetual fill as an open or close.
pub fn classify_perp_fill(fill: &Fill) -> Result<Option<PerpTransaction>, ClassificationError> {
    if fill.is_spot() {
        return Ok(None);
    }
    let date = classify::from_millis(fill.time, &fill.hash)?;
    let tag = if fill.dir.starts_with("Open") {
        PerpTag::OpenPosition
    } else {
        PerpTag::ClosePosition
    };
    let record = PerpTransaction::new(
        date,
        fill.coin.clone(),
        parse_decimal(&fill.sz)?,
        Some(parse_decimal_or_zero(&fill.fee)?),
        parse_decimal_or_zero(&fill.closed_pnl)?,
        USDC,
        (!fill.hash.is_empty()).then(|| fill.hash.clone()),
        tag,
    );
    Ok(Some(if fill.dir.is_empty() {
        record
    } else {
        record.with_notes(fill.dir.clone())
    }))
}

/// Classify a funding payment. The USDC delta keeps its sign.
pub fn classify_funding(entry: &LedgerEntry) -> Result<Option<PerpTransaction>, ClassificationError> {
    if entry.delta_type() != "funding" {
        return Ok(None);
    }
    let date = classify::from_millis(entry.time, &entry.hash)?;
    let coin = entry
        .text("coin")
        .ok_or_else(|| ClassificationError::missing_field("coin", &entry.hash))?;
    let record = PerpTransaction::new(
        date,
        coin,
        optional_decimal(entry, "szi")?,
        None,
        entry.decimal("usdc")?,
        USDC,
        (!entry.hash.is_empty()).then(|| entry.hash.clone()),
        PerpTag::FundingPayment,
    );
    Ok(Some(match entry.text("fundingRate") {
        Some(rate) => record.with_notes(format!("Funding rate {rate}")),
        None => record,
    }))
}

fn parse_decimal_or_zero(text: &str) -> Result<BigDecimal, ClassificationError> {
    if text.trim().is_empty() {
        return Ok(BigDecimal::default());
    }
    parse_decimal(text)
}

fn optional_decimal(entry: &LedgerEntry, key: &str) -> Result<BigDecimal, ClassificationError> {
    parse_decimal_or_zero(entry.text(key).unwrap_or_default())
}

/// Info request types paged by time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    Fills,
    Funding,
    Ledger,
}

impl Feed {
    fn request_type(&self) -> &'static str {
        match self {
            Feed::Fills => "userFillsByTime",
            Feed::Funding => "userFunding",
            Feed::Ledger => "userNonFundingLedgerUpdates",
        }
    }

    fn page_size(&self) -> usize {
        match self {
            Feed::Fills => FILLS_PAGE,
            Feed::Funding | Feed::Ledger => LEDGER_PAGE,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Feed::Fills => "Hyperliquid fills",
            Feed::Funding => "Hyperliquid funding",
            Feed::Ledger => "Hyperliquid ledger updates",
        }
    }
}

/// Records with a millisecond timestamp.
trait Timed {
    fn time(&self) -> i64;
}

impl Timed for Fill {
    fn time(&self) -> i64 {
        self.time
    }
}

impl Timed for LedgerEntry {
    fn time(&self) -> i64 {
        self.time
    }
}

fn fill_key(fill: &Fill) -> Option<String> {
    fill.tid.map(|tid| tid.to_string())
}

fn keep_all<R>(_: &R) -> Option<String> {
    None
}

/// Hyperliquid adapter (spot and perpetuals).
#[derive(Debug, Clone)]
pub struct HyperliquidAdapter {
    client: ApiClient,
    base_url: String,
    enabled: bool,
}

impl HyperliquidAdapter {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            base_url: endpoints::HYPERLIQUID_INFO.to_string(),
            enabled: true,
        }
    }

    pub fn from_config(config: &ExporterConfig, http: &HttpService) -> Self {
        Self {
            client: client_for(config, chains::HYPERLIQUID, http),
            base_url: config.get_base_url(chains::HYPERLIQUID, endpoints::HYPERLIQUID_INFO),
            enabled: config.is_enabled(chains::HYPERLIQUID),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn info<T: DeserializeOwned>(&self, body: Value, label: &str) -> Result<T, FetchError> {
        self.client
            .fetch_as(ApiRequest::post_json(self.base_url.clone(), body, label))
            .await
    }

    async fn spot_pairs(&self) -> Result<SpotPairs, FetchError> {
        let meta: SpotMeta = self.info(json!({ "type": "spotMeta" }), "Hyperliquid spot metadata").await?;
        Ok(SpotPairs::from_meta(&meta))
    }

    async fn feed_page<R>(
        &self,
        feed: Feed,
        address: &str,
        start: Option<String>,
    ) -> Result<CursorPage<R>, FetchError>
    where
        R: DeserializeOwned + Timed,
    {
        let start_time = start.and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);
        let body = json!({
            "type": feed.request_type(),
            "user": address,
            "startTime": start_time,
        });
        let records: Vec<R> = self.info(body, feed.label()).await?;
        let next = (records.len() >= feed.page_size())
            .then(|| records.iter().map(Timed::time).max())
            .flatten()
            .map(|last| (last + 1).to_string());
        Ok(CursorPage::new(records, next))
    }

    /// Page one feed to the end, collecting raw records.
    async fn collect<R>(
        &self,
        control: &FetchControl,
        feed: Feed,
        address: &str,
        start: Option<String>,
        key: fn(&R) -> Option<String>,
    ) -> Result<(Vec<R>, DriveResult), FetchError>
    where
        R: DeserializeOwned + Timed,
    {
        let mut collector = DedupCollector::new(key);
        let result = drive_cursor(
            control,
            start,
            |cursor| self.feed_page::<R>(feed, address, cursor),
            &mut collector,
        )
        .await?;
        Ok((collector.into_records(), result))
    }
}

/// First request time: the resume cursor, else the lower date bound.
fn start_cursor(options: &FetchOptions) -> Option<String> {
    options
        .cursor
        .clone()
        .or_else(|| options.from_date.map(|d| d.timestamp_millis().to_string()))
}

#[async_trait]
impl ChainAdapter for HyperliquidAdapter {
    fn info(&self) -> ChainInfo {
        ChainInfo {
            chain_id: chains::HYPERLIQUID,
            chain_name: "Hyperliquid",
            ticker: TICKER,
            enabled: self.enabled,
            perps_capable: true,
        }
    }

    fn address_format(&self) -> &'static str {
        "0x followed by 40 hex characters"
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
        let span = spans::fetch_transactions(chains::HYPERLIQUID, address);
        let address = address.to_ascii_lowercase();

        async move {
            let control = FetchControl::from_options(options);
            let sources = control.for_sources();
            let start = start_cursor(options);
            let pairs = self.spot_pairs().await?;

            let range = options.date_range();
            let mut fill_handler = UniqueRecords::new(
                ClassifyingHandler::new(chains::HYPERLIQUID, range, |fill: Fill| {
                    classify_spot_fill(&fill, &pairs)
                }),
                fill_key,
            );
            let mut ledger_handler =
                ClassifyingHandler::new(chains::HYPERLIQUID, range, |entry: LedgerEntry| {
                    classify_ledger_update(&entry, &address)
                });

            let (fills_result, updates_result) = futures::try_join!(
                drive_cursor(
                    &sources,
                    start.clone(),
                    |cursor| self.feed_page::<Fill>(Feed::Fills, &address, cursor),
                    &mut fill_handler,
                ),
                drive_cursor(
                    &sources,
                    start.clone(),
                    |cursor| self.feed_page::<LedgerEntry>(Feed::Ledger, &address, cursor),
                    &mut ledger_handler,
                ),
            )?;

            let completion = fills_result.completion.merge(updates_result.completion);
            let next_cursor =
                earliest_cursor([fills_result.next_cursor, updates_result.next_cursor]);
            let positioned: Vec<_> = fills_result
                .transactions
                .into_iter()
                .chain(updates_result.transactions)
                .map(|tx| {
                    let position = u64::try_from(tx.date.timestamp_millis()).ok();
                    (tx, position)
                })
                .collect();
            info!(
                transactions = positioned.len(),
                completion = ?completion,
                "Hyperliquid fetch finished"
            );
            Ok(finish_merged(&control, &sources, positioned, completion, next_cursor).await)
        }
        .instrument(span)
        .await
    }

    async fn fetch_perp_transactions(
        &self,
        address: &str,
        options: &FetchOptions,
    ) -> Result<Vec<PerpTransaction>, AdapterError> {
        ensure_valid_address(self, address)?;
        let span = spans::fetch_perp_transactions(chains::HYPERLIQUID, address);
        let address = address.to_ascii_lowercase();

        async move {
            let control = FetchControl::from_options(options).without_progress();
            let start = start_cursor(options);

            let ((fills, _), (funding, _)) = futures::try_join!(
                self.collect::<Fill>(&control, Feed::Fills, &address, start.clone(), fill_key),
                self.collect::<LedgerEntry>(&control, Feed::Funding, &address, start.clone(), keep_all),
            )?;

            let range = options.date_range();
            let mut records = Vec::with_capacity(fills.len() + funding.len());
            let mut skipped = 0usize;
            let classified = fills
                .iter()
                .map(classify_perp_fill)
                .chain(funding.iter().map(classify_funding));
            for result in classified {
                match result {
                    Ok(Some(record)) if range.contains(record.date) => records.push(record),
                    Ok(_) => {}
                    Err(error) => {
                        skipped += 1;
                        warn!(chain_id = chains::HYPERLIQUID, error = %error, "Skipping malformed record");
                    }
                }
            }
            records.sort_by_key(|r| r.date);
            if let Some(limit) = control.limit() {
                records.truncate(limit);
            }

            info!(records = records.len(), skipped, "Hyperliquid perps fetch finished");
            Ok(records)
        }
        .instrument(span)
        .await
    }

    fn explorer_url(&self, tx_hash: &str) -> String {
        format!("{}{}", explorers::HYPERLIQUID, tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const ME: &str = "0x31ca8395cf837de08b24da3f660e77761dfb974b";

    fn dec(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    fn fill(coin: &str, side: &str, dir: &str, closed_pnl: &str) -> Fill {
        serde_json::from_value(json!({
            "coin": coin,
            "px": "2.5",
            "sz": "40",
            "side": side,
            "time": 1714552200000i64,
            "dir": dir,
            "closedPnl": closed_pnl,
            "hash": "0xfill",
            "fee": "0.05",
            "feeToken": "USDC",
            "tid": 7
        }))
        .unwrap()
    }

    fn pairs() -> SpotPairs {
        let meta: SpotMeta = serde_json::from_value(json!({
            "tokens": [{"name": "USDC", "index": 0}, {"name": "PURR", "index": 1}, {"name": "HYPE", "index": 150}],
            "universe": [
                {"name": "PURR/USDC", "tokens": [1, 0], "index": 0},
                {"name": "@107", "tokens": [150, 0], "index": 107}
            ]
        }))
        .unwrap();
        SpotPairs::from_meta(&meta)
    }

    #[test]
    fn spot_buy_sends_quote_and_receives_base() {
        let tx = classify_spot_fill(&fill("@107", "B", "Buy", "0"), &pairs())
            .unwrap()
            .unwrap();
        assert_eq!(tx.kind, TransactionType::Trade);
        let sent = tx.sent.unwrap();
        assert_eq!(sent.currency, "USDC");
        assert_eq!(sent.quantity, dec("100"));
        let received = tx.received.unwrap();
        assert_eq!(received.currency, "HYPE");
        assert_eq!(received.quantity, dec("40"));
        assert_eq!(tx.fee.unwrap().quantity, dec("0.05"));
    }

    #[test]
    fn spot_sell_by_pair_name() {
        let tx = classify_spot_fill(&fill("PURR/USDC", "A", "Sell", "0"), &pairs())
            .unwrap()
            .unwrap();
        assert_eq!(tx.sent.unwrap().currency, "PURR");
        assert_eq!(tx.received.unwrap().currency, "USDC");
    }

    #[test]
    fn perp_fills_are_not_spot_trades() {
        assert!(classify_spot_fill(&fill("BTC", "B", "Open Long", "0"), &pairs())
            .unwrap()
            .is_none());
    }

    #[test]
    fn perp_open_and_close() {
        let open = classify_perp_fill(&fill("ETH", "B", "Open Long", "0.0")).unwrap().unwrap();
        assert_eq!(open.tag, PerpTag::OpenPosition);
        assert_eq!(open.amount, dec("40"));
        assert_eq!(open.notes.as_deref(), Some("Open Long"));

        let close = classify_perp_fill(&fill("ETH", "A", "Close Long", "-12.75")).unwrap().unwrap();
        assert_eq!(close.tag, PerpTag::ClosePosition);
        assert_eq!(close.pnl, dec("-12.75"));
        assert_eq!(close.payment_token, "USDC");
    }

    #[test]
    fn funding_keeps_sign() {
        let entry: LedgerEntry = serde_json::from_value(json!({
            "time": 1714552200000i64,
            "hash": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "delta": {"type": "funding", "coin": "BTC", "usdc": "-1.2345", "szi": "0.5", "fundingRate": "0.0000125"}
        }))
        .unwrap();
        let record = classify_funding(&entry).unwrap().unwrap();
        assert_eq!(record.tag, PerpTag::FundingPayment);
        assert_eq!(record.pnl, dec("-1.2345"));
        assert_eq!(record.asset, "BTC");
    }

    #[test]
    fn ledger_deposits_and_transfers() {
        let deposit: LedgerEntry = serde_json::from_value(json!({
            "time": 1714552200000i64,
            "hash": "0xdep",
            "delta": {"type": "deposit", "usdc": "500.0"}
        }))
        .unwrap();
        let tx = classify_ledger_update(&deposit, ME).unwrap().unwrap();
        assert_eq!(tx.kind, TransactionType::Bridge);
        assert_eq!(tx.received.unwrap().quantity, dec("500"));

        let outgoing: LedgerEntry = serde_json::from_value(json!({
            "time": 1714552200000i64,
            "hash": "0xspot",
            "delta": {"type": "spotTransfer", "token": "PURR", "amount": "10", "user": ME, "destination": "0xabc", "fee": "1.0"}
        }))
        .unwrap();
        let tx = classify_ledger_update(&outgoing, ME).unwrap().unwrap();
        assert_eq!(tx.kind, TransactionType::Send);
        assert_eq!(tx.sent.unwrap().currency, "PURR");

        let class_transfer: LedgerEntry = serde_json::from_value(json!({
            "time": 1714552200000i64,
            "hash": "0xcls",
            "delta": {"type": "accountClassTransfer", "usdc": "5", "toPerp": true}
        }))
        .unwrap();
        assert!(classify_ledger_update(&class_transfer, ME).unwrap().is_none());
    }
}
