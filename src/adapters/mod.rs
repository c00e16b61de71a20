// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Chain adapters.
//!
//! A [`ChainAdapter`] binds one blockchain's explorer API to the canonical
//! contract: it validates addresses, drives the right pagination strategy,
//! classifies each raw record, and returns the transactions sorted by date.
//!
//! | Adapter | Provider | Paging | Model |
//! |---------|----------|--------|-------|
//! | [`KaspaAdapter`] | api.kaspa.org | offset/limit | UTXO |
//! | [`ErgoAdapter`] | Ergo explorer v1 | offset/limit | UTXO + tokens |
//! | [`CosmosAdapter`] | Cosmos SDK LCD | cursor | messages |
//! | [`PolkadotAdapter`] | Subscan | page number | account |
//! | [`EvmAdapter`] | Etherscan v2 | page number | account |
//! | [`HyperliquidAdapter`] | Hyperliquid info | time cursor | fills + perps |
//!
//! Adapters receive everything they need (HTTP client, credentials, base
//! URL) at construction and read no ambient state during a fetch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ExporterConfig;
use crate::errors::{AdapterError, ConfigError};
use crate::export;
use crate::pagination::{Completion, DateRange, DriveResult, FetchControl};
use crate::stream::ProgressSink;
use crate::transport::{ApiClient, HttpService};
use crate::types::perp::PerpTransaction;
use crate::types::transaction::Transaction;

pub mod cosmos;
pub mod ergo;
pub mod evm;
pub mod hyperliquid;
pub mod kaspa;
pub mod polkadot;
mod wire;

pub use cosmos::{CosmosAdapter, CosmosChain};
pub use ergo::ErgoAdapter;
pub use evm::{EvmAdapter, EvmChain};
pub use hyperliquid::HyperliquidAdapter;
pub use kaspa::KaspaAdapter;
pub use polkadot::PolkadotAdapter;

/// Identity and capabilities of an adapter, as shown in chain listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    pub chain_id: &'static str,
    pub chain_name: &'static str,
    pub ticker: &'static str,
    pub enabled: bool,
    pub perps_capable: bool,
}

/// Caller-supplied options for one fetch.
///
/// # Example
///
/// ```rust
/// use awakenscan::FetchOptions;
/// use chrono::{TimeZone, Utc};
/// use tokio_util::sync::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let options = FetchOptions::default()
///     .from_date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
///     .limit(1_000)
///     .cancel(cancel.clone());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Inclusive lower bound
    pub from_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub to_date: Option<DateTime<Utc>>,
    /// Resume position returned in a previous [`FetchOutcome::next_cursor`]
    pub cursor: Option<String>,
    /// Maximum number of raw records to consume
    pub limit: Option<usize>,
    /// Receives each classified batch and total-count hints
    pub progress: Option<ProgressSink>,
    /// Cooperative cancellation, checked before every page request
    pub cancel: Option<CancellationToken>,
}

impl FetchOptions {
    pub fn from_date(mut self, date: DateTime<Utc>) -> Self {
        self.from_date = Some(date);
        self
    }

    pub fn to_date(mut self, date: DateTime<Utc>) -> Self {
        self.to_date = Some(date);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.from_date, self.to_date)
    }
}

/// Result of a fetch: the transactions (sorted by date) and how it ended.
///
/// A cancelled fetch is not an error; its transactions are usable as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub transactions: Vec<Transaction>,
    pub completion: Completion,
    /// Where to resume when the fetch was cut short
    pub next_cursor: Option<String>,
}

impl FetchOutcome {
    /// Build an outcome, sorting transactions ascending by date. Ties keep
    /// their input order.
    pub fn new(
        mut transactions: Vec<Transaction>,
        completion: Completion,
        next_cursor: Option<String>,
    ) -> Self {
        sort_by_date(&mut transactions);
        Self {
            transactions,
            completion,
            next_cursor,
        }
    }

    pub fn from_drive(result: DriveResult) -> Self {
        Self::new(result.transactions, result.completion, result.next_cursor)
    }

    /// Whether the result stops short of the full history.
    pub fn is_partial(&self) -> bool {
        !self.completion.is_complete()
    }
}

/// One blockchain's binding to the canonical contract.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Identity and capabilities.
    fn info(&self) -> ChainInfo;

    /// Human readable description of the accepted address format.
    fn address_format(&self) -> &'static str;

    /// Pure, synchronous address check. Never panics; rejects empty input.
    fn validate_address(&self, address: &str) -> bool;

    /// Fetch and classify the full history of `address`.
    async fn fetch_transactions(
        &self,
        address: &str,
        options: &FetchOptions,
    ) -> Result<FetchOutcome, AdapterError>;

    /// Fetch perpetuals activity. Only perps-capable adapters implement this.
    async fn fetch_perp_transactions(
        &self,
        _address: &str,
        _options: &FetchOptions,
    ) -> Result<Vec<PerpTransaction>, AdapterError> {
        Err(AdapterError::unsupported(
            self.info().chain_name,
            "perpetuals export",
        ))
    }

    /// Render transactions in the standard Awaken layout.
    fn to_awaken_csv(&self, transactions: &[Transaction]) -> String {
        export::generate_standard_csv(transactions)
    }

    /// Render perpetuals records in the Awaken perps layout.
    fn to_awaken_perps_csv(&self, transactions: &[PerpTransaction]) -> String {
        export::generate_perps_csv(transactions)
    }

    /// Explorer page for a transaction hash.
    fn explorer_url(&self, tx_hash: &str) -> String;
}

/// Stable ascending sort by date.
pub fn sort_by_date(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|tx| tx.date);
}

/// Fail with a validation error unless `address` is valid for the adapter.
pub(crate) fn ensure_valid_address<A: ChainAdapter + ?Sized>(
    adapter: &A,
    address: &str,
) -> Result<(), AdapterError> {
    if adapter.validate_address(address) {
        Ok(())
    } else {
        Err(AdapterError::invalid_address(
            adapter.info().chain_name,
            adapter.address_format(),
        ))
    }
}

/// The credential, or a configuration error naming the variable to set.
pub(crate) fn require_credential<'a>(
    credential: Option<&'a str>,
    chain_name: &str,
    variable: &str,
) -> Result<&'a str, ConfigError> {
    credential
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ConfigError::missing_credential(chain_name, variable))
}

/// The HTTP client for one chain, with that chain's rate limit.
pub(crate) fn client_for(config: &ExporterConfig, chain_id: &str, http: &HttpService) -> ApiClient {
    ApiClient::new(
        http.clone(),
        config.retry.clone(),
        config.get_rate_limit_delay(chain_id),
    )
}

/// Sort the merged result of concurrent sources, apply the caller's limit
/// to the union, and deliver whatever the sources held back.
///
/// Each transaction carries the numeric resume position of the page it came
/// from (page number, block or timestamp), if the source has one. When the
/// union exceeds the limit the excess is dropped and the cursor moves back to
/// the earliest dropped position, so resuming re-reads rather than skips.
pub(crate) async fn finish_merged(
    control: &FetchControl,
    sources: &FetchControl,
    mut positioned: Vec<(Transaction, Option<u64>)>,
    mut completion: Completion,
    mut next_cursor: Option<String>,
) -> FetchOutcome {
    positioned.sort_by(|a, b| a.0.date.cmp(&b.0.date));
    if let Some(limit) = control.limit() {
        if positioned.len() > limit {
            let dropped = positioned.split_off(limit);
            debug!(limit, dropped = dropped.len(), "Truncated merged sources to the limit");
            let positions = dropped
                .into_iter()
                .map(|(_, position)| position.map(|p| p.to_string()));
            next_cursor = earliest_cursor(std::iter::once(next_cursor).chain(positions));
            completion = completion.merge(Completion::LimitReached);
        }
    }

    let transactions = positioned.into_iter().map(|(tx, _)| tx).collect();
    let outcome = FetchOutcome::new(transactions, completion, next_cursor);
    if !sources.delivers_batches() && !control.emit(&outcome.transactions).await {
        return FetchOutcome {
            completion: Completion::Cancelled,
            ..outcome
        };
    }
    outcome
}

/// Pair transactions with no resume position.
pub(crate) fn unpositioned(transactions: Vec<Transaction>) -> Vec<(Transaction, Option<u64>)> {
    transactions.into_iter().map(|tx| (tx, None)).collect()
}

/// The earliest of several numeric resume positions (page numbers or
/// timestamps), so that resuming re-reads rather than skips.
pub(crate) fn earliest_cursor<I>(cursors: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    cursors
        .into_iter()
        .flatten()
        .filter_map(|c| c.parse::<u64>().ok())
        .min()
        .map(|c| c.to_string())
}

/// Whether `candidate` consists of lowercase bech32 characters only.
pub(crate) fn is_bech32_data(candidate: &str) -> bool {
    const CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";
    !candidate.is_empty() && candidate.chars().all(|c| CHARSET.contains(c))
}
