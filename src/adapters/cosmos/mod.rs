// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cosmos SDK adapter (LCD REST), covering the Cosmos Hub and Osmosis.
//!
//! The tx search endpoint filters by one event at a time, so the history of
//! an address is the union of two queries: transactions it signed
//! (`message.sender`) and transfers it received (`transfer.recipient`). Both
//! run concurrently; the union is deduplicated by hash and classified once
//! both are done.

use async_trait::async_trait;
use tracing::{debug, info, Instrument};
use url::Url;

use super::{client_for, ensure_valid_address, finish_merged, is_bech32_data, unpositioned};
use super::{ChainAdapter, ChainInfo, FetchOptions, FetchOutcome};
use crate::config::constants::{chains, endpoints, explorers};
use crate::config::ExporterConfig;
use crate::errors::{AdapterError, FetchError};
use crate::pagination::{
    drive_cursor, ClassifyingHandler, CursorPage, DedupCollector, DriveResult, FetchControl,
    PageHandler,
};
use crate::spans;
use crate::transport::{ApiClient, ApiRequest, HttpService};

pub mod classify;
pub mod types;

pub use classify::{classify_tx, MessageKind};
pub use types::{resolve_denom, Coin, DenomInfo, TxResponse, TxSearchResponse};

const MAX_PAGE_SIZE: u32 = 100;

/// Bech32 data part lengths: 20-byte accounts and 32-byte module/contract accounts.
const ACCOUNT_DATA_LENGTHS: [usize; 2] = [38, 58];

/// A Cosmos SDK chain served by this adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CosmosChain {
    Hub,
    Osmosis,
}

impl CosmosChain {
    pub const fn chain_id(&self) -> &'static str {
        match self {
            CosmosChain::Hub => chains::COSMOS_HUB,
            CosmosChain::Osmosis => chains::OSMOSIS,
        }
    }

    pub const fn chain_name(&self) -> &'static str {
        match self {
            CosmosChain::Hub => "Cosmos Hub",
            CosmosChain::Osmosis => "Osmosis",
        }
    }

    pub const fn ticker(&self) -> &'static str {
        match self {
            CosmosChain::Hub => "ATOM",
            CosmosChain::Osmosis => "OSMO",
        }
    }

    /// Human readable part of account addresses.
    pub const fn bech32_hrp(&self) -> &'static str {
        match self {
            CosmosChain::Hub => "cosmos",
            CosmosChain::Osmosis => "osmo",
        }
    }

    const fn default_lcd(&self) -> &'static str {
        match self {
            CosmosChain::Hub => endpoints::COSMOS_HUB_LCD,
            CosmosChain::Osmosis => endpoints::OSMOSIS_LCD,
        }
    }

    const fn explorer(&self) -> &'static str {
        match self {
            CosmosChain::Hub => explorers::COSMOS_HUB,
            CosmosChain::Osmosis => explorers::OSMOSIS,
        }
    }
}

/// Which side of the address a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchFilter {
    Sender,
    Recipient,
}

impl SearchFilter {
    fn query(&self, address: &str) -> String {
        match self {
            SearchFilter::Sender => format!("message.sender='{address}'"),
            SearchFilter::Recipient => format!("transfer.recipient='{address}'"),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SearchFilter::Sender => "Cosmos sent transactions",
            SearchFilter::Recipient => "Cosmos received transactions",
        }
    }
}

type TxCollector = DedupCollector<TxResponse, fn(&TxResponse) -> Option<String>>;

fn tx_key(tx: &TxResponse) -> Option<String> {
    Some(tx.txhash.to_ascii_uppercase())
}

/// Adapter for one Cosmos SDK chain.
#[derive(Debug, Clone)]
pub struct CosmosAdapter {
    chain: CosmosChain,
    client: ApiClient,
    base_url: String,
    page_size: u32,
    enabled: bool,
}

impl CosmosAdapter {
    pub fn new(chain: CosmosChain, client: ApiClient) -> Self {
        Self {
            chain,
            client,
            base_url: chain.default_lcd().to_string(),
            page_size: MAX_PAGE_SIZE,
            enabled: true,
        }
    }

    pub fn from_config(chain: CosmosChain, config: &ExporterConfig, http: &HttpService) -> Self {
        let chain_id = chain.chain_id();
        Self {
            chain,
            client: client_for(config, chain_id, http),
            base_url: config.get_base_url(chain_id, chain.default_lcd()),
            page_size: config.get_page_size(chain_id, MAX_PAGE_SIZE),
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

    pub fn chain(&self) -> CosmosChain {
        self.chain
    }

    fn search_url(
        &self,
        filter: SearchFilter,
        address: &str,
        key: Option<&str>,
    ) -> Result<String, FetchError> {
        let mut url = Url::parse(&format!("{}/cosmos/tx/v1beta1/txs", self.base_url))
            .map_err(|e| FetchError::invalid_request(filter.label(), e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("query", &filter.query(address))
                .append_pair("pagination.limit", &self.page_size.to_string())
                .append_pair("order_by", "ORDER_BY_DESC");
            if let Some(key) = key {
                query.append_pair("pagination.key", key);
            }
        }
        Ok(url.into())
    }

    async fn fetch_page(
        &self,
        filter: SearchFilter,
        address: &str,
        key: Option<String>,
    ) -> Result<CursorPage<TxResponse>, FetchError> {
        let url = self.search_url(filter, address, key.as_deref())?;
        let response: TxSearchResponse = self
            .client
            .fetch_as(ApiRequest::get(url, filter.label()))
            .await?;
        let pagination = response.pagination.unwrap_or_default();
        let page = CursorPage::new(response.tx_responses, pagination.next_key);
        Ok(match pagination.total.and_then(|t| t.parse().ok()) {
            Some(total) => page.with_total(total),
            None => page,
        })
    }

    /// Run one search to the end, collecting raw records.
    async fn collect(
        &self,
        control: &FetchControl,
        filter: SearchFilter,
        address: &str,
    ) -> Result<(TxCollector, DriveResult), FetchError> {
        let mut collector: TxCollector = DedupCollector::new(tx_key);
        let result = drive_cursor(
            control,
            None,
            |key| self.fetch_page(filter, address, key),
            &mut collector,
        )
        .await?;
        debug!(filter = ?filter, records = collector.len(), "Search finished");
        Ok((collector, result))
    }
}

#[async_trait]
impl ChainAdapter for CosmosAdapter {
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
        match self.chain {
            CosmosChain::Hub => "bech32 cosmos1... address",
            CosmosChain::Osmosis => "bech32 osmo1... address",
        }
    }

    fn validate_address(&self, address: &str) -> bool {
        let Some(data) = address
            .strip_prefix(self.chain.bech32_hrp())
            .and_then(|rest| rest.strip_prefix('1'))
        else {
            return false;
        };
        ACCOUNT_DATA_LENGTHS.contains(&data.len()) && is_bech32_data(data)
    }

    async fn fetch_transactions(
        &self,
        address: &str,
        options: &FetchOptions,
    ) -> Result<FetchOutcome, AdapterError> {
        ensure_valid_address(self, address)?;
        let chain_id = self.chain.chain_id();
        let span = spans::fetch_transactions(chain_id, address);

        async move {
            if options.cursor.is_some() {
                debug!("Cosmos searches restart from the newest page; ignoring resume cursor");
            }
            // Held batches still stop on a dropped receiver.
            let control = FetchControl::from_options(options);
            let sources = control.without_progress();

            let ((mut union, sent), (received_records, received)) = futures::try_join!(
                self.collect(&sources, SearchFilter::Sender, address),
                self.collect(&sources, SearchFilter::Recipient, address),
            )?;
            union.merge(received_records);
            let completion = sent.completion.merge(received.completion);

            let records = union.into_records();
            let classify_span = spans::classify_union(chain_id, records.len());
            let mut handler = ClassifyingHandler::new(
                chain_id,
                options.date_range(),
                |tx: TxResponse| classify_tx(&tx, address),
            );
            let transactions = classify_span.in_scope(|| handler.handle_page(records));

            info!(
                transactions = transactions.len(),
                skipped = handler.skipped(),
                completion = ?completion,
                "Cosmos fetch finished"
            );
            Ok(finish_merged(&control, &sources, unpositioned(transactions), completion, None).await)
        }
        .instrument(span)
        .await
    }

    fn explorer_url(&self, tx_hash: &str) -> String {
        format!("{}{}", self.chain.explorer(), tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RetryConfig;

    fn adapter(chain: CosmosChain) -> CosmosAdapter {
        let http = HttpService::new(std::time::Duration::from_secs(5)).unwrap();
        CosmosAdapter::new(chain, ApiClient::new(http, RetryConfig::default(), None))
    }

    #[test]
    fn validates_bech32_accounts() {
        let hub = adapter(CosmosChain::Hub);
        assert!(hub.validate_address("cosmos1fl48vsnmsdzcv85q5d2q4z5ajdha8yu34mf0eh"));
        assert!(!hub.validate_address("osmo1fl48vsnmsdzcv85q5d2q4z5ajdha8yu3aq6l09"));
        assert!(!hub.validate_address("cosmos1FL48VSNMSDZCV85Q5D2Q4Z5AJDHA8YU34MF0EH"));
        assert!(!hub.validate_address("cosmos1short"));
        assert!(!hub.validate_address(""));

        let osmosis = adapter(CosmosChain::Osmosis);
        assert!(osmosis.validate_address("osmo1fl48vsnmsdzcv85q5d2q4z5ajdha8yu3aq6l09"));
    }

    #[test]
    fn search_url_encodes_query_and_key() {
        let hub = adapter(CosmosChain::Hub).with_base_url("https://lcd.example");
        let url = hub
            .search_url(
                SearchFilter::Recipient,
                "cosmos1abc",
                Some("AbC+/="),
            )
            .unwrap();
        assert!(url.starts_with("https://lcd.example/cosmos/tx/v1beta1/txs?"));
        assert!(url.contains("query=transfer.recipient%3D%27cosmos1abc%27"));
        assert!(url.contains("pagination.key=AbC%2B%2F%3D"));
    }

    #[test]
    fn explorer_links_per_chain() {
        assert_eq!(
            adapter(CosmosChain::Osmosis).explorer_url("ABC"),
            "https://www.mintscan.io/osmosis/tx/ABC"
        );
        assert_eq!(adapter(CosmosChain::Hub).info().ticker, "ATOM");
    }
}
