// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! # awakenscan
//!
//! Wallet transaction history exporter. For one address on one chain it
//! fetches the raw history from the chain's public explorer API, classifies
//! every record into a canonical [`Transaction`], and renders the result as
//! an Awaken tax CSV.
//!
//! ## Supported chains
//!
//! | Chain id | Provider | Credential |
//! |----------|----------|------------|
//! | `kaspa` | api.kaspa.org | - |
//! | `ergo` | Ergo explorer | - |
//! | `cosmos`, `osmosis` | Cosmos SDK LCD | - |
//! | `polkadot` | Subscan | `SUBSCAN_API_KEY` |
//! | `ethereum`, `base` | Etherscan v2 | `ETHERSCAN_API_KEY` |
//! | `hyperliquid` | Hyperliquid info API (spot and perps) | - |
//!
//! ## Pipeline
//!
//! ```text
//! AdapterRegistry::get(chain)
//!   -> ChainAdapter::fetch_transactions(address, options)
//!        pagination driver <-> transport (retry, rate limit)
//!        raw records -> classification -> sorted Transactions
//!   -> export::generate_standard_csv
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use awakenscan::{AdapterRegistry, ExporterConfig, FetchOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = AdapterRegistry::from_config(&ExporterConfig::default())?;
//! let adapter = registry.get("kaspa").ok_or("unsupported chain")?;
//!
//! let address = "kaspa:qqkqkzjvr7zwxxmjxjkmxxdwju9kjs6e9u82uh59z07vgaks6gg62v8707g73";
//! let outcome = adapter.fetch_transactions(address, &FetchOptions::default()).await?;
//! if outcome.is_partial() {
//!     eprintln!("stopped early: {:?}", outcome.completion);
//! }
//! println!("{}", adapter.to_awaken_csv(&outcome.transactions));
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming
//!
//! [`stream::stream_transactions`] runs a fetch in the background and yields
//! classified batches as they arrive, followed by exactly one terminal event.

pub mod adapters;
pub mod classify;
pub mod config;
pub mod errors;
pub mod export;
pub mod pagination;
mod registry;
mod spans;
pub mod stream;
pub mod transport;
pub mod types;

pub use adapters::{ChainAdapter, ChainInfo, FetchOptions, FetchOutcome};
pub use config::{ChainConfig, Credentials, ExporterConfig, ExporterConfigBuilder};
pub use errors::{
    AdapterError, ClassificationError, ConfigError, ExportError, FetchError, RegistryError,
};
pub use pagination::Completion;
pub use registry::{AdapterRegistry, SharedAdapter};
pub use types::amount::{to_decimal, u256_to_decimal, Decimals};
pub use types::perp::{PerpTag, PerpTransaction};
pub use types::transaction::{AdditionalAsset, AssetAmount, Transaction, TransactionType};
