// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Well-known chain identifiers, endpoints and explorer links
//!
//! This module centralizes the magic strings used by the chain adapters so
//! that overrides in [`ChainConfig`](super::ChainConfig) have one place to
//! point at.

/// Registry identifiers, one per supported chain.
pub mod chains {
    pub const KASPA: &str = "kaspa";
    pub const ERGO: &str = "ergo";
    pub const COSMOS_HUB: &str = "cosmos";
    pub const OSMOSIS: &str = "osmosis";
    pub const POLKADOT: &str = "polkadot";
    pub const ETHEREUM: &str = "ethereum";
    pub const BASE: &str = "base";
    pub const HYPERLIQUID: &str = "hyperliquid";

    /// Every chain the default registry knows about.
    pub const ALL: [&str; 8] = [
        KASPA,
        ERGO,
        COSMOS_HUB,
        OSMOSIS,
        POLKADOT,
        ETHEREUM,
        BASE,
        HYPERLIQUID,
    ];
}

/// Public API base URLs.
pub mod endpoints {
    /// Kaspa REST API (`/addresses/{addr}/full-transactions`)
    pub const KASPA_API: &str = "https://api.kaspa.org";

    /// Ergo explorer API v1 (`/addresses/{addr}/transactions`)
    pub const ERGO_API: &str = "https://api.ergoplatform.com/api/v1";

    /// Cosmos Hub LCD (`/cosmos/tx/v1beta1/txs`)
    pub const COSMOS_HUB_LCD: &str = "https://cosmos-rest.publicnode.com";

    /// Osmosis LCD
    pub const OSMOSIS_LCD: &str = "https://lcd.osmosis.zone";

    /// Subscan Polkadot API (requires `X-API-Key`)
    pub const SUBSCAN_POLKADOT: &str = "https://polkadot.api.subscan.io";

    /// Etherscan multichain API v2 (requires `apikey`, selects chain with `chainid`)
    pub const ETHERSCAN_V2: &str = "https://api.etherscan.io/v2/api";

    /// Hyperliquid info endpoint (POST)
    pub const HYPERLIQUID_INFO: &str = "https://api.hyperliquid.xyz/info";
}

/// Explorer transaction-page prefixes; the hash is appended.
pub mod explorers {
    pub const KASPA: &str = "https://explorer.kaspa.org/txs/";
    pub const ERGO: &str = "https://explorer.ergoplatform.com/en/transactions/";
    pub const COSMOS_HUB: &str = "https://www.mintscan.io/cosmos/tx/";
    pub const OSMOSIS: &str = "https://www.mintscan.io/osmosis/tx/";
    pub const POLKADOT: &str = "https://polkadot.subscan.io/extrinsic/";
    pub const ETHEREUM: &str = "https://etherscan.io/tx/";
    pub const BASE: &str = "https://basescan.org/tx/";
    pub const HYPERLIQUID: &str = "https://app.hyperliquid.xyz/explorer/tx/";
}

/// EIP-155 chain ids passed to Etherscan v2.
pub mod evm_chain_ids {
    pub const ETHEREUM: u64 = 1;
    pub const BASE: u64 = 8453;
}

/// Environment variables holding provider credentials.
pub mod env_vars {
    pub const ETHERSCAN_API_KEY: &str = "ETHERSCAN_API_KEY";
    pub const SUBSCAN_API_KEY: &str = "SUBSCAN_API_KEY";
}

/// Ergo mainnet miner-fee contract address.
///
/// Outputs locked by this contract are the transaction fee.
pub const ERGO_FEE_ADDRESS: &str = "2iHkR7CWvD1R4j1yZg5bkeDRQavjAaVPeTDFGGLZduHyfWMuYpmhHocX8GJoaieTx78FntzJbCBVL6rf96ocJoZdmWBL2fci7NqWgAirppPQmZ7fN9V6z13Ay6brPriBKYqLp1bT2Fk4FkFLCfdPpe";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids_are_unique() {
        let mut ids = chains::ALL.to_vec();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), chains::ALL.len());
    }

    #[test]
    fn explorer_prefixes_end_with_slash() {
        for prefix in [
            explorers::KASPA,
            explorers::ERGO,
            explorers::COSMOS_HUB,
            explorers::OSMOSIS,
            explorers::POLKADOT,
            explorers::ETHEREUM,
            explorers::BASE,
            explorers::HYPERLIQUID,
        ] {
            assert!(prefix.ends_with('/'), "{prefix}");
        }
    }
}
