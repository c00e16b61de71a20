// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Chain id to adapter mapping.
//!
//! The registry is populated once at startup, usually through
//! [`AdapterRegistry::from_config`], and shared read-only afterwards.
//!
//! # Examples
//!
//! ```rust,no_run
//! use awakenscan::{AdapterRegistry, ExporterConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = AdapterRegistry::from_config(&ExporterConfig::default())?;
//!
//! for chain in registry.list() {
//!     println!("{} ({})", chain.chain_name, chain.ticker);
//! }
//!
//! // Unknown ids are unsupported chains, not errors
//! assert!(registry.get("dogecoin").is_none());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::adapters::{
    ChainAdapter, ChainInfo, CosmosAdapter, CosmosChain, ErgoAdapter, EvmAdapter, EvmChain,
    HyperliquidAdapter, KaspaAdapter, PolkadotAdapter,
};
use crate::config::ExporterConfig;
use crate::errors::{ConfigError, RegistryError};
use crate::transport::HttpService;

/// Shared handle to a registered adapter.
pub type SharedAdapter = Arc<dyn ChainAdapter>;

/// A thread-safe map from chain id to adapter.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<String, SharedAdapter>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("chains", &self.chain_ids())
            .finish()
    }
}

impl AdapterRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry of every supported chain from configuration.
    ///
    /// All adapters share one HTTP connection pool; each gets its own rate
    /// limit, page size, base URL, and credentials from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn from_config(config: &ExporterConfig) -> Result<Self, ConfigError> {
        let http = HttpService::new(config.request_timeout)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let adapters: Vec<SharedAdapter> = vec![
            Arc::new(KaspaAdapter::from_config(config, &http)),
            Arc::new(ErgoAdapter::from_config(config, &http)),
            Arc::new(CosmosAdapter::from_config(CosmosChain::Hub, config, &http)),
            Arc::new(CosmosAdapter::from_config(CosmosChain::Osmosis, config, &http)),
            Arc::new(PolkadotAdapter::from_config(config, &http)),
            Arc::new(EvmAdapter::from_config(EvmChain::Ethereum, config, &http)),
            Arc::new(EvmAdapter::from_config(EvmChain::Base, config, &http)),
            Arc::new(HyperliquidAdapter::from_config(config, &http)),
        ];

        let registry = Self::new();
        {
            let mut map = registry.write();
            for adapter in adapters {
                map.insert(adapter.info().chain_id.to_string(), adapter);
            }
        }
        info!(chains = registry.len(), "Adapter registry ready");
        Ok(registry)
    }

    /// Register an adapter under its chain id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] if the id is taken. Use
    /// [`register_or_replace`](Self::register_or_replace) to overwrite.
    pub fn register(&self, adapter: SharedAdapter) -> Result<(), RegistryError> {
        let chain_id = adapter.info().chain_id.to_string();
        let mut adapters = self.write();
        if adapters.contains_key(&chain_id) {
            return Err(RegistryError::AlreadyRegistered { chain_id });
        }
        debug!(chain_id = %chain_id, "Registered adapter");
        adapters.insert(chain_id, adapter);
        Ok(())
    }

    /// Register an adapter, returning the one it replaced.
    pub fn register_or_replace(&self, adapter: SharedAdapter) -> Option<SharedAdapter> {
        let chain_id = adapter.info().chain_id.to_string();
        let previous = self.write().insert(chain_id.clone(), adapter);
        if previous.is_some() {
            debug!(chain_id = %chain_id, "Replaced existing adapter");
        }
        previous
    }

    /// The adapter for a chain id, or `None` for an unsupported chain.
    #[must_use]
    pub fn get(&self, chain_id: &str) -> Option<SharedAdapter> {
        self.read().get(chain_id).cloned()
    }

    /// Identity and capabilities of every registered adapter, sorted by id.
    #[must_use]
    pub fn list(&self) -> Vec<ChainInfo> {
        let mut infos: Vec<ChainInfo> = self.read().values().map(|a| a.info()).collect();
        infos.sort_by_key(|info| info.chain_id);
        infos
    }

    #[must_use]
    pub fn contains(&self, chain_id: &str) -> bool {
        self.read().contains_key(chain_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn chain_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    // Adapters are immutable once registered, so a poisoned map is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, SharedAdapter>> {
        self.adapters.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, SharedAdapter>> {
        self.adapters.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::chains;

    #[test]
    fn default_registry_covers_every_chain() {
        let registry = AdapterRegistry::from_config(&ExporterConfig::default()).unwrap();
        let ids: Vec<&str> = registry.list().iter().map(|c| c.chain_id).collect();
        let mut expected = chains::ALL.to_vec();
        expected.sort();
        assert_eq!(ids, expected);

        let perps: Vec<&str> = registry
            .list()
            .into_iter()
            .filter(|c| c.perps_capable)
            .map(|c| c.chain_id)
            .collect();
        assert_eq!(perps, vec![chains::HYPERLIQUID]);
    }

    #[test]
    fn duplicate_registration_needs_explicit_replace() {
        let registry = AdapterRegistry::from_config(&ExporterConfig::default()).unwrap();
        let kaspa = registry.get(chains::KASPA).unwrap();

        let err = registry.register(kaspa.clone()).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered { ref chain_id } if chain_id == chains::KASPA));

        assert!(registry.register_or_replace(kaspa).is_some());
        assert_eq!(registry.len(), chains::ALL.len());
    }

    #[test]
    fn unknown_chain_is_none() {
        let registry = AdapterRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("dogecoin").is_none());
    }
}
