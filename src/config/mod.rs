// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration for awakenscan operations
//!
//! This module provides a flexible configuration system for controlling
//! retry behavior, rate limiting, page sizes and endpoints per chain.
//!
//! # Example: Using defaults
//!
//! ```rust
//! use awakenscan::ExporterConfig;
//!
//! // Free-tier friendly: Subscan and Etherscan requests are spaced out
//! let config = ExporterConfig::default();
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use awakenscan::ExporterConfigBuilder;
//! use std::time::Duration;
//!
//! let config = ExporterConfigBuilder::with_defaults()
//!     .max_retries(5)
//!     .chain_rate_limit("kaspa", Duration::from_millis(100))
//!     .chain_base_url("ergo", "http://localhost:8080/api/v1")
//!     .build();
//! ```
//!
//! # Example: Paid API plans (no delays)
//!
//! ```rust
//! use awakenscan::ExporterConfig;
//!
//! let config = ExporterConfig::minimal();
//! ```

use std::collections::HashMap;
use std::time::Duration;

use crate::transport::RetryConfig;

pub mod constants;
mod credentials;

pub use credentials::Credentials;

use constants::chains;

/// Configuration for awakenscan operations
///
/// Controls HTTP behavior including retries, rate limiting, and timeouts.
/// Use [`ExporterConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Delay between requests to one provider
    /// Default: None (no delay)
    pub rate_limit_delay: Option<Duration>,

    /// Records requested per page; `None` lets each adapter use its provider's maximum
    pub page_size: Option<u32>,

    /// Timeout for a single HTTP call
    /// Default: 30 seconds (prevents hanging on unresponsive providers)
    pub request_timeout: Duration,

    /// Retry policy for 429/5xx and network failures
    pub retry: RetryConfig,

    /// Provider API keys
    pub credentials: Credentials,

    /// Chain-specific overrides, keyed by chain id
    pub chain_overrides: HashMap<String, ChainConfig>,
}

/// Chain-specific configuration overrides
///
/// Allows per-chain customization of rate limits, page sizes and endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainConfig {
    /// Override rate limit delay for this chain
    pub rate_limit_delay: Option<Duration>,

    /// Override page size for this chain
    pub page_size: Option<u32>,

    /// Override the API base URL (self-hosted explorers, test servers)
    pub base_url: Option<String>,

    /// Set to `Some(false)` to list the chain as disabled
    pub enabled: Option<bool>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self::with_common_defaults()
    }
}

impl ExporterConfig {
    /// Create config with defaults suited to free provider tiers
    ///
    /// Subscan's free tier allows roughly 5 requests per second and
    /// Etherscan's 5 per second per key, so those chains get a delay.
    ///
    /// # Example
    ///
    /// ```rust
    /// use awakenscan::ExporterConfig;
    /// use std::time::Duration;
    ///
    /// let config = ExporterConfig::with_common_defaults();
    /// assert_eq!(config.get_rate_limit_delay("polkadot"), Some(Duration::from_millis(250)));
    /// assert_eq!(config.get_rate_limit_delay("kaspa"), None);
    /// ```
    pub fn with_common_defaults() -> Self {
        let mut config = Self::minimal();

        config.set_chain_override(
            chains::POLKADOT,
            ChainConfig {
                rate_limit_delay: Some(Duration::from_millis(250)),
                ..ChainConfig::default()
            },
        );

        // Both chains share one Etherscan key and therefore one quota
        for chain in [chains::ETHEREUM, chains::BASE] {
            config.set_chain_override(
                chain,
                ChainConfig {
                    rate_limit_delay: Some(Duration::from_millis(220)),
                    ..ChainConfig::default()
                },
            );
        }

        config
    }

    /// Create minimal config with no delays
    ///
    /// Suitable for testing or paid API plans with generous rate limits.
    pub fn minimal() -> Self {
        Self {
            rate_limit_delay: None,
            page_size: None,
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            credentials: Credentials::default(),
            chain_overrides: HashMap::new(),
        }
    }

    /// Get effective rate limit delay for a specific chain
    ///
    /// Returns chain-specific override if set, otherwise returns global default.
    pub fn get_rate_limit_delay(&self, chain: &str) -> Option<Duration> {
        self.chain_overrides
            .get(chain)
            .and_then(|c| c.rate_limit_delay)
            .or(self.rate_limit_delay)
    }

    /// Get effective page size for a chain, falling back to the adapter's own default.
    ///
    /// The result is clamped to `1..=provider_max`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use awakenscan::ExporterConfigBuilder;
    ///
    /// let config = ExporterConfigBuilder::new().chain_page_size("kaspa", 50).build();
    /// assert_eq!(config.get_page_size("kaspa", 500), 50);
    /// assert_eq!(config.get_page_size("ergo", 500), 500);
    /// ```
    pub fn get_page_size(&self, chain: &str, provider_max: u32) -> u32 {
        self.chain_overrides
            .get(chain)
            .and_then(|c| c.page_size)
            .or(self.page_size)
            .unwrap_or(provider_max)
            .clamp(1, provider_max.max(1))
    }

    /// Get effective API base URL for a chain.
    pub fn get_base_url(&self, chain: &str, default: &str) -> String {
        self.chain_overrides
            .get(chain)
            .and_then(|c| c.base_url.clone())
            .unwrap_or_else(|| default.to_string())
    }

    /// Whether the chain should be listed as enabled.
    pub fn is_enabled(&self, chain: &str) -> bool {
        self.chain_overrides
            .get(chain)
            .and_then(|c| c.enabled)
            .unwrap_or(true)
    }

    /// Set chain-specific override
    pub fn set_chain_override(&mut self, chain: impl Into<String>, config: ChainConfig) {
        self.chain_overrides.insert(chain.into(), config);
    }

    fn override_mut(&mut self, chain: &str) -> &mut ChainConfig {
        self.chain_overrides.entry(chain.to_string()).or_default()
    }
}

/// Builder for [`ExporterConfig`]
///
/// # Example
///
/// ```rust
/// use awakenscan::{Credentials, ExporterConfigBuilder};
/// use std::time::Duration;
///
/// let config = ExporterConfigBuilder::new()
///     .request_timeout(Duration::from_secs(10))
///     .credentials(Credentials::default().with_subscan_key("key"))
///     .chain_rate_limit("polkadot", Duration::from_millis(500))
///     .build();
/// ```
pub struct ExporterConfigBuilder {
    config: ExporterConfig,
}

impl Default for ExporterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: ExporterConfig::minimal(),
        }
    }

    /// Start with common defaults
    ///
    /// Initializes the builder with the same defaults as [`ExporterConfig::with_common_defaults`].
    pub fn with_defaults() -> Self {
        Self {
            config: ExporterConfig::with_common_defaults(),
        }
    }

    /// Set global rate limit delay
    pub fn rate_limit_delay(mut self, delay: Duration) -> Self {
        self.config.rate_limit_delay = Some(delay);
        self
    }

    /// Set global page size
    pub fn page_size(mut self, size: u32) -> Self {
        self.config.page_size = Some(size);
        self
    }

    /// Set the per-call HTTP timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the number of retries after the initial attempt
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Set the base delay of the exponential backoff
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.config.retry.base_delay = delay;
        self
    }

    /// Replace the whole retry policy
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Add chain-specific configuration
    pub fn chain_config(mut self, chain: &str, config: ChainConfig) -> Self {
        self.config.set_chain_override(chain, config);
        self
    }

    /// Convenience: set rate limit delay for a specific chain
    pub fn chain_rate_limit(mut self, chain: &str, delay: Duration) -> Self {
        self.config.override_mut(chain).rate_limit_delay = Some(delay);
        self
    }

    /// Convenience: set page size for a specific chain
    pub fn chain_page_size(mut self, chain: &str, size: u32) -> Self {
        self.config.override_mut(chain).page_size = Some(size);
        self
    }

    /// Convenience: point a chain at a different API base URL
    pub fn chain_base_url(mut self, chain: &str, url: impl Into<String>) -> Self {
        self.config.override_mut(chain).base_url = Some(url.into());
        self
    }

    /// Convenience: mark a chain disabled in listings
    pub fn disable_chain(mut self, chain: &str) -> Self {
        self.config.override_mut(chain).enabled = Some(false);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> ExporterConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExporterConfig::default();

        assert_eq!(
            config.get_rate_limit_delay(chains::POLKADOT),
            Some(Duration::from_millis(250))
        );
        assert_eq!(
            config.get_rate_limit_delay(chains::BASE),
            Some(Duration::from_millis(220))
        );
        assert_eq!(config.get_rate_limit_delay(chains::KASPA), None);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_minimal_config() {
        let config = ExporterConfig::minimal();

        assert_eq!(config.get_rate_limit_delay(chains::POLKADOT), None);
        assert_eq!(config.get_rate_limit_delay(chains::ETHEREUM), None);
        assert!(config.is_enabled(chains::KASPA));
    }

    #[test]
    fn test_chain_config_preserves_existing() {
        let config = ExporterConfigBuilder::new()
            .chain_page_size(chains::ERGO, 100)
            .chain_rate_limit(chains::ERGO, Duration::from_millis(100))
            .build();

        assert_eq!(config.get_page_size(chains::ERGO, 500), 100);
        assert_eq!(
            config.get_rate_limit_delay(chains::ERGO),
            Some(Duration::from_millis(100))
        );
    }

    #[test]
    fn test_chain_override_global_rate_limit() {
        let config = ExporterConfigBuilder::new()
            .rate_limit_delay(Duration::from_millis(500))
            .chain_rate_limit(chains::BASE, Duration::from_millis(250))
            .build();

        assert_eq!(
            config.get_rate_limit_delay(chains::BASE),
            Some(Duration::from_millis(250))
        );
        assert_eq!(
            config.get_rate_limit_delay(chains::KASPA),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_page_size_clamped_to_provider_max() {
        let config = ExporterConfigBuilder::new().page_size(10_000).build();
        assert_eq!(config.get_page_size(chains::KASPA, 500), 500);

        let config = ExporterConfigBuilder::new().page_size(0).build();
        assert_eq!(config.get_page_size(chains::KASPA, 500), 1);
    }

    #[test]
    fn test_base_url_and_disable() {
        let config = ExporterConfigBuilder::new()
            .chain_base_url(chains::ERGO, "http://localhost:9052/api/v1")
            .disable_chain(chains::OSMOSIS)
            .build();

        assert_eq!(
            config.get_base_url(chains::ERGO, constants::endpoints::ERGO_API),
            "http://localhost:9052/api/v1"
        );
        assert_eq!(
            config.get_base_url(chains::KASPA, constants::endpoints::KASPA_API),
            constants::endpoints::KASPA_API
        );
        assert!(!config.is_enabled(chains::OSMOSIS));
    }
}
