// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for per-chain configuration
//!
//! These tests use proptest to validate how chain overrides resolve against
//! global settings across many configurations.

use awakenscan::config::constants::chains;
use awakenscan::ExporterConfigBuilder;
use proptest::prelude::*;
use std::time::Duration;

fn arb_chain() -> impl Strategy<Value = &'static str> {
    prop::sample::select(chains::ALL.to_vec())
}

fn arb_duration() -> impl Strategy<Value = Duration> {
    (0u64..=5000).prop_map(Duration::from_millis)
}

proptest! {
    /// Property: Chain-specific rate limit always overrides the global one
    #[test]
    fn prop_chain_override_always_wins(
        global in arb_duration(),
        chain_delay in arb_duration(),
        chain in arb_chain(),
    ) {
        let config = ExporterConfigBuilder::new()
            .rate_limit_delay(global)
            .chain_rate_limit(chain, chain_delay)
            .build();

        prop_assert_eq!(config.get_rate_limit_delay(chain), Some(chain_delay));
    }

    /// Property: Overrides on different chains do not interfere
    #[test]
    fn prop_multiple_overrides_independent(
        chain1 in arb_chain(),
        chain2 in arb_chain(),
        delay1 in arb_duration(),
        delay2 in arb_duration(),
    ) {
        prop_assume!(chain1 != chain2);

        let config = ExporterConfigBuilder::new()
            .chain_rate_limit(chain1, delay1)
            .chain_rate_limit(chain2, delay2)
            .build();

        prop_assert_eq!(config.get_rate_limit_delay(chain1), Some(delay1));
        prop_assert_eq!(config.get_rate_limit_delay(chain2), Some(delay2));
    }

    /// Property: The last override for a chain wins
    #[test]
    fn prop_last_override_wins(
        chain in arb_chain(),
        first in arb_duration(),
        last in arb_duration(),
    ) {
        let config = ExporterConfigBuilder::new()
            .chain_rate_limit(chain, first)
            .chain_rate_limit(chain, last)
            .build();

        prop_assert_eq!(config.get_rate_limit_delay(chain), Some(last));
    }

    /// Property: Effective page size is always within 1..=provider_max
    #[test]
    fn prop_page_size_is_clamped(
        chain in arb_chain(),
        requested in 0u32..=100_000,
        provider_max in 1u32..=10_000,
    ) {
        let config = ExporterConfigBuilder::new()
            .chain_page_size(chain, requested)
            .build();

        let size = config.get_page_size(chain, provider_max);
        prop_assert!(size >= 1);
        prop_assert!(size <= provider_max);
        if (1..=provider_max).contains(&requested) {
            prop_assert_eq!(size, requested);
        }
    }

    /// Property: Without any page size setting the provider maximum applies
    #[test]
    fn prop_page_size_defaults_to_provider_max(
        chain in arb_chain(),
        provider_max in 1u32..=10_000,
    ) {
        let config = ExporterConfigBuilder::new().build();
        prop_assert_eq!(config.get_page_size(chain, provider_max), provider_max);
    }

    /// Property: Cloned config resolves identically
    #[test]
    fn prop_clone_preserves_all_settings(
        global in arb_duration(),
        chain in arb_chain(),
        chain_delay in arb_duration(),
    ) {
        let original = ExporterConfigBuilder::new()
            .rate_limit_delay(global)
            .chain_rate_limit(chain, chain_delay)
            .disable_chain(chain)
            .build();
        let cloned = original.clone();

        for other in chains::ALL {
            prop_assert_eq!(original.get_rate_limit_delay(other), cloned.get_rate_limit_delay(other));
            prop_assert_eq!(original.is_enabled(other), cloned.is_enabled(other));
        }
        prop_assert!(!cloned.is_enabled(chain));
    }
}
