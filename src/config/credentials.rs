// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Provider API keys.

use std::fmt;

use super::constants::env_vars;

/// API keys for providers that require one.
///
/// Keys are read once (usually at registry construction) and handed to the
/// adapters that need them. `Debug` output never shows the key values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Etherscan v2 key, shared by every Etherscan-compatible chain
    pub etherscan_api_key: Option<String>,
    /// Subscan key for Polkadot
    pub subscan_api_key: Option<String>,
}

impl Credentials {
    /// Read keys from the process environment (and `.env` if loaded).
    ///
    /// Empty values are treated as absent.
    pub fn from_env() -> Self {
        Self {
            etherscan_api_key: read_var(env_vars::ETHERSCAN_API_KEY),
            subscan_api_key: read_var(env_vars::SUBSCAN_API_KEY),
        }
    }

    pub fn with_etherscan_key(mut self, key: impl Into<String>) -> Self {
        self.etherscan_api_key = Some(key.into());
        self
    }

    pub fn with_subscan_key(mut self, key: impl Into<String>) -> Self {
        self.subscan_api_key = Some(key.into());
        self
    }
}

fn read_var(name: &str) -> Option<String> {
    dotenvy::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(key: &Option<String>) -> &'static str {
            if key.is_some() {
                "<redacted>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("Credentials")
            .field("etherscan_api_key", &redact(&self.etherscan_api_key))
            .field("subscan_api_key", &redact(&self.subscan_api_key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_keys() {
        let credentials = Credentials::default().with_etherscan_key("super-secret");
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("<unset>"));
    }
}
