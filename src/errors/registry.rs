// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Adapter registry errors.

/// Errors from registering adapters.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An adapter with this id is already registered.
    ///
    /// Use [`crate::AdapterRegistry::register_or_replace`] to overwrite on purpose.
    #[error("An adapter is already registered for chain {chain_id}")]
    AlreadyRegistered {
        /// The duplicated chain id
        chain_id: String,
    },
}
