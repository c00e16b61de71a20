// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types shared across awakenscan.
//!
//! - The canonical [`Transaction`](transaction::Transaction) record and its builder
//! - Perpetuals records for the perps CSV layout
//! - Smallest-unit amount conversion with per-asset decimals

pub mod amount;
pub mod perp;
pub mod transaction;

// Note: Public types are re-exported from lib.rs, not here
