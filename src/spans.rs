// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Span creation helpers for awakenscan operations.
//!
//! Telemetry is kept out of business logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a helper here and the call
//! site attaches the span with `.instrument(span)`.
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn fetch_transactions(&self, address: &str, options: &FetchOptions) -> Result<..> {
//!     let span = spans::fetch_transactions(self.info().chain_id, address);
//!     async move {
//!         // Business logic here
//!     }
//!     .instrument(span)
//!     .await
//! }
//! ```

use tracing::{Level, Span};

/// Create span for one adapter fetch.
///
/// Parent: None (root span for this operation)
/// Children: fetch_page spans, http request spans
#[inline]
pub(crate) fn fetch_transactions(chain_id: &str, address: &str) -> Span {
    tracing::span!(
        Level::INFO,
        "awakenscan.fetch_transactions",
        chain_id = %chain_id,
        address = %address,
    )
}

/// Create span for one perpetuals fetch.
///
/// Parent: None (root span for this operation)
#[inline]
pub(crate) fn fetch_perp_transactions(chain_id: &str, address: &str) -> Span {
    tracing::info_span!(
        "awakenscan.fetch_perp_transactions",
        chain_id = %chain_id,
        address = %address,
    )
}

/// Create span for one page of a paginated query.
///
/// Parent: fetch_transactions span
/// Children: http request spans (one per attempt)
#[inline]
pub(crate) fn fetch_page(strategy: &'static str, position: &str) -> Span {
    tracing::debug_span!(
        "awakenscan.fetch_page",
        strategy = strategy,
        position = %position,
    )
}

/// Create span for classifying a deduplicated union of records.
///
/// Parent: fetch_transactions span
#[inline]
pub(crate) fn classify_union(chain_id: &str, records: usize) -> Span {
    tracing::debug_span!(
        "awakenscan.classify_union",
        chain_id = %chain_id,
        records = records,
    )
}

/// Create span for a background streaming fetch.
///
/// Parent: None (the task is detached)
/// Children: fetch_transactions span
#[inline]
pub(crate) fn stream_transactions(chain_id: &str, address: &str) -> Span {
    tracing::info_span!(
        "awakenscan.stream_transactions",
        chain_id = %chain_id,
        address = %address,
    )
}
