// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Pagination drivers.
//!
//! Three interchangeable strategies, selected per adapter based on the
//! provider's paging idiom:
//!
//! | Driver | Request | Stops when |
//! |--------|---------|------------|
//! | [`drive_offset`] | `offset`, `limit` | empty page, short page, or reported total reached |
//! | [`drive_pages`] | `page`, `per_page` | provider signals no next page, or empty page |
//! | [`drive_cursor`] | opaque cursor | no cursor returned |
//!
//! Every driver checks cancellation before each request, hands each page to a
//! [`PageHandler`], pushes non-empty batches to the progress sink (waiting for
//! capacity, so a slow consumer gates the next request), and honors the
//! caller's `cursor`/`limit` overrides for resumption.
//!
//! Pages are fetched strictly sequentially: each request depends on the
//! previous response.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::adapters::FetchOptions;
use crate::errors::ClassificationError;
use crate::stream::ProgressSink;
use crate::types::transaction::Transaction;

mod cursor;
mod offset;
mod page;

pub use cursor::{drive_cursor, CursorPage};
pub use offset::{drive_offset, OffsetPage, OffsetParams};
pub use page::{drive_pages, NumberedPage, PageParams};

/// How a fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Every page was fetched
    Complete,
    /// Cancellation was requested (or the progress receiver went away);
    /// the transactions from completed pages are kept
    Cancelled,
    /// The caller's record limit was reached; resume from `next_cursor`
    LimitReached,
}

impl Completion {
    /// Combine the outcomes of concurrent queries: any cut-short query makes
    /// the whole result partial.
    pub fn merge(self, other: Completion) -> Completion {
        match (self, other) {
            (Completion::Cancelled, _) | (_, Completion::Cancelled) => Completion::Cancelled,
            (Completion::LimitReached, _) | (_, Completion::LimitReached) => {
                Completion::LimitReached
            }
            _ => Completion::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Completion::Complete)
    }
}

/// Inclusive date bounds applied after classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }

    /// Whether `date` is before the lower bound. Providers that page newest
    /// first can stop once they pass it.
    pub fn is_before_start(&self, date: DateTime<Utc>) -> bool {
        self.from.is_some_and(|from| date < from)
    }
}

/// Turns one page of raw records into classified transactions.
pub trait PageHandler<R> {
    fn handle_page(&mut self, records: Vec<R>) -> Vec<Transaction>;
}

/// Classifies each record with a pure function, keeps those inside the date
/// range, and logs and skips records that fail to classify.
pub struct ClassifyingHandler<F> {
    chain_id: &'static str,
    range: DateRange,
    classify: F,
    skipped: usize,
}

impl<F> ClassifyingHandler<F> {
    pub fn new(chain_id: &'static str, range: DateRange, classify: F) -> Self {
        Self {
            chain_id,
            range,
            classify,
            skipped: 0,
        }
    }

    /// Records skipped because they could not be classified.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R, F> PageHandler<R> for ClassifyingHandler<F>
where
    F: FnMut(R) -> Result<Option<Transaction>, ClassificationError>,
{
    fn handle_page(&mut self, records: Vec<R>) -> Vec<Transaction> {
        let mut batch = Vec::with_capacity(records.len());
        for record in records {
            match (self.classify)(record) {
                Ok(Some(tx)) if self.range.contains(tx.date) => batch.push(tx),
                Ok(_) => {}
                Err(error) => {
                    self.skipped += 1;
                    warn!(chain_id = self.chain_id, error = %error, "Skipping malformed record");
                }
            }
        }
        batch
    }
}

/// Collects raw records from several queries, keeping one record per key.
///
/// Used when a provider needs separate queries for the two sides of a
/// transfer (sender and recipient filters): a transaction matching both
/// appears once in the union. Records without a key are always kept.
pub struct DedupCollector<R, K> {
    key: K,
    seen: HashSet<String>,
    records: Vec<R>,
}

impl<R, K> DedupCollector<R, K>
where
    K: Fn(&R) -> Option<String>,
{
    pub fn new(key: K) -> Self {
        Self {
            key,
            seen: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// Add a record unless its key was already seen. Returns whether it was added.
    pub fn insert(&mut self, record: R) -> bool {
        if let Some(key) = (self.key)(&record) {
            if !self.seen.insert(key) {
                return false;
            }
        }
        self.records.push(record);
        true
    }

    /// Fold another collector's records into this one.
    pub fn merge(&mut self, other: DedupCollector<R, K>) {
        for record in other.records {
            self.insert(record);
        }
    }

    /// Drop every record `keep` rejects, forgetting its key.
    pub fn retain(&mut self, keep: impl Fn(&R) -> bool) {
        let key = &self.key;
        let seen = &mut self.seen;
        self.records.retain(|record| {
            let kept = keep(record);
            if !kept {
                if let Some(k) = key(record) {
                    seen.remove(&k);
                }
            }
            kept
        });
    }

    /// The most recently added record.
    pub fn last(&self) -> Option<&R> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The union, in first-seen order.
    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

impl<R, K> PageHandler<R> for DedupCollector<R, K>
where
    K: Fn(&R) -> Option<String>,
{
    fn handle_page(&mut self, records: Vec<R>) -> Vec<Transaction> {
        let before = self.records.len();
        for record in records {
            self.insert(record);
        }
        debug!(added = self.records.len() - before, total = self.records.len(), "Collected page");
        Vec::new()
    }
}

/// Per-fetch controls shared by the drivers: cancellation, progress and limit.
///
/// A dropped progress receiver counts as cancellation, including for
/// controls whose batches are held back.
#[derive(Debug, Clone, Default)]
pub struct FetchControl {
    cancel: Option<CancellationToken>,
    progress: Option<ProgressSink>,
    hold_batches: bool,
    hold_totals: bool,
    limit: Option<usize>,
}

impl FetchControl {
    pub fn from_options(options: &FetchOptions) -> Self {
        Self {
            cancel: options.cancel.clone(),
            progress: options.progress.clone(),
            limit: options.limit,
            ..Self::default()
        }
    }

    /// Same controls, but batches and total hints are held back for queries
    /// whose records are classified only after all of them finish.
    pub fn without_progress(&self) -> Self {
        Self {
            hold_batches: true,
            hold_totals: true,
            ..self.clone()
        }
    }

    /// Same controls without total hints, for a secondary query whose count
    /// would contradict the primary one.
    pub fn without_totals(&self) -> Self {
        Self {
            hold_totals: true,
            ..self.clone()
        }
    }

    /// Controls for one of several concurrent sources.
    ///
    /// Without a limit each source delivers its pages as they arrive. With a
    /// limit the merged union is truncated afterwards, so batches are held
    /// back and delivered once.
    pub fn for_sources(&self) -> Self {
        if self.limit.is_some() {
            self.without_progress()
        } else {
            self.clone()
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether paging should stop: the token was cancelled or the progress
    /// receiver is gone.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
            || self.progress.as_ref().is_some_and(ProgressSink::is_closed)
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether batches reach the progress sink as pages arrive.
    pub fn delivers_batches(&self) -> bool {
        self.progress.is_some() && !self.hold_batches
    }

    /// Records that may still be consumed, if a limit is set.
    pub(crate) fn remaining(&self, consumed: usize) -> Option<usize> {
        self.limit.map(|limit| limit.saturating_sub(consumed))
    }

    /// Push a batch to the progress sink. Returns `false` if the receiver is
    /// gone and the fetch should stop.
    pub async fn emit(&self, batch: &[Transaction]) -> bool {
        match &self.progress {
            Some(sink) if !self.hold_batches && !batch.is_empty() => sink.batch(batch.to_vec()).await,
            _ => true,
        }
    }

    /// Push a total-count hint to the progress sink.
    pub async fn emit_total(&self, total: u64) {
        match &self.progress {
            Some(sink) if !self.hold_totals => {
                sink.estimated_total(total).await;
            }
            _ => {}
        }
    }
}

/// Drops records whose key was already seen, then hands the rest of the page
/// to the wrapped handler. Records without a key always pass.
pub struct UniqueRecords<H, K> {
    inner: H,
    key: K,
    seen: HashSet<String>,
}

impl<H, K> UniqueRecords<H, K> {
    pub fn new(inner: H, key: K) -> Self {
        Self {
            inner,
            key,
            seen: HashSet::new(),
        }
    }
}

impl<R, H, K> PageHandler<R> for UniqueRecords<H, K>
where
    H: PageHandler<R>,
    K: Fn(&R) -> Option<String>,
{
    fn handle_page(&mut self, records: Vec<R>) -> Vec<Transaction> {
        let fresh: Vec<R> = records
            .into_iter()
            .filter(|record| (self.key)(record).map_or(true, |key| self.seen.insert(key)))
            .collect();
        self.inner.handle_page(fresh)
    }
}

/// Wraps a page-number handler and remembers the page each classified
/// transaction came from.
///
/// [`drive_pages`] hands non-empty pages to the handler one at a time in
/// page order, so the n-th call covers `start_page + n`.
pub struct PageTagging<H> {
    inner: H,
    next_page: u32,
    pages: Vec<u32>,
}

impl<H> PageTagging<H> {
    pub fn new(inner: H, start_page: u32) -> Self {
        Self {
            inner,
            next_page: start_page,
            pages: Vec::new(),
        }
    }

    /// Pair transactions (in the order the driver returned them) with their pages.
    pub fn tag(&self, transactions: Vec<Transaction>) -> Vec<(Transaction, Option<u64>)> {
        transactions
            .into_iter()
            .zip(self.pages.iter().map(|page| Some(u64::from(*page))))
            .collect()
    }
}

impl<R, H: PageHandler<R>> PageHandler<R> for PageTagging<H> {
    fn handle_page(&mut self, records: Vec<R>) -> Vec<Transaction> {
        let batch = self.inner.handle_page(records);
        self.pages
            .extend(std::iter::repeat(self.next_page).take(batch.len()));
        self.next_page += 1;
        batch
    }
}

/// Result of running one driver to the end.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveResult {
    /// Classified transactions in page order
    pub transactions: Vec<Transaction>,
    pub completion: Completion,
    /// Where to resume when the fetch was cut short
    pub next_cursor: Option<String>,
    /// Raw records consumed
    pub records: usize,
    /// Requests issued
    pub pages: u32,
}

impl DriveResult {
    fn new() -> Self {
        Self {
            transactions: Vec::new(),
            completion: Completion::Complete,
            next_cursor: None,
            records: 0,
            pages: 0,
        }
    }

    fn stop(mut self, completion: Completion, next_cursor: Option<String>) -> Self {
        self.completion = completion;
        self.next_cursor = next_cursor;
        self
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use std::sync::Mutex;

    use bigdecimal::BigDecimal;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::transaction::TransactionType;

    /// Records the position of every page request.
    #[derive(Default)]
    pub(crate) struct Calls(Mutex<Vec<String>>);

    impl Calls {
        pub(crate) fn record(&self, position: impl ToString) {
            self.0.lock().unwrap().push(position.to_string());
        }

        pub(crate) fn positions(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    pub(crate) type NumberedHandler =
        ClassifyingHandler<fn(u32) -> Result<Option<Transaction>, ClassificationError>>;

    /// Turns record `n` into a receive of `n` KAS.
    pub(crate) fn numbered_handler() -> NumberedHandler {
        fn classify(n: u32) -> Result<Option<Transaction>, ClassificationError> {
            Ok(Transaction::builder(
                Utc.timestamp_opt(1_700_000_000 + i64::from(n), 0).unwrap(),
                TransactionType::Receive,
            )
            .received(BigDecimal::from(n), "KAS")
            .build())
        }
        ClassifyingHandler::new("test", DateRange::default(), classify as _)
    }
}
