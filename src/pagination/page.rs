// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Page-number pagination.

use std::future::Future;

use tracing::{debug, Instrument};

use super::{Completion, DriveResult, FetchControl, PageHandler};
use crate::errors::FetchError;
use crate::spans;

/// First page to request and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub start_page: u32,
    pub per_page: u32,
}

impl PageParams {
    /// Start at `cursor` (a page number from a previous partial fetch) or at
    /// `first_page` (0 for Subscan, 1 for Etherscan).
    pub fn resume(cursor: Option<&str>, first_page: u32, per_page: u32) -> Self {
        let start_page = cursor
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(first_page);
        Self {
            start_page,
            per_page: per_page.max(1),
        }
    }
}

/// One page from a page-number endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedPage<R> {
    pub records: Vec<R>,
    /// `false` once the provider signals there is no next page
    pub has_next: bool,
    /// Total record count, when the provider reports it
    pub total: Option<u64>,
}

impl<R> NumberedPage<R> {
    /// A page whose successor exists only if it came back full.
    pub fn sized(records: Vec<R>, per_page: u32) -> Self {
        let has_next = records.len() >= per_page as usize;
        Self {
            records,
            has_next,
            total: None,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Override the next-page signal (e.g. the provider's window limit).
    pub fn with_has_next(mut self, has_next: bool) -> Self {
        self.has_next = has_next;
        self
    }
}

/// Drive a page-number endpoint until the provider reports no next page.
///
/// `fetch(page, per_page)` requests one page. `FetchOptions::limit` is
/// honored at page granularity: once at least `limit` records were consumed
/// the fetch stops with the next page number as its resume cursor.
pub async fn drive_pages<R, F, Fut, H>(
    control: &FetchControl,
    params: PageParams,
    mut fetch: F,
    handler: &mut H,
) -> Result<DriveResult, FetchError>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<NumberedPage<R>, FetchError>>,
    H: PageHandler<R>,
{
    let mut result = DriveResult::new();
    let mut page_number = params.start_page;
    let mut total_reported = false;

    loop {
        if control.is_cancelled() {
            debug!(page = page_number, "Cancelled before next page");
            return Ok(result.stop(Completion::Cancelled, Some(page_number.to_string())));
        }
        if control.remaining(result.records) == Some(0) {
            return Ok(result.stop(Completion::LimitReached, Some(page_number.to_string())));
        }

        let span = spans::fetch_page("page", &page_number.to_string());
        let page = fetch(page_number, params.per_page).instrument(span).await?;
        result.pages += 1;

        if let Some(total) = page.total {
            if !total_reported {
                control.emit_total(total).await;
                total_reported = true;
            }
        }

        let count = page.records.len();
        if count == 0 {
            return Ok(result.stop(Completion::Complete, None));
        }
        result.records += count;
        page_number += 1;

        let has_next = page.has_next;
        let batch = handler.handle_page(page.records);
        let delivered = control.emit(&batch).await;
        result.transactions.extend(batch);
        if !delivered {
            return Ok(result.stop(Completion::Cancelled, Some(page_number.to_string())));
        }

        if !has_next {
            return Ok(result.stop(Completion::Complete, None));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::tests_support::{numbered_handler, Calls};
    use crate::stream::{ProgressSink, StreamEvent};

    #[tokio::test]
    async fn stops_when_no_next_page() {
        let calls = Calls::default();
        let mut handler = numbered_handler();

        let result = drive_pages(
            &FetchControl::default(),
            PageParams::resume(None, 1, 3),
            |page, per_page| {
                calls.record(page);
                let records: Vec<u32> = if page < 3 {
                    (page * 10..page * 10 + per_page).collect()
                } else {
                    vec![99]
                };
                async move { Ok(NumberedPage::sized(records, per_page)) }
            },
            &mut handler,
        )
        .await
        .unwrap();

        assert_eq!(result.transactions.len(), 7);
        assert_eq!(calls.positions(), vec!["1", "2", "3"]);
        assert!(result.next_cursor.is_none());
    }

    #[tokio::test]
    async fn empty_page_ends_even_if_next_was_promised() {
        let calls = Calls::default();
        let mut handler = numbered_handler();

        let result = drive_pages(
            &FetchControl::default(),
            PageParams::resume(None, 0, 2),
            |page, _| {
                calls.record(page);
                let records: Vec<u32> = if page == 0 { vec![1, 2] } else { Vec::new() };
                async move { Ok(NumberedPage::sized(records, 2).with_has_next(true)) }
            },
            &mut handler,
        )
        .await
        .unwrap();

        assert_eq!(result.transactions.len(), 2);
        assert_eq!(calls.positions(), vec!["0", "1"]);
    }

    #[tokio::test]
    async fn reports_batches_and_total_to_progress() {
        let (sink, mut receiver) = ProgressSink::channel(16);
        let control = FetchControl::default().with_progress(sink);
        let mut handler = numbered_handler();

        drive_pages(
            &control,
            PageParams::resume(None, 0, 2),
            |page, per_page| {
                let records: Vec<u32> = if page == 0 { vec![1, 2] } else { vec![3] };
                async move { Ok(NumberedPage::sized(records, per_page).with_total(3)) }
            },
            &mut handler,
        )
        .await
        .unwrap();
        drop(control);

        let mut events = Vec::new();
        while let Some(event) = receiver.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], StreamEvent::EstimatedTotal(3));
        assert!(matches!(&events[1], StreamEvent::Batch(b) if b.len() == 2));
        assert!(matches!(&events[2], StreamEvent::Batch(b) if b.len() == 1));
    }

    #[tokio::test]
    async fn limit_stops_at_page_boundary() {
        let control = FetchControl::default().with_limit(3);
        let mut handler = numbered_handler();

        let result = drive_pages(
            &control,
            PageParams::resume(Some("4"), 1, 2),
            |page, per_page| {
                let records: Vec<u32> = (page * 10..page * 10 + per_page).collect();
                async move { Ok(NumberedPage::sized(records, per_page)) }
            },
            &mut handler,
        )
        .await
        .unwrap();

        assert_eq!(result.records, 4);
        assert_eq!(result.completion, Completion::LimitReached);
        assert_eq!(result.next_cursor.as_deref(), Some("6"));
    }
}
