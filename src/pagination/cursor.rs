// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Opaque-cursor pagination.

use std::future::Future;

use tracing::{debug, warn, Instrument};

use super::{Completion, DriveResult, FetchControl, PageHandler};
use crate::errors::FetchError;
use crate::spans;

/// One page from a cursor endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorPage<R> {
    pub records: Vec<R>,
    /// Token for the next page; `None` (or empty) when there is none
    pub next_cursor: Option<String>,
    /// Total record count, when the provider reports it
    pub total: Option<u64>,
}

impl<R> CursorPage<R> {
    pub fn new(records: Vec<R>, next_cursor: Option<String>) -> Self {
        Self {
            records,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
            total: None,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

/// Drive a cursor endpoint until no cursor is returned.
///
/// `fetch(cursor)` requests one page; the first request uses `start` (the
/// caller's resume cursor, if any). A provider that hands back the cursor it
/// was given is treated as exhausted rather than looped on.
pub async fn drive_cursor<R, F, Fut, H>(
    control: &FetchControl,
    start: Option<String>,
    mut fetch: F,
    handler: &mut H,
) -> Result<DriveResult, FetchError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<CursorPage<R>, FetchError>>,
    H: PageHandler<R>,
{
    let mut result = DriveResult::new();
    let mut cursor = start.filter(|c| !c.is_empty());
    let mut total_reported = false;

    loop {
        if control.is_cancelled() {
            debug!(cursor = ?cursor, "Cancelled before next page");
            return Ok(result.stop(Completion::Cancelled, cursor));
        }
        if control.remaining(result.records) == Some(0) {
            return Ok(result.stop(Completion::LimitReached, cursor));
        }

        let span = spans::fetch_page("cursor", cursor.as_deref().unwrap_or("start"));
        let page = fetch(cursor.clone()).instrument(span).await?;
        result.pages += 1;

        if let Some(total) = page.total {
            if !total_reported {
                control.emit_total(total).await;
                total_reported = true;
            }
        }

        result.records += page.records.len();
        let next = page.next_cursor;
        let batch = handler.handle_page(page.records);
        let delivered = control.emit(&batch).await;
        result.transactions.extend(batch);

        if next.is_some() && next == cursor {
            warn!(cursor = ?next, "Provider returned the same cursor, stopping");
            return Ok(result.stop(Completion::Complete, None));
        }
        if !delivered {
            return Ok(result.stop(Completion::Cancelled, next));
        }
        match next {
            Some(next) => cursor = Some(next),
            None => return Ok(result.stop(Completion::Complete, None)),
        }
    }
}
