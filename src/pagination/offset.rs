// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Offset/limit pagination.

use std::future::Future;

use tracing::{debug, Instrument};

use super::{Completion, DriveResult, FetchControl, PageHandler};
use crate::errors::FetchError;
use crate::spans;

/// Where to start and how many records to request per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetParams {
    pub start: u64,
    pub limit: u32,
}

impl OffsetParams {
    /// Start at `cursor` (a decimal offset from a previous partial fetch) or 0.
    pub fn resume(cursor: Option<&str>, limit: u32) -> Self {
        let start = cursor.and_then(|c| c.trim().parse().ok()).unwrap_or(0);
        Self {
            start,
            limit: limit.max(1),
        }
    }
}

/// One page from an offset/limit endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetPage<R> {
    pub records: Vec<R>,
    /// Total record count, when the provider reports it
    pub total: Option<u64>,
}

impl<R> OffsetPage<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self {
            records,
            total: None,
        }
    }

    pub fn with_total(records: Vec<R>, total: u64) -> Self {
        Self {
            records,
            total: Some(total),
        }
    }
}

/// Drive an offset/limit endpoint until it is exhausted.
///
/// `fetch(offset, limit)` requests one page. The loop stops on an empty page,
/// a page shorter than requested, or once the reported total is reached.
/// `FetchOptions::limit` caps the number of records consumed exactly; the
/// resume cursor is the next offset.
pub async fn drive_offset<R, F, Fut, H>(
    control: &FetchControl,
    params: OffsetParams,
    mut fetch: F,
    handler: &mut H,
) -> Result<DriveResult, FetchError>
where
    F: FnMut(u64, u32) -> Fut,
    Fut: Future<Output = Result<OffsetPage<R>, FetchError>>,
    H: PageHandler<R>,
{
    let mut result = DriveResult::new();
    let mut offset = params.start;
    let mut total_reported = false;

    loop {
        if control.is_cancelled() {
            debug!(offset, "Cancelled before next page");
            return Ok(result.stop(Completion::Cancelled, Some(offset.to_string())));
        }

        let mut page_limit = params.limit;
        if let Some(remaining) = control.remaining(result.records) {
            if remaining == 0 {
                return Ok(result.stop(Completion::LimitReached, Some(offset.to_string())));
            }
            page_limit = page_limit.min(u32::try_from(remaining).unwrap_or(u32::MAX));
        }

        let span = spans::fetch_page("offset", &offset.to_string());
        let page = fetch(offset, page_limit).instrument(span).await?;
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
        offset += count as u64;
        result.records += count;

        let batch = handler.handle_page(page.records);
        let delivered = control.emit(&batch).await;
        result.transactions.extend(batch);
        if !delivered {
            return Ok(result.stop(Completion::Cancelled, Some(offset.to_string())));
        }

        let exhausted = count < page_limit as usize || page.total.is_some_and(|t| offset >= t);
        if exhausted {
            return Ok(result.stop(Completion::Complete, None));
        }
    }
}
