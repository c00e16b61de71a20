// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Incremental delivery of classified transactions.
//!
//! A fetch can push each classified page into a bounded channel as soon as
//! it is ready. Because sending waits for channel capacity, a slow consumer
//! holds back the next page request instead of buffering unboundedly.
//!
//! [`stream_transactions`] runs a whole adapter fetch in a background task
//! and ends the stream with exactly one terminal event.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, Instrument};

use crate::adapters::{ChainAdapter, FetchOptions};
use crate::pagination::Completion;
use crate::spans;
use crate::types::transaction::Transaction;

/// Default channel capacity used by [`stream_transactions`].
pub const DEFAULT_STREAM_CAPACITY: usize = 8;

/// One message on a transaction stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A newly classified batch, in page order
    Batch(Vec<Transaction>),
    /// Best-effort hint of the total number of records upstream
    EstimatedTotal(u64),
    /// Terminal: the fetch ended. `completion` tells whether it was cut short.
    Done { count: usize, completion: Completion },
    /// Terminal: the fetch failed
    Failed { message: String },
}

impl StreamEvent {
    /// Whether no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Failed { .. })
    }
}

/// Output side of a progress channel, handed to adapters in [`FetchOptions`].
#[derive(Debug, Clone)]
pub struct ProgressSink {
    sender: mpsc::Sender<StreamEvent>,
}

impl ProgressSink {
    pub fn new(sender: mpsc::Sender<StreamEvent>) -> Self {
        Self { sender }
    }

    /// Create a sink and the receiver that observes it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }

    /// Deliver a batch, waiting for capacity. Returns `false` once the
    /// receiver is gone, which callers treat as cancellation.
    pub async fn batch(&self, batch: Vec<Transaction>) -> bool {
        self.sender.send(StreamEvent::Batch(batch)).await.is_ok()
    }

    /// Whether the receiver was dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Deliver a total-count hint.
    pub async fn estimated_total(&self, total: u64) -> bool {
        self.sender
            .send(StreamEvent::EstimatedTotal(total))
            .await
            .is_ok()
    }

    async fn finish(&self, event: StreamEvent) {
        if self.sender.send(event).await.is_err() {
            debug!("Stream receiver dropped before the terminal event");
        }
    }
}

/// Fetch in a background task, streaming batches as they are classified.
///
/// The receiver yields any number of [`StreamEvent::Batch`] and
/// [`StreamEvent::EstimatedTotal`] events followed by exactly one
/// [`StreamEvent::Done`] or [`StreamEvent::Failed`]. Dropping the receiver
/// stops the fetch before its next page.
///
/// Cosmos and EVM histories, and multi-source fetches with a limit, arrive
/// as one batch once every source finished.
///
/// # Example
///
/// ```rust,no_run
/// use awakenscan::stream::{stream_transactions, StreamEvent};
/// use awakenscan::{AdapterRegistry, ExporterConfig, FetchOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = AdapterRegistry::from_config(&ExporterConfig::default())?;
/// let adapter = registry.get("kaspa").expect("kaspa is registered");
///
/// let mut events = stream_transactions(adapter, "kaspa:qr...".to_string(), FetchOptions::default());
/// while let Some(event) = events.recv().await {
///     match event {
///         StreamEvent::Batch(batch) => println!("+{}", batch.len()),
///         StreamEvent::Done { count, .. } => println!("done: {count}"),
///         StreamEvent::Failed { message } => eprintln!("{message}"),
///         StreamEvent::EstimatedTotal(_) => {}
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn stream_transactions(
    adapter: Arc<dyn ChainAdapter>,
    address: String,
    options: FetchOptions,
) -> mpsc::Receiver<StreamEvent> {
    stream_transactions_with_capacity(adapter, address, options, DEFAULT_STREAM_CAPACITY)
}

/// [`stream_transactions`] with an explicit channel capacity.
pub fn stream_transactions_with_capacity(
    adapter: Arc<dyn ChainAdapter>,
    address: String,
    mut options: FetchOptions,
    capacity: usize,
) -> mpsc::Receiver<StreamEvent> {
    let (sink, receiver) = ProgressSink::channel(capacity);
    options.progress = Some(sink.clone());
    let span = spans::stream_transactions(adapter.info().chain_id, &address);

    tokio::spawn(
        async move {
            let terminal = match adapter.fetch_transactions(&address, &options).await {
                Ok(outcome) => StreamEvent::Done {
                    count: outcome.transactions.len(),
                    completion: outcome.completion,
                },
                Err(error) => StreamEvent::Failed {
                    message: error.to_string(),
                },
            };
            // the adapter's clone of the sink must be gone before the terminal
            // event so the receiver sees the channel close right after it
            drop(options);
            sink.finish(terminal).await;
        }
        .instrument(span),
    );

    receiver
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::Utc;

    use crate::types::transaction::TransactionType;

    #[test]
    fn terminal_events() {
        assert!(StreamEvent::Failed { message: "x".into() }.is_terminal());
        assert!(StreamEvent::Done {
            count: 0,
            completion: Completion::Complete
        }
        .is_terminal());
        assert!(!StreamEvent::EstimatedTotal(3).is_terminal());
    }

    #[tokio::test]
    async fn sink_reports_closed_receiver() {
        let (sink, receiver) = ProgressSink::channel(1);
        let tx = Transaction::builder(Utc::now(), TransactionType::Receive)
            .received(BigDecimal::from(1), "KAS")
            .build()
            .unwrap();
        assert!(sink.batch(vec![tx.clone()]).await);
        drop(receiver);
        assert!(!sink.batch(vec![tx]).await);
    }
}
