// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for background streaming of classified batches

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use awakenscan::adapters::KaspaAdapter;
use awakenscan::stream::{stream_transactions, stream_transactions_with_capacity, StreamEvent};
use awakenscan::{ChainAdapter, Completion, FetchOptions};
use helpers::MockTransport;
use serde_json::{json, Value};
use tokio::sync::mpsc::Receiver;

const ME: &str = "kaspa:qqkqkzjvr7zwxxmjxjkmxxdwju9kjs6e9u82uh59z07vgaks6gg62v8707g73";
const OTHER: &str = "kaspa:qpauqsvk7yf9unexwmxsnmg547mhyga37csh0kj53q6xxgl24ydxjsgzthw5j";

fn receive(id: &str, block_time: i64) -> Value {
    json!({
        "transaction_id": id,
        "block_time": block_time,
        "is_accepted": true,
        "inputs": [{"previous_outpoint_address": OTHER, "previous_outpoint_amount": 200_000_000u64}],
        "outputs": [{"amount": 100_000_000u64, "script_public_key_address": ME}]
    })
}

fn adapter(mock: &MockTransport) -> Arc<dyn ChainAdapter> {
    Arc::new(
        KaspaAdapter::new(mock.client())
            .with_base_url("http://kaspa.mock")
            .with_page_size(2),
    )
}

async fn drain(mut events: Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut seen = Vec::new();
    while let Some(event) = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("stream stalled")
    {
        seen.push(event);
    }
    seen
}

/// Test that batches arrive per page and the stream ends with one Done
#[tokio::test]
async fn test_stream_delivers_pages_then_done() {
    let mock = MockTransport::new()
        .json("transactions-count", json!({"total": 3}))
        .json("offset=0&", json!([receive("a", 1_714_540_000_000), receive("b", 1_714_550_000_000)]))
        .json("offset=2&", json!([receive("c", 1_714_560_000_000)]));

    let events = drain(stream_transactions(adapter(&mock), ME.to_string(), FetchOptions::default())).await;

    assert_eq!(events.first(), Some(&StreamEvent::EstimatedTotal(3)));
    let batch_sizes: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Batch(batch) => Some(batch.len()),
            _ => None,
        })
        .collect();
    assert_eq!(batch_sizes, vec![2, 1]);
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert_eq!(
        events.last(),
        Some(&StreamEvent::Done {
            count: 3,
            completion: Completion::Complete
        })
    );
}

/// Test that a provider error ends the stream with a single Failed event
#[tokio::test]
async fn test_stream_reports_failure_once() {
    let mock = MockTransport::new().route("offset=0&", 400, r#"{"detail":"Invalid address"}"#);

    let events = drain(stream_transactions(adapter(&mock), ME.to_string(), FetchOptions::default())).await;

    assert_eq!(events.len(), 1, "{events:?}");
    match &events[0] {
        StreamEvent::Failed { message } => assert!(message.contains("Invalid address"), "{message}"),
        other => panic!("expected Failed, got {other:?}"),
    }
}

/// Test that a limited stream reports the cut-short completion
#[tokio::test]
async fn test_stream_done_carries_limit_reached() {
    let mock = MockTransport::new()
        .json("offset=0&", json!([receive("a", 1_714_540_000_000), receive("b", 1_714_550_000_000)]));

    let events = drain(stream_transactions(
        adapter(&mock),
        ME.to_string(),
        FetchOptions::default().limit(2),
    ))
    .await;

    assert_eq!(
        events.last(),
        Some(&StreamEvent::Done {
            count: 2,
            completion: Completion::LimitReached
        })
    );
    assert_eq!(mock.calls("full-transactions"), 1);
}

/// Test that dropping the receiver stops further page requests
#[tokio::test]
async fn test_dropping_receiver_stops_fetch() {
    // every page is full, so only cancellation ends the fetch
    let mock = MockTransport::new().json(
        "full-transactions",
        json!([receive("a", 1_714_540_000_000), receive("b", 1_714_550_000_000)]),
    );

    let mut events =
        stream_transactions_with_capacity(adapter(&mock), ME.to_string(), FetchOptions::default(), 1);
    let first = events.recv().await.unwrap();
    assert!(matches!(first, StreamEvent::Batch(_)));
    drop(events);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let settled = mock.calls("full-transactions");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(mock.calls("full-transactions"), settled, "fetch kept running");
    assert!(settled <= 3, "expected at most a few pages, saw {settled}");
}
