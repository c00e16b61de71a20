// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for awakenscan integration tests
//!
//! Provides a scripted mock transport so adapters can be exercised end to
//! end without real explorer APIs.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use awakenscan::transport::{
    ApiClient, ApiRequest, ApiResponse, RetryConfig, TransportError, TransportErrorKind,
};
use futures::future::{ready, Ready};

type Reply = Result<ApiResponse, TransportError>;

struct Route {
    pattern: String,
    replies: VecDeque<Reply>,
}

#[derive(Default)]
struct State {
    routes: Vec<Route>,
    requests: Vec<ApiRequest>,
}

/// Mock HTTP service with scripted responses
///
/// A request is matched against routes in registration order by substring
/// of `"<url> <json body>"`. Each route replays its replies in order and
/// repeats the last one once the others are used up. Unmatched requests get
/// a 404.
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockTransport::new()
///     .route("offset=0", 429, "")
///     .route("offset=0", 200, "[]");
/// let adapter = KaspaAdapter::new(mock.client());
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reply for requests containing `pattern`.
    ///
    /// Calling this again with the same pattern queues another reply on the
    /// same route.
    pub fn route(self, pattern: &str, status: u16, body: impl Into<String>) -> Self {
        self.push(pattern, Ok(ApiResponse::new(status, body)));
        self
    }

    /// Add a JSON reply with status 200.
    pub fn json(self, pattern: &str, body: serde_json::Value) -> Self {
        self.route(pattern, 200, body.to_string())
    }

    /// Add a network-level failure for requests containing `pattern`.
    pub fn fail(self, pattern: &str, kind: TransportErrorKind) -> Self {
        self.push(pattern, Err(TransportError::new(kind, "mock failure")));
        self
    }

    fn push(&self, pattern: &str, reply: Reply) {
        let mut state = self.state.lock().unwrap();
        match state.routes.iter_mut().find(|r| r.pattern == pattern) {
            Some(route) => route.replies.push_back(reply),
            None => state.routes.push(Route {
                pattern: pattern.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// An [`ApiClient`] over this mock with millisecond backoff and no rate limit.
    pub fn client(&self) -> ApiClient {
        ApiClient::from_service(self.clone(), fast_retry(), None)
    }

    /// Every request seen so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of requests whose URL or body contains `pattern`.
    pub fn calls(&self, pattern: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| describe(r).contains(pattern))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    fn reply(&self, request: ApiRequest) -> Reply {
        let key = describe(&request);
        let mut state = self.state.lock().unwrap();
        state.requests.push(request);
        let Some(route) = state.routes.iter_mut().find(|r| key.contains(&r.pattern)) else {
            return Ok(ApiResponse::new(404, r#"{"message":"no mock route"}"#));
        };
        if route.replies.len() > 1 {
            route.replies.pop_front().unwrap()
        } else {
            route.replies.front().cloned().unwrap()
        }
    }
}

fn describe(request: &ApiRequest) -> String {
    let body = request
        .body
        .as_ref()
        .map(|b| b.to_string())
        .unwrap_or_default();
    format!("{} {}", request.url, body)
}

impl tower::Service<ApiRequest> for MockTransport {
    type Response = ApiResponse;
    type Error = TransportError;
    type Future = Ready<Reply>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ApiRequest) -> Self::Future {
        ready(self.reply(request))
    }
}

/// Retry settings that keep tests fast.
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}
