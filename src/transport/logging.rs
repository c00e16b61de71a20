// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based logging layer for explorer API calls.
//!
//! Wraps each HTTP attempt in a tracing span and records timing, status and
//! failures. Placed inside the retry layer it logs every attempt; outside it
//! logs one line per logical call.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::time::Instant;
use tower::Layer;
use tracing::{debug, trace, warn, Instrument};

use super::http::{ApiRequest, ApiResponse, TransportError};

/// A Tower layer that adds logging/tracing to explorer requests.
///
/// By default only method, URL, status and timing are logged. Query strings
/// can carry API keys, so URLs are logged without them.
#[derive(Clone, Debug, Default)]
pub struct LoggingLayer {
    /// Whether to log response bodies (can be verbose)
    log_responses: bool,
}

impl LoggingLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables logging of response bodies at `trace` level.
    pub fn with_response_logging(mut self) -> Self {
        self.log_responses = true;
        self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        LoggingService {
            service,
            log_responses: self.log_responses,
        }
    }
}

/// A Tower service that logs explorer requests and responses.
#[derive(Clone, Debug)]
pub struct LoggingService<S> {
    service: S,
    log_responses: bool,
}

impl<S> tower::Service<ApiRequest> for LoggingService<S>
where
    S: tower::Service<ApiRequest, Response = ApiResponse, Error = TransportError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = ApiResponse;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: ApiRequest) -> Self::Future {
        let log_responses = self.log_responses;
        let mut service = self.service.clone();

        let span = tracing::debug_span!(
            "awakenscan.http_request",
            method = %request.method,
            url = %redact_query(&request.url),
            label = %request.error_label,
        );

        Box::pin(
            async move {
                let start = Instant::now();
                let result = service.call(request).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                match &result {
                    Ok(response) if response.is_success() => {
                        debug!(status = response.status, duration_ms, "HTTP response");
                        if log_responses {
                            trace!(body = %response.body, "HTTP response body");
                        }
                    }
                    Ok(response) => {
                        warn!(status = response.status, duration_ms, "HTTP error status");
                    }
                    Err(error) => {
                        warn!(error = %error, duration_ms, "HTTP transport error");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

/// Strip the query string from a URL for logging.
fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
