// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based retry layer with exponential backoff for explorer API calls.
//!
//! The layer retries HTTP 429, HTTP 5xx, network-level failures and 2xx
//! bodies the request marks as throttled. Any other status is returned to
//! the caller after a single attempt. When retries
//! are exhausted the last response (or error) is returned with its
//! `attempts` count set, so that the caller can report how hard it tried.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use tower::Layer;
use tracing::{debug, warn};

use super::http::{ApiRequest, ApiResponse, TransportError};

/// Default maximum number of retry attempts.
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay for exponential backoff (1s).
const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Default maximum delay between retries (30 seconds).
const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// A Tower layer that retries transient failures with exponential backoff.
///
/// The backoff formula is:
///
/// ```text
/// delay = min(base_delay * 2^attempt, max_delay)
/// ```
///
/// # Example
///
/// ```rust
/// use awakenscan::transport::{RetryConfig, RetryLayer};
/// use std::time::Duration;
///
/// // Retry up to 3 times: 1s, 2s, 4s
/// let layer = RetryLayer::new();
///
/// // Five quick retries, never waiting more than a minute
/// let layer = RetryLayer::from_config(RetryConfig {
///     max_retries: 5,
///     base_delay: Duration::from_millis(200),
///     max_delay: Duration::from_secs(60),
/// });
/// ```
#[derive(Clone, Debug)]
pub struct RetryLayer {
    config: Arc<RetryConfig>,
}

/// Configuration for retry behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial request).
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryLayer {
    /// Creates a new retry layer with default settings.
    ///
    /// Default settings:
    /// - 3 retry attempts
    /// - 1s base delay
    /// - 30s maximum delay
    pub fn new() -> Self {
        Self::from_config(RetryConfig::default())
    }

    /// Creates a retry layer from an existing configuration.
    pub fn from_config(config: RetryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The configuration this layer applies.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl Default for RetryLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RetryService {
            service,
            config: self.config.clone(),
        }
    }
}

/// A Tower service that adds retry logic with exponential backoff.
#[derive(Clone, Debug)]
pub struct RetryService<S> {
    service: S,
    config: Arc<RetryConfig>,
}

impl<S> tower::Service<ApiRequest> for RetryService<S>
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
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let mut attempt = 0u32;
            loop {
                let mut service_clone = service.clone();
                let result = service_clone.call(request.clone()).await;

                let retry_reason = match &result {
                    Ok(response) if response.is_retryable_status() => {
                        Some(format!("HTTP {}", response.status))
                    }
                    Ok(response) if request.is_throttled(response) => {
                        Some("rate limited".to_string())
                    }
                    Err(error) if error.is_retryable() => Some(error.to_string()),
                    _ => None,
                };

                let Some(retry_reason) = retry_reason else {
                    match &result {
                        Ok(_) if attempt > 0 => debug!(
                            label = %request.error_label,
                            attempt = attempt,
                            "Request succeeded after retry"
                        ),
                        Err(error) => debug!(
                            label = %request.error_label,
                            error = %error,
                            "Non-retryable error, not retrying"
                        ),
                        _ => {}
                    }
                    return result.map(|r| with_attempts(r, attempt + 1));
                };

                if attempt >= config.max_retries {
                    warn!(
                        label = %request.error_label,
                        reason = %retry_reason,
                        attempts = attempt + 1,
                        "Max retries exceeded"
                    );
                    return match result {
                        Ok(response) => Ok(with_attempts(response, attempt + 1)),
                        Err(mut error) => {
                            error.attempts = attempt + 1;
                            Err(error)
                        }
                    };
                }

                let delay = calculate_backoff(attempt, &config);
                warn!(
                    label = %request.error_label,
                    reason = %retry_reason,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis(),
                    "Retryable error, backing off"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        })
    }
}

fn with_attempts(mut response: ApiResponse, attempts: u32) -> ApiResponse {
    response.attempts = attempts;
    response
}

/// Calculates the backoff duration for a given attempt.
///
/// Uses exponential backoff: `min(base_delay * 2^attempt, max_delay)`
pub(crate) fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    let multiplier = 2u64.saturating_pow(attempt);
    let delay_ms = config
        .base_delay
        .as_millis()
        .saturating_mul(multiplier as u128);
    let capped_delay_ms = delay_ms.min(config.max_delay.as_millis()) as u64;
    Duration::from_millis(capped_delay_ms)
}
