// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Resilient fetch: the layered HTTP stack plus status-to-error mapping.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::{Layer, ServiceExt};

use super::http::{ApiRequest, ApiResponse, HttpService, TransportError, TransportErrorKind};
use super::{LoggingLayer, RateLimitLayer, RetryConfig, RetryLayer};
use crate::errors::{extract_error_detail, FetchError};

/// Object-safe view of a cloneable HTTP tower service.
trait HttpStack: Send + Sync {
    fn dispatch(&self, request: ApiRequest) -> BoxFuture<'static, Result<ApiResponse, TransportError>>;
}

impl<S> HttpStack for S
where
    S: tower::Service<ApiRequest, Response = ApiResponse, Error = TransportError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    fn dispatch(&self, request: ApiRequest) -> BoxFuture<'static, Result<ApiResponse, TransportError>> {
        Box::pin(self.clone().oneshot(request))
    }
}

/// HTTP client shared by the chain adapters.
///
/// Requests flow through `retry → rate limit → logging → reqwest`, so every
/// retry attempt is rate limited and logged individually.
///
/// # Example
///
/// ```rust,no_run
/// use awakenscan::transport::{ApiClient, ApiRequest, HttpService, RetryConfig};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let http = HttpService::new(Duration::from_secs(30))?;
/// let client = ApiClient::new(http, RetryConfig::default(), None);
/// let info = client
///     .fetch(ApiRequest::get("https://api.kaspa.org/info/blockreward", "Kaspa block reward"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    stack: Arc<dyn HttpStack>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build the full stack around the `reqwest` service.
    pub fn new(http: HttpService, retry: RetryConfig, min_delay: Option<Duration>) -> Self {
        Self::from_service(http, retry, min_delay)
    }

    /// Build the stack around any base service (tests substitute a mock here).
    pub fn from_service<S>(service: S, retry: RetryConfig, min_delay: Option<Duration>) -> Self
    where
        S: tower::Service<ApiRequest, Response = ApiResponse, Error = TransportError>
            + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send,
    {
        let logged = LoggingLayer::new().layer(service);
        let stack: Arc<dyn HttpStack> = match min_delay {
            Some(delay) => {
                let limited = RateLimitLayer::with_min_delay(delay).layer(logged);
                Arc::new(RetryLayer::from_config(retry).layer(limited))
            }
            None => Arc::new(RetryLayer::from_config(retry).layer(logged)),
        };
        Self { stack }
    }

    /// Perform the request and parse a JSON body.
    ///
    /// - 2xx: the parsed body
    /// - 429/5xx or a throttled 2xx body after retries, network failure after retries: [`FetchError::Transient`]
    /// - other 4xx (and any non-retryable non-2xx): [`FetchError::ProviderClient`] with the
    ///   provider's error detail
    pub async fn fetch(&self, request: ApiRequest) -> Result<Value, FetchError> {
        let label = request.error_label.clone();
        let throttled = request.throttled;
        let response = self.stack.dispatch(request).await;
        into_json(&label, throttled, response)
    }

    /// Perform the request and deserialize the body into `T`.
    pub async fn fetch_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, FetchError> {
        let label = request.error_label.clone();
        let value = self.fetch(request).await?;
        serde_json::from_value(value).map_err(|e| FetchError::decode(label, e.to_string()))
    }
}

fn into_json(
    label: &str,
    throttled: Option<fn(&str) -> bool>,
    response: Result<ApiResponse, TransportError>,
) -> Result<Value, FetchError> {
    match response {
        Ok(response) if response.is_success() && throttled.is_some_and(|t| t(&response.body)) => {
            Err(FetchError::transient(
                label,
                response.attempts,
                format!("rate limited: {}", extract_error_detail(&response.body)),
            ))
        }
        Ok(response) if response.is_success() => {
            let body = response.body.trim();
            if body.is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(body).map_err(|e| FetchError::decode(label, e.to_string()))
        }
        Ok(response) if response.is_retryable_status() => Err(FetchError::transient(
            label,
            response.attempts,
            format!("HTTP {}: {}", response.status, extract_error_detail(&response.body)),
        )),
        Ok(response) => Err(FetchError::provider_client(
            label,
            response.status,
            extract_error_detail(&response.body),
        )),
        Err(error) if error.kind == TransportErrorKind::InvalidRequest => {
            Err(FetchError::invalid_request(label, error.message))
        }
        Err(error) => Err(FetchError::transient(label, error.attempts, error.to_string())),
    }
}
