// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP transport for explorer APIs.
//!
//! Explorer calls are modelled as a `tower::Service<ApiRequest>` and composed
//! from small layers:
//!
//! - [`RetryLayer`] retries HTTP 429, 5xx and network failures with
//!   exponential backoff
//! - [`RateLimitLayer`] spaces requests to stay under a provider's quota
//! - [`LoggingLayer`] wraps each attempt in a tracing span
//!
//! [`ApiClient`] assembles the stack and turns the final response into JSON
//! or a [`FetchError`](crate::FetchError).
//!
//! # Usage
//!
//! ```rust,no_run
//! use awakenscan::transport::{ApiClient, ApiRequest, HttpService, RetryConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = HttpService::new(Duration::from_secs(30))?;
//!
//! // Subscan free tier: keep 250ms between requests
//! let client = ApiClient::new(http, RetryConfig::default(), Some(Duration::from_millis(250)));
//! let body = client
//!     .fetch(ApiRequest::get("https://api.kaspa.org/info/blockreward", "Kaspa block reward"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod http;
mod logging;
mod rate_limit;
mod retry;

pub use client::ApiClient;
pub use http::{
    ApiRequest, ApiResponse, HttpMethod, HttpService, TransportError, TransportErrorKind,
};
pub use logging::{LoggingLayer, LoggingService};
pub use rate_limit::{RateLimitLayer, RateLimitService};
pub use retry::{RetryConfig, RetryLayer, RetryService};
