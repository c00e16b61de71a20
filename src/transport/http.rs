// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request/response model and the `reqwest`-backed base service.
//!
//! Every explorer call is expressed as an [`ApiRequest`] handed to a
//! `tower::Service<ApiRequest, Response = ApiResponse, Error = TransportError>`.
//! Non-2xx statuses are *responses*, not errors: the retry layer needs to see
//! 429 and 5xx, and [`ApiClient`](super::ApiClient) turns the final status into
//! a [`FetchError`](crate::FetchError). Only network-level failures are
//! [`TransportError`]s.

use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use serde_json::Value;

/// HTTP method of an explorer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// One explorer API call.
///
/// `error_label` prefixes every error produced for this request, e.g.
/// `"Kaspa transactions"`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub error_label: String,
    /// Recognizes a 2xx body that is really the provider's rate-limit reply
    pub throttled: Option<fn(&str) -> bool>,
}

impl ApiRequest {
    /// A GET request.
    pub fn get(url: impl Into<String>, error_label: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            error_label: error_label.into(),
            throttled: None,
        }
    }

    /// A POST request with a JSON body.
    pub fn post_json(url: impl Into<String>, body: Value, error_label: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
            error_label: error_label.into(),
            throttled: None,
        }
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Treat a 2xx response whose body matches `predicate` like a 429.
    pub fn throttled_when(mut self, predicate: fn(&str) -> bool) -> Self {
        self.throttled = Some(predicate);
        self
    }

    /// Whether `response` is a rate-limit reply dressed as success.
    pub fn is_throttled(&self, response: &ApiResponse) -> bool {
        response.is_success() && self.throttled.is_some_and(|throttled| throttled(&response.body))
    }
}

/// Raw HTTP response: status code and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    /// Attempts made to obtain this response (set by the retry layer)
    pub attempts: u32,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            attempts: 1,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 429 and 5xx are transient; everything else is final.
    pub fn is_retryable_status(&self) -> bool {
        self.status == 429 || (500..600).contains(&self.status)
    }
}

/// What went wrong below HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The per-call timeout elapsed
    Timeout,
    /// DNS resolution or TCP/TLS connection failed
    Connect,
    /// The connection broke while sending or reading
    Io,
    /// The request could not be built (bad URL or header)
    InvalidRequest,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connection failed",
            TransportErrorKind::Io => "network error",
            TransportErrorKind::InvalidRequest => "invalid request",
        };
        f.write_str(text)
    }
}

/// A network-level failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// Attempts made before giving up (set by the retry layer)
    pub attempts: u32,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            attempts: 1,
        }
    }

    /// Network failures are retryable; malformed requests are not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, TransportErrorKind::InvalidRequest)
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        let kind = if error.is_builder() {
            TransportErrorKind::InvalidRequest
        } else if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Io
        };
        Self::new(kind, error.to_string())
    }
}

/// Base service that performs requests with `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpService {
    client: reqwest::Client,
}

impl HttpService {
    /// Build a service with the given per-call timeout.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("awakenscan/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl tower::Service<ApiRequest> for HttpService {
    type Response = ApiResponse;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ApiRequest) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move { send(&client, request).await })
    }
}

async fn send(client: &reqwest::Client, request: ApiRequest) -> Result<ApiResponse, TransportError> {
    let mut builder = match request.method {
        HttpMethod::Get => client.get(&request.url),
        HttpMethod::Post => client.post(&request.url),
    };
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = builder.send().await.map_err(TransportError::from_reqwest)?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(TransportError::from_reqwest)?;

    Ok(ApiResponse::new(status, body))
}
