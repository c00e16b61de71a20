// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for provider HTTP calls.
//!
//! These errors come out of [`crate::transport::ApiClient`] and classify every
//! failed request into one of the buckets callers act on:
//!
//! - [`FetchError::Transient`] - rate limits, 5xx and network failures that
//!   kept failing after every retry
//! - [`FetchError::ProviderClient`] - a 4xx (other than 429) or a provider error
//!   envelope; never retried
//! - [`FetchError::Decode`] - the provider answered 2xx with a body we could not parse

/// Maximum number of characters of a raw response body kept in error messages.
const MAX_DETAIL_CHARS: usize = 300;

/// Errors that can occur while talking to an upstream explorer API.
///
/// Every variant carries the request's error label (for example
/// `"Kaspa transactions"`) so that messages identify which call failed.
///
/// # Examples
///
/// ```rust
/// use awakenscan::FetchError;
///
/// let error = FetchError::provider_client("Subscan transfers", 401, "Invalid API key");
/// assert_eq!(
///     error.to_string(),
///     "Subscan transfers: provider rejected request (HTTP 401): Invalid API key"
/// );
/// assert!(!error.is_transient());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A retryable failure that persisted after all retries.
    #[error("{label}: request failed after {attempts} attempts: {last_error}")]
    Transient {
        /// Label of the failing request
        label: String,
        /// Total attempts made (initial request plus retries)
        attempts: u32,
        /// Description of the last failure observed
        last_error: String,
    },

    /// The provider rejected the request; retrying will not help.
    #[error("{label}: provider rejected request (HTTP {status}): {detail}")]
    ProviderClient {
        /// Label of the failing request
        label: String,
        /// HTTP status code (200 when the error arrived in a success envelope)
        status: u16,
        /// Provider-supplied detail, extracted best-effort from the body
        detail: String,
    },

    /// The response body could not be decoded.
    #[error("{label}: invalid response: {details}")]
    Decode {
        /// Label of the failing request
        label: String,
        /// Parser message
        details: String,
    },

    /// The request could not be constructed (bad URL, invalid header value).
    #[error("{label}: invalid request: {details}")]
    InvalidRequest {
        /// Label of the failing request
        label: String,
        /// What was wrong with it
        details: String,
    },
}

impl FetchError {
    /// Create a `Transient` error.
    pub fn transient(label: impl Into<String>, attempts: u32, last_error: impl Into<String>) -> Self {
        FetchError::Transient {
            label: label.into(),
            attempts,
            last_error: last_error.into(),
        }
    }

    /// Create a `ProviderClient` error.
    pub fn provider_client(label: impl Into<String>, status: u16, detail: impl Into<String>) -> Self {
        FetchError::ProviderClient {
            label: label.into(),
            status,
            detail: detail.into(),
        }
    }

    /// Create a `Decode` error.
    pub fn decode(label: impl Into<String>, details: impl Into<String>) -> Self {
        FetchError::Decode {
            label: label.into(),
            details: details.into(),
        }
    }

    /// Create an `InvalidRequest` error.
    pub fn invalid_request(label: impl Into<String>, details: impl Into<String>) -> Self {
        FetchError::InvalidRequest {
            label: label.into(),
            details: details.into(),
        }
    }

    /// Whether the failure was of the retryable kind.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }

    /// HTTP status associated with the error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::ProviderClient { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Extract a human-readable error detail from a provider error body.
///
/// Providers wrap errors in different envelopes; the common shapes are tried
/// in order and the raw body (truncated) is the fallback:
///
/// - `{"message": "..."}` (Subscan, Kaspa, Hyperliquid)
/// - `{"error": "..."}` or `{"error": {"message": "..."}}`
/// - `{"detail": "..."}` (FastAPI based explorers)
/// - `{"result": "..."}` (Etherscan)
/// - `{"msg": "..."}`
///
/// # Examples
///
/// ```rust
/// use awakenscan::errors::extract_error_detail;
///
/// assert_eq!(extract_error_detail(r#"{"error":{"message":"bad address"}}"#), "bad address");
/// assert_eq!(extract_error_detail("Not Found"), "Not Found");
/// ```
pub fn extract_error_detail(body: &str) -> String {
    let trimmed = body.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let candidates = [
            value.get("message"),
            value.get("error").and_then(|e| e.get("message")),
            value.get("error"),
            value.get("detail"),
            value.get("result"),
            value.get("msg"),
        ];

        for candidate in candidates.into_iter().flatten() {
            match candidate {
                serde_json::Value::String(s) if !s.is_empty() => return s.clone(),
                serde_json::Value::Array(items) if !items.is_empty() => {
                    // FastAPI validation errors: [{"msg": "..."}]
                    let joined: Vec<String> = items
                        .iter()
                        .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                        .map(str::to_string)
                        .collect();
                    if !joined.is_empty() {
                        return joined.join("; ");
                    }
                }
                _ => {}
            }
        }
    }

    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    truncate(trimmed, MAX_DETAIL_CHARS)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
