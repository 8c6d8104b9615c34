//! Remote service gateway.
//!
//! # Architecture
//!
//! - [`Transport`] moves one request/response pair over the wire
//!   ([`HttpTransport`] uses `reqwest`)
//! - [`Gateway`] is the single choke point every call goes through: it
//!   attaches the session credential, tags the request with an
//!   `x-request-id`, and applies the unauthorized-response policy
//! - Typed endpoint methods are grouped by resource (`products`, `orders`,
//!   `users`, `inventory`)
//!
//! The gateway never navigates. An unauthorized response tears the session
//! down and publishes [`GatewayEvent::AuthExpired`]; whoever owns navigation
//! subscribes and decides what to do with it.
//!
//! # Example
//!
//! ```rust,ignore
//! use emporium_storefront::gateway::{Gateway, HttpTransport};
//!
//! let transport = HttpTransport::new(&config)?;
//! let gateway = Gateway::new(Arc::new(transport), sessions.clone());
//!
//! let products = gateway.list_products(Some("tools")).await?;
//! ```

mod client;
#[cfg(test)]
pub(crate) mod fake;
mod inventory;
mod orders;
mod products;
mod transport;
mod users;

pub use client::Gateway;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, REQUEST_ID_HEADER, Transport};

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the remote service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The service could not be reached or the connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request URL could not be built.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request body could not be encoded.
    #[error("request encoding error: {0}")]
    Encode(serde_json::Error),

    /// The response body was not what the endpoint promises.
    #[error("unexpected response body: {0}")]
    Decode(serde_json::Error),

    /// The service answered 401. The session has already been torn down.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Message from the response body, if any.
        message: String,
    },

    /// The service declined the request.
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status of the response.
        status: StatusCode,
        /// Human-readable message from the response body.
        message: String,
        /// Per-field validation messages, if the service sent any.
        field_errors: BTreeMap<String, String>,
    },
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl GatewayError {
    /// HTTP status of the response, if one was received.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the endpoint itself is absent (404) or unimplemented (501).
    #[must_use]
    pub fn is_endpoint_missing(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::NOT_FOUND | StatusCode::NOT_IMPLEMENTED)
        )
    }

    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Decode(_) => true,
            Self::Rejected { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::InvalidUrl(_) | Self::Encode(_) | Self::Unauthorized { .. } => false,
        }
    }
}

/// Cross-cutting notifications published by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// A request was rejected as unauthorized; the user must sign in again.
    AuthExpired {
        /// Path of the request that triggered the event.
        path: String,
    },
}

/// Error body shape used by the remote services.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    validation_errors: BTreeMap<String, String>,
}

/// Pull a human-readable message out of an error response body.
fn error_message(status: StatusCode, body: &str) -> (String, BTreeMap<String, String>) {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .filter(|m| !m.trim().is_empty())
        .or(parsed.error.filter(|e| !e.trim().is_empty()))
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    (message, parsed.validation_errors)
}
