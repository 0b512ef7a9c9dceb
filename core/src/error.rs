//! Error types for the microservice API client.
//!
//! # Design
//! Two tiers. `ApiError` is what `send` returns as `Err`: a call that could
//! not be made at all (no action selected, or the transport failed before a
//! response arrived). `CallFailure` covers responses that did arrive but are
//! not usable content; the compatibility surface collapses all of those into
//! the `None` failure sentinel.

use thiserror::Error;

/// The transport could not produce a response (connection refused, DNS, IO).
#[derive(Debug, Error)]
#[error("transport failed for {url}: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn new(url: impl Into<String>, message: impl ToString) -> Self {
        Self {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Hard failures of `ServiceApiClient::send`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `send` was called before any action was selected.
    #[error("no action selected; call invoke_action before send")]
    MissingAction,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Why a received response was turned into the failure sentinel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallFailure {
    /// Status code above 400. A plain 400 is not a failure.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The body is not valid JSON (this includes an empty body and bytes
    /// that are not UTF-8).
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),

    /// The body decoded to JSON `null`.
    #[error("response body decoded to null")]
    NullContent,

    /// The body decoded to JSON `false`, which is the failure sentinel itself.
    #[error("response body decoded to false")]
    FalseContent,
}
