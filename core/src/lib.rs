//! Fluent POST client for calling microservices.
//!
//! # Overview
//! A `ServiceApiClient` targets one service at `{api_url}/{service_name}`.
//! Callers pick an optional object and an action, attach parameters as form
//! or multipart data, and `send` a POST. The decoded JSON body comes back on
//! success; any HTTP or decode failure collapses to `None`.
//!
//! ```no_run
//! use msvc_core::ServiceApiClient;
//! use serde_json::json;
//!
//! let mut billing = ServiceApiClient::new("billing", "http://api.local");
//! let params = json!({"amount": 10}).as_object().cloned();
//! let invoice = billing
//!     .select_object("invoice")
//!     .invoke_action("create", params)
//!     .send()?;
//! # Ok::<(), msvc_core::ApiError>(())
//! ```
//!
//! # Design
//! - Requests and responses are plain data; the network round-trip happens
//!   behind the `Transport` trait (`BlockingTransport`, on `reqwest`, by
//!   default).
//! - `send_detailed` exposes why a call failed; `send` keeps the single
//!   failure sentinel.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod transport;

pub use client::{interpret_response, CallOutcome, ServiceApiClient};
pub use config::ClientConfig;
pub use error::{ApiError, CallFailure, TransportError};
pub use http::{HttpRequest, HttpResponse, RequestBody, Transport};
pub use params::{MultipartPart, Params, ParamsEncoding};
pub use transport::{BlockingTransport, DEFAULT_BODY_LIMIT};
