//! HTTP transport types and the transport seam.
//!
//! # Design
//! Requests and responses are plain data. The client builds an `HttpRequest`
//! and hands it to a `Transport`, which performs the POST and returns an
//! `HttpResponse`. The client never touches the wire itself, so any HTTP
//! library (or a recording fake in tests) can sit behind the trait. Wire
//! encoding of the body is the transport's job.
//!
//! All fields use owned types so values can be stored as the client's last
//! request/response without lifetime concerns.

use std::borrow::Cow;

use crate::error::TransportError;
use crate::params::MultipartPart;

/// Body of a POST request, already shaped by the selected encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Form(Vec<(String, String)>),
    Multipart(Vec<MultipartPart>),
}

/// A POST request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub body: RequestBody,
}

/// An HTTP response described as plain data.
///
/// `body` holds raw bytes; it is not guaranteed to be UTF-8.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Executes POST requests for `ServiceApiClient`.
///
/// Implementations must return 4xx/5xx responses as `Ok`; only failures that
/// prevent a response from arriving are `Err`.
pub trait Transport {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).post(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).post(request)
    }
}
