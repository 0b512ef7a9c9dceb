//! Default blocking transport backed by `reqwest`.

use std::io::Read;

use reqwest::blocking::{multipart, Client};

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, RequestBody, Transport};

/// Largest response body kept by `BlockingTransport` unless configured.
pub const DEFAULT_BODY_LIMIT: u64 = 10 * 1024 * 1024;

/// `Transport` over a shared `reqwest::blocking::Client`.
///
/// 4xx/5xx responses come back as data. A body larger than the limit is
/// discarded, so the client sees an empty, undecodable body instead of a
/// transport error.
#[derive(Debug, Clone)]
pub struct BlockingTransport {
    client: Client,
    body_limit: u64,
}

impl BlockingTransport {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Use a caller-configured client (timeouts, proxies, TLS).
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }
}

impl Default for BlockingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for BlockingTransport {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let builder = self.client.post(&request.url);
        let builder = match &request.body {
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Multipart(parts) => {
                let form = parts.iter().fold(multipart::Form::new(), |form, part| {
                    form.text(part.name.clone(), part.contents_text())
                });
                builder.multipart(form)
            }
        };

        let mut response = builder
            .send()
            .map_err(|e| TransportError::new(&request.url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let mut body = Vec::new();
        (&mut response)
            .take(self.body_limit.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| TransportError::new(&request.url, e))?;
        if body.len() as u64 > self.body_limit {
            tracing::warn!(url = %request.url, limit = self.body_limit, "response body over limit, discarded");
            body.clear();
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
