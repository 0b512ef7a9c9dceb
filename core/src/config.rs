//! Per-service client settings.

use serde::Deserialize;

/// Where a microservice lives.
///
/// `full_api_url` is derived once as `{api_url}/{service_name}` and never
/// changes afterwards. Deserializing reads only `service_name` and `api_url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "ClientSettings")]
pub struct ClientConfig {
    service_name: String,
    api_url: String,
    full_api_url: String,
}

#[derive(Deserialize)]
struct ClientSettings {
    service_name: String,
    api_url: String,
}

impl From<ClientSettings> for ClientConfig {
    fn from(settings: ClientSettings) -> Self {
        ClientConfig::new(settings.service_name, settings.api_url)
    }
}

impl ClientConfig {
    pub fn new(service_name: impl Into<String>, api_url: impl Into<String>) -> Self {
        let service_name = service_name.into();
        let api_url = api_url.into();
        let full_api_url = format!("{api_url}/{service_name}");
        Self {
            service_name,
            api_url,
            full_api_url,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn full_api_url(&self) -> &str {
        &self.full_api_url
    }
}
