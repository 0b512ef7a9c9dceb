//! Fluent POST client for a single microservice.
//!
//! # Design
//! `ServiceApiClient` is a mutable builder. `select_object` and
//! `invoke_action` record where the next call goes, `as_form` /
//! `as_multipart` pick the body shape, and `send` performs the POST through
//! the owned `Transport`. The object name, action name, parameters and
//! encoding persist across calls until overwritten; `invoke_action` only
//! clears the previous request and response.
//!
//! One instance serves one call at a time. The builder methods take
//! `&mut self`, so the borrow checker rejects sharing an instance across
//! in-flight calls.

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, CallFailure};
use crate::http::{HttpRequest, HttpResponse, RequestBody, Transport};
use crate::params::{form_fields, merge_params, multipart_parts, Params, ParamsEncoding};
use crate::transport::BlockingTransport;

/// Highest status code still treated as a usable response. 400 itself passes.
pub const MAX_SUCCESS_STATUS: u16 = 400;

/// Interpreted result of a call that received a response.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success(Value),
    Failure(CallFailure),
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    /// Collapse to the failure sentinel: `None` for every failure.
    pub fn into_content(self) -> Option<Value> {
        match self {
            CallOutcome::Success(value) => Some(value),
            CallOutcome::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Value, CallFailure> {
        match self {
            CallOutcome::Success(value) => Ok(value),
            CallOutcome::Failure(failure) => Err(failure),
        }
    }
}

/// Decide whether a response carries usable content.
///
/// Fails on status > 400, on a body that is not JSON, and on JSON `null` or
/// `false`. Every other JSON value, including `0`, `""` and `[]`, succeeds.
pub fn interpret_response(response: &HttpResponse) -> CallOutcome {
    if response.status > MAX_SUCCESS_STATUS {
        return CallOutcome::Failure(CallFailure::HttpStatus {
            status: response.status,
            body: response.text().into_owned(),
        });
    }
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(Value::Null) => CallOutcome::Failure(CallFailure::NullContent),
        Ok(Value::Bool(false)) => CallOutcome::Failure(CallFailure::FalseContent),
        Ok(value) => CallOutcome::Success(value),
        Err(e) => CallOutcome::Failure(CallFailure::InvalidJson(e.to_string())),
    }
}

/// Client for the actions of one microservice.
#[derive(Debug)]
pub struct ServiceApiClient<T: Transport = BlockingTransport> {
    config: ClientConfig,
    transport: T,
    object_name: Option<String>,
    action_name: Option<String>,
    params: Params,
    default_params: Params,
    encoding: ParamsEncoding,
    request: Option<HttpRequest>,
    response: Option<HttpResponse>,
}

impl ServiceApiClient<BlockingTransport> {
    /// Client for `{api_url}/{service_name}` using the default `reqwest` transport.
    pub fn new(service_name: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(service_name, api_url), BlockingTransport::new())
    }
}

impl<T: Transport> ServiceApiClient<T> {
    pub fn with_transport(
        service_name: impl Into<String>,
        api_url: impl Into<String>,
        transport: T,
    ) -> Self {
        Self::from_config(ClientConfig::new(service_name, api_url), transport)
    }

    pub fn from_config(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            object_name: None,
            action_name: None,
            params: Params::new(),
            default_params: Params::new(),
            encoding: ParamsEncoding::default(),
            request: None,
            response: None,
        }
    }

    /// Set the object path segment. An empty name means no object segment.
    pub fn select_object(&mut self, name: impl Into<String>) -> &mut Self {
        self.object_name = Some(name.into());
        self
    }

    /// Prepare a call to `name`.
    ///
    /// Clears the previous request and response, then stores `params`
    /// (or an empty map) merged over the default params. The object name is
    /// kept.
    pub fn invoke_action(&mut self, name: impl Into<String>, params: Option<Params>) -> &mut Self {
        self.set_action_name(name);
        self.reset_call_data();
        self.set_params(params.unwrap_or_default());
        self
    }

    pub fn set_action_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.action_name = Some(name.into());
        self
    }

    /// Replace the active parameters with `params` merged over the defaults.
    pub fn set_params(&mut self, params: Params) -> &mut Self {
        self.params = merge_params(&self.default_params, params);
        self
    }

    /// Parameters merged into every subsequent `invoke_action` / `set_params`.
    pub fn set_default_params(&mut self, defaults: Params) -> &mut Self {
        self.default_params = defaults;
        self
    }

    pub fn as_form(&mut self) -> &mut Self {
        self.encoding = ParamsEncoding::Form;
        self
    }

    pub fn as_multipart(&mut self) -> &mut Self {
        self.encoding = ParamsEncoding::Multipart;
        self
    }

    fn reset_call_data(&mut self) {
        self.request = None;
        self.response = None;
    }

    /// `{full_api_url}/{action}` or `{full_api_url}/{object}/{action}`.
    ///
    /// Segments are inserted as given, without percent-encoding.
    pub fn request_url(&self) -> Result<String, ApiError> {
        let action = self.action_name.as_deref().ok_or(ApiError::MissingAction)?;
        let base = self.config.full_api_url();
        Ok(match self.object_name.as_deref() {
            Some(object) if !object.is_empty() => format!("{base}/{object}/{action}"),
            _ => format!("{base}/{action}"),
        })
    }

    /// Build the request for the current state without sending it.
    pub fn prepare_request(&self) -> Result<HttpRequest, ApiError> {
        let body = match self.encoding {
            ParamsEncoding::Form => RequestBody::Form(form_fields(&self.params)),
            ParamsEncoding::Multipart => RequestBody::Multipart(multipart_parts(&self.params)),
        };
        Ok(HttpRequest {
            url: self.request_url()?,
            body,
        })
    }

    /// POST the prepared call and return the decoded JSON, or `None` on any
    /// HTTP or decode failure.
    ///
    /// Only a missing action or a transport failure is an `Err`.
    pub fn send(&mut self) -> Result<Option<Value>, ApiError> {
        Ok(self.send_detailed()?.into_content())
    }

    /// Like `send`, but keeps the reason a response was rejected.
    pub fn send_detailed(&mut self) -> Result<CallOutcome, ApiError> {
        let request = self.prepare_request()?;
        tracing::debug!(url = %request.url, encoding = ?self.encoding, "sending microservice request");

        let result = self.transport.post(&request);
        self.request = Some(request);
        let response = result?;
        tracing::debug!(status = response.status, "microservice responded");

        let outcome = interpret_response(&response);
        if let CallOutcome::Failure(failure) = &outcome {
            tracing::warn!(
                service = self.config.service_name(),
                action = self.action_name.as_deref().unwrap_or_default(),
                %failure,
                "microservice call failed"
            );
        }
        self.response = Some(response);
        Ok(outcome)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn object_name(&self) -> Option<&str> {
        self.object_name.as_deref()
    }

    pub fn action_name(&self) -> Option<&str> {
        self.action_name.as_deref()
    }

    /// Active parameters, defaults already merged in.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn default_params(&self) -> &Params {
        &self.default_params
    }

    pub fn encoding(&self) -> ParamsEncoding {
        self.encoding
    }

    /// Request of the last `send` since the last `invoke_action`.
    pub fn last_request(&self) -> Option<&HttpRequest> {
        self.request.as_ref()
    }

    /// Raw response of the last `send` since the last `invoke_action`.
    pub fn last_response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::error::TransportError;
    use crate::params::MultipartPart;

    /// Records every request and answers with a fixed response.
    struct RecordingTransport {
        reply: Result<HttpResponse, String>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl RecordingTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                reply: Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.as_bytes().to_vec(),
                }),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn last(&self) -> HttpRequest {
            self.requests.borrow().last().cloned().expect("no request recorded")
        }
    }

    impl Transport for RecordingTransport {
        fn post(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.borrow_mut().push(request.clone());
            self.reply
                .clone()
                .map_err(|message| TransportError::new(&request.url, message))
        }
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn client(transport: &RecordingTransport) -> ServiceApiClient<&RecordingTransport> {
        ServiceApiClient::with_transport("billing", "http://api.local", transport)
    }

    #[test]
    fn object_and_action_form_the_url() {
        let transport = RecordingTransport::replying(200, r#"{"id":1}"#);
        let mut c = client(&transport);
        let content = c
            .select_object("invoice")
            .invoke_action("create", Some(params(json!({"amount": 10}))))
            .send()
            .unwrap();

        assert_eq!(content, Some(json!({"id": 1})));
        let req = transport.last();
        assert_eq!(req.url, "http://api.local/billing/invoice/create");
        assert_eq!(
            req.body,
            RequestBody::Form(vec![("amount".to_string(), "10".to_string())])
        );
    }

    #[test]
    fn missing_or_empty_object_is_omitted_from_url() {
        let transport = RecordingTransport::replying(200, "1");
        let mut c = client(&transport);
        c.invoke_action("ping", None);
        assert_eq!(c.request_url().unwrap(), "http://api.local/billing/ping");

        c.select_object("");
        assert_eq!(c.request_url().unwrap(), "http://api.local/billing/ping");
    }

    #[test]
    fn object_name_survives_new_actions() {
        let transport = RecordingTransport::replying(200, "{}");
        let mut c = client(&transport);
        c.select_object("invoice").invoke_action("create", None).send().unwrap();
        c.invoke_action("list", None).send().unwrap();
        assert_eq!(transport.last().url, "http://api.local/billing/invoice/list");
        assert_eq!(c.object_name(), Some("invoice"));
    }

    #[test]
    fn select_object_overwrites_previous_name() {
        let transport = RecordingTransport::replying(200, "{}");
        let mut c = client(&transport);
        c.select_object("invoice").select_object("customer").invoke_action("get", None);
        assert_eq!(c.request_url().unwrap(), "http://api.local/billing/customer/get");
    }

    #[test]
    fn multipart_drops_array_params() {
        let transport = RecordingTransport::replying(200, "true");
        let mut c = client(&transport);
        c.select_object("invoice")
            .invoke_action("create", Some(params(json!({"amount": 10, "tags": ["a", "b"]}))))
            .as_multipart()
            .send()
            .unwrap();

        assert_eq!(
            transport.last().body,
            RequestBody::Multipart(vec![MultipartPart {
                name: "amount".to_string(),
                contents: json!(10),
            }])
        );
    }

    #[test]
    fn encoding_persists_until_switched_back() {
        let transport = RecordingTransport::replying(200, "{}");
        let mut c = client(&transport);
        c.as_multipart().invoke_action("a", None).send().unwrap();
        assert!(matches!(transport.last().body, RequestBody::Multipart(_)));
        c.invoke_action("b", None).send().unwrap();
        assert!(matches!(transport.last().body, RequestBody::Multipart(_)));
        c.as_form().send().unwrap();
        assert!(matches!(transport.last().body, RequestBody::Form(_)));
    }

    #[test]
    fn default_params_merge_under_call_params() {
        let transport = RecordingTransport::replying(200, "{}");
        let mut c = client(&transport);
        c.set_default_params(params(json!({"token": "t", "lang": "en"})))
            .invoke_action("create", Some(params(json!({"lang": "de", "amount": 5}))));
        assert_eq!(
            Value::Object(c.params().clone()),
            json!({"token": "t", "lang": "de", "amount": 5})
        );
    }

    #[test]
    fn absent_params_use_defaults_only() {
        let transport = RecordingTransport::replying(200, "{}");
        let mut c = client(&transport);
        c.set_default_params(params(json!({"token": "t"})))
            .invoke_action("create", Some(params(json!({"amount": 1}))))
            .invoke_action("list", None);
        assert_eq!(Value::Object(c.params().clone()), json!({"token": "t"}));
    }

    #[test]
    fn status_above_400_is_failure() {
        for status in [401, 404, 422, 500, 503] {
            let transport = RecordingTransport::replying(status, r#"{"error":"x"}"#);
            let mut c = client(&transport);
            let content = c.invoke_action("get", None).send().unwrap();
            assert_eq!(content, None, "status {status}");
        }
    }

    #[test]
    fn status_400_is_still_success() {
        let transport = RecordingTransport::replying(400, r#"{"error":"bad"}"#);
        let mut c = client(&transport);
        let content = c.invoke_action("get", None).send().unwrap();
        assert_eq!(content, Some(json!({"error": "bad"})));
    }

    #[test]
    fn detailed_outcome_reports_http_status() {
        let transport = RecordingTransport::replying(500, "boom");
        let mut c = client(&transport);
        let outcome = c.invoke_action("get", None).send_detailed().unwrap();
        assert_eq!(
            outcome,
            CallOutcome::Failure(CallFailure::HttpStatus {
                status: 500,
                body: "boom".to_string(),
            })
        );
    }

    #[test]
    fn null_and_invalid_bodies_are_failures() {
        for body in ["null", "false", "", "<html>", "{\"a\":"] {
            let transport = RecordingTransport::replying(200, body);
            let mut c = client(&transport);
            assert_eq!(c.invoke_action("get", None).send().unwrap(), None, "body {body:?}");
        }
    }

    #[test]
    fn false_body_is_failure_content() {
        let transport = RecordingTransport::replying(200, "false");
        let mut c = client(&transport);
        let outcome = c.invoke_action("get", None).send_detailed().unwrap();
        assert_eq!(outcome, CallOutcome::Failure(CallFailure::FalseContent));
    }

    #[test]
    fn non_utf8_body_is_invalid_json() {
        let transport = RecordingTransport {
            reply: Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: b"\xff\xfe{}".to_vec(),
            }),
            requests: RefCell::new(Vec::new()),
        };
        let mut c = client(&transport);
        let outcome = c.invoke_action("get", None).send_detailed().unwrap();
        assert!(matches!(outcome, CallOutcome::Failure(CallFailure::InvalidJson(_))));
        assert_eq!(c.last_response().map(|r| r.body.len()), Some(4));
    }

    #[test]
    fn error_body_is_kept_lossily() {
        let transport = RecordingTransport {
            reply: Ok(HttpResponse {
                status: 502,
                headers: Vec::new(),
                body: b"bad \xff gateway".to_vec(),
            }),
            requests: RefCell::new(Vec::new()),
        };
        let mut c = client(&transport);
        let outcome = c.invoke_action("get", None).send_detailed().unwrap();
        assert_eq!(
            outcome,
            CallOutcome::Failure(CallFailure::HttpStatus {
                status: 502,
                body: "bad \u{fffd} gateway".to_string(),
            })
        );
    }

    #[test]
    fn falsy_json_values_are_success() {
        for (body, expected) in [("0", json!(0)), ("[]", json!([])), ("{}", json!({})), ("\"\"", json!(""))] {
            let transport = RecordingTransport::replying(200, body);
            let mut c = client(&transport);
            assert_eq!(c.invoke_action("get", None).send().unwrap(), Some(expected));
        }
    }

    #[test]
    fn last_response_is_kept_until_next_action() {
        let transport = RecordingTransport::replying(404, "missing");
        let mut c = client(&transport);
        c.invoke_action("get", None).send().unwrap();
        assert_eq!(c.last_response().map(|r| r.status), Some(404));
        assert!(c.last_request().is_some());

        c.invoke_action("list", None);
        assert!(c.last_response().is_none());
        assert!(c.last_request().is_none());
    }

    #[test]
    fn send_without_action_is_an_error() {
        let transport = RecordingTransport::replying(200, "{}");
        let mut c = client(&transport);
        let err = c.select_object("invoice").send().unwrap_err();
        assert!(matches!(err, ApiError::MissingAction));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn transport_failure_propagates() {
        let transport = RecordingTransport::failing("connection refused");
        let mut c = client(&transport);
        let err = c.invoke_action("get", None).send().unwrap_err();
        match err {
            ApiError::Transport(e) => {
                assert_eq!(e.url, "http://api.local/billing/get");
                assert_eq!(e.message, "connection refused");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(c.last_response().is_none());
        assert!(c.last_request().is_some());
    }

    #[test]
    fn outcome_converts_to_result() {
        let ok = CallOutcome::Success(json!(1));
        assert!(ok.is_success());
        assert_eq!(ok.into_result(), Ok(json!(1)));
        let failed = CallOutcome::Failure(CallFailure::NullContent);
        assert_eq!(failed.into_result(), Err(CallFailure::NullContent));
    }
}
