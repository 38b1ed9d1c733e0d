//! Typed views over decoded API responses.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

use crate::domain::Money;
use crate::error::{GatewayError, RemoteError};

use super::xml::{self, lookup, lookup_str};
use super::Action;

const ERROR_CODE_PATH: &str = "ErrorResponse/Error/Code";
const ERROR_MESSAGE_PATH: &str = "ErrorResponse/Error/Message";
const AUTHORIZE_DETAILS_PATH: &str = "AuthorizeResponse/AuthorizeResult/AuthorizationDetails";

/// HTTP answer exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header value by case-insensitive name, if present and valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    fn looks_like_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.contains("json"))
            .unwrap_or(false)
            || self.body.trim_start().starts_with('{')
    }

    /// Decodes the body into a nested mapping. Bodies that are neither XML
    /// nor JSON are a `MalformedResponse`.
    pub fn decode(&self) -> Result<Value, GatewayError> {
        if self.looks_like_json() {
            return serde_json::from_str(&self.body)
                .map_err(|e| GatewayError::MalformedResponse(format!("invalid JSON body: {}", e)));
        }

        xml::to_value(&self.body).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
    }

    /// Like `decode` but an undecodable body yields `Value::Null`. Used for
    /// error bodies, which are sometimes plain HTML.
    pub fn decode_lenient(&self) -> Value {
        self.decode().unwrap_or(Value::Null)
    }

    pub fn remote_error(&self) -> RemoteError {
        let parsed = self.decode_lenient();
        RemoteError {
            status: self.status,
            code: lookup_str(&parsed, ERROR_CODE_PATH).map(str::to_string),
            message: lookup_str(&parsed, ERROR_MESSAGE_PATH).map(str::to_string),
            body: self.body.clone(),
        }
    }
}

/// Response families that carry a `{Kind}Details` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Authorization,
    Capture,
    Refund,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Authorization => "Authorization",
            ResponseKind::Capture => "Capture",
            ResponseKind::Refund => "Refund",
        }
    }

    fn id_field(&self) -> &'static str {
        match self {
            ResponseKind::Authorization => "AmazonAuthorizationId",
            ResponseKind::Capture => "AmazonCaptureId",
            ResponseKind::Refund => "AmazonRefundId",
        }
    }

    fn reference_field(&self) -> &'static str {
        match self {
            ResponseKind::Authorization => "AuthorizationReferenceId",
            ResponseKind::Capture => "CaptureReferenceId",
            ResponseKind::Refund => "RefundReferenceId",
        }
    }

    fn amount_field(&self) -> &'static str {
        match self {
            ResponseKind::Authorization => "AuthorizationAmount",
            ResponseKind::Capture => "CaptureAmount",
            ResponseKind::Refund => "RefundAmount",
        }
    }

    fn status_field(&self) -> &'static str {
        match self {
            ResponseKind::Authorization => "AuthorizationStatus",
            ResponseKind::Capture => "CaptureStatus",
            ResponseKind::Refund => "RefundStatus",
        }
    }

    pub fn details_path(&self, action: Action) -> String {
        match (self, action) {
            (ResponseKind::Authorization, Action::Authorize) => AUTHORIZE_DETAILS_PATH.to_string(),
            _ => format!(
                "{action}Response/{action}Result/{kind}Details",
                action = action.as_str(),
                kind = self.as_str()
            ),
        }
    }
}

/// Decoded response of an authorize, capture or refund family call.
#[derive(Debug, Clone)]
pub struct ActionResponse {
    kind: ResponseKind,
    action: Action,
    raw: RawResponse,
    parsed: Value,
}

impl ActionResponse {
    /// A successful response with an undecodable body is an error. A failed
    /// one keeps whatever could be decoded.
    pub fn from_raw(
        kind: ResponseKind,
        action: Action,
        raw: RawResponse,
    ) -> Result<Self, GatewayError> {
        let parsed = if raw.is_success() {
            raw.decode()?
        } else {
            raw.decode_lenient()
        };

        Ok(Self {
            kind,
            action,
            raw,
            parsed,
        })
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn action(&self) -> Action {
        self.action
    }

    fn details(&self) -> Option<&Value> {
        lookup(&self.parsed, &self.kind.details_path(self.action))
    }

    fn detail_str(&self, path: &str) -> Option<String> {
        self.details()
            .and_then(|details| lookup_str(details, path))
            .map(str::to_string)
    }

    pub fn response_id(&self) -> Option<String> {
        self.detail_str(self.kind.id_field())
    }

    pub fn reference_id(&self) -> Option<String> {
        self.detail_str(self.kind.reference_field())
    }

    pub fn amount(&self) -> Option<String> {
        self.detail_str(&format!("{}/Amount", self.kind.amount_field()))
    }

    pub fn currency_code(&self) -> Option<String> {
        self.detail_str(&format!("{}/CurrencyCode", self.kind.amount_field()))
    }

    pub fn money(&self) -> Option<Money> {
        let currency = self.currency_code()?;
        Money::parse(&self.amount()?, currency)
    }

    pub fn state(&self) -> Option<String> {
        self.detail_str(&format!("{}/State", self.kind.status_field()))
    }

    pub fn is_success_state(&self) -> bool {
        matches!(self.state().as_deref(), Some("Open") | Some("Completed"))
    }

    pub fn reason_code(&self) -> Option<String> {
        self.detail_str(&format!("{}/ReasonCode", self.kind.status_field()))
    }

    pub fn reason_description(&self) -> Option<String> {
        self.detail_str(&format!("{}/ReasonDescription", self.kind.status_field()))
    }

    /// HTTP level success.
    pub fn is_success(&self) -> bool {
        self.raw.is_success()
    }

    pub fn status(&self) -> u16 {
        self.raw.status
    }

    pub fn has_error_response(&self) -> bool {
        lookup(&self.parsed, "ErrorResponse").is_some()
    }

    pub fn error_code(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        lookup_str(&self.parsed, ERROR_CODE_PATH).map(str::to_string)
    }

    pub fn error_message(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        lookup_str(&self.parsed, ERROR_MESSAGE_PATH).map(str::to_string)
    }

    pub fn body(&self) -> &str {
        &self.raw.body
    }

    pub fn parsed(&self) -> &Value {
        &self.parsed
    }

    pub fn into_parts(self) -> (RawResponse, Value) {
        (self.raw, self.parsed)
    }
}
