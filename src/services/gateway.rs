//! Payment-method operations invoked by the host: authorize, capture,
//! credit, void, cancel, purchase and close. Every operation keeps the
//! order's `TransactionRecord` in step with the remote side.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::amazon::{Action, ActionResponse, RawResponse, RequestParams, ResponseKind, SignedRequestClient};
use crate::domain::{HostAddress, Money, Payment, TransactionRecord};
use crate::error::GatewayError;
use crate::ports::TransactionRepository;
use crate::services::reference_id;
use crate::services::remote_order::RemoteOrder;
use crate::services::simulation;
use crate::validation::{validate_non_negative_cents, validate_reference_id};

pub const SOFT_DECLINE_REASON: &str = "InvalidPaymentMethod";
const SUCCESS_MESSAGE: &str = "Success";

/// Host-side identity of the payment being operated on.
#[derive(Debug, Clone)]
pub struct PaymentContext {
    pub order_number: String,
    pub payment_number: String,
    pub currency: String,
    pub order_total: Money,
    pub ship_address: Option<HostAddress>,
}

/// Uniform result of a gateway operation.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub success: bool,
    pub message: String,
    pub body: String,
    pub parsed: Value,
    /// Remote id of the authorization, capture or refund, when one was issued.
    pub authorization: Option<String>,
}

impl GatewayResponse {
    fn from_raw(success: bool, message: impl Into<String>, raw: RawResponse) -> Self {
        let parsed = raw.decode_lenient();
        Self {
            success,
            message: message.into(),
            body: raw.body,
            parsed,
            authorization: None,
        }
    }

    fn from_action(success: bool, message: impl Into<String>, response: ActionResponse) -> Self {
        let authorization = response.response_id();
        let (raw, parsed) = response.into_parts();
        Self {
            success,
            message: message.into(),
            body: raw.body,
            parsed,
            authorization,
        }
    }

    fn noop() -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            body: String::new(),
            parsed: Value::Null,
            authorization: None,
        }
    }
}

/// Authorization outcome as recorded on the transaction record.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AuthorizeOutcome {
    Approved,
    SoftDecline(String),
    HardDecline(String),
    Rejected(String),
}

pub struct GatewayAdapter {
    client: SignedRequestClient,
    repository: Arc<dyn TransactionRepository>,
    public_base_url: String,
}

impl GatewayAdapter {
    pub fn new(
        client: SignedRequestClient,
        repository: Arc<dyn TransactionRepository>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            repository,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn client(&self) -> &SignedRequestClient {
        &self.client
    }

    pub fn repository(&self) -> Arc<dyn TransactionRepository> {
        Arc::clone(&self.repository)
    }

    pub fn remote_order(&self, reference_id: &str) -> RemoteOrder {
        RemoteOrder::new(self.client.clone(), reference_id, self.public_base_url.clone())
    }

    fn order_reference(record: &TransactionRecord) -> Result<String, GatewayError> {
        record
            .order_reference
            .clone()
            .ok_or_else(|| GatewayError::Validation(format!("record {} has no order reference", record.id)))
    }

    /// Starts a new authorization attempt with a fresh reference id, stored
    /// on the record before the request goes out.
    pub async fn authorize(
        &self,
        amount_cents: i64,
        record: &mut TransactionRecord,
        context: &PaymentContext,
    ) -> Result<GatewayResponse, GatewayError> {
        validate_non_negative_cents("amount", amount_cents)?;
        let reference = Self::order_reference(record)?;

        let key = reference_id::generate(&context.payment_number);
        record.authorization_reference_id = Some(key.clone());
        record.touch();
        *record = self.repository.update(record).await?;

        self.send_authorize(amount_cents, record, context, &reference, key)
            .await
    }

    /// Resends the record's last authorization attempt under the same
    /// reference id, e.g. after a timeout.
    pub async fn resume_authorize(
        &self,
        amount_cents: i64,
        record: &mut TransactionRecord,
        context: &PaymentContext,
    ) -> Result<GatewayResponse, GatewayError> {
        validate_non_negative_cents("amount", amount_cents)?;
        let reference = Self::order_reference(record)?;
        let key = record.authorization_reference_id.clone().ok_or_else(|| {
            GatewayError::Validation(format!("record {} has no authorization attempt to resume", record.id))
        })?;

        self.send_authorize(amount_cents, record, context, &reference, key)
            .await
    }

    async fn send_authorize(
        &self,
        amount_cents: i64,
        record: &mut TransactionRecord,
        context: &PaymentContext,
        order_reference: &str,
        key: String,
    ) -> Result<GatewayResponse, GatewayError> {
        let amount = Money::from_cents(amount_cents, context.currency.clone());

        let mut params = RequestParams::new();
        params.insert("AmazonOrderReferenceId".to_string(), order_reference.to_string());
        params.insert("AuthorizationReferenceId".to_string(), key.clone());
        params.insert("AuthorizationAmount.Amount".to_string(), amount.amount_string());
        params.insert("AuthorizationAmount.CurrencyCode".to_string(), amount.currency.clone());
        params.insert("TransactionTimeout".to_string(), "0".to_string());
        params.insert("CaptureNow".to_string(), "false".to_string());
        if let Some(note) =
            simulation::authorization_note(self.client.config().sandbox, context.ship_address.as_ref())
        {
            params.insert("SellerAuthorizationNote".to_string(), note);
        }

        let raw = self.client.call(Action::Authorize, params).await?;
        if raw.status >= 500 {
            let err = raw.remote_error();
            error!("Authorize {} failed with server error: {}", key, err);
            return Err(GatewayError::Remote(err));
        }

        let response = ActionResponse::from_raw(ResponseKind::Authorization, Action::Authorize, raw)?;
        let outcome = classify_authorization(&response)?;

        record.authorization_reference_id = Some(key.clone());
        let (success, message) = match &outcome {
            AuthorizeOutcome::Approved => {
                record.authorization_id = response.response_id();
                record.success = Some(true);
                record.soft_decline = Some(false);
                record.retry = false;
                (true, SUCCESS_MESSAGE.to_string())
            }
            AuthorizeOutcome::SoftDecline(message) => {
                record.success = Some(false);
                record.soft_decline = Some(true);
                record.retry = true;
                (false, message.clone())
            }
            AuthorizeOutcome::HardDecline(message) | AuthorizeOutcome::Rejected(message) => {
                record.success = Some(false);
                record.soft_decline = Some(false);
                record.retry = false;
                (false, message.clone())
            }
        };
        record.message = Some(message.clone());
        record.touch();
        *record = self.repository.update(record).await?;

        match &outcome {
            AuthorizeOutcome::Approved => info!(
                "Authorized {} on {} as {:?}",
                key, order_reference, record.authorization_id
            ),
            _ => warn!("Authorization {} not approved: {:?}", key, outcome),
        }

        Ok(GatewayResponse::from_action(success, message, response))
    }

    /// Captures against the stored authorization. A negative amount is a
    /// refund of its absolute value.
    pub async fn capture(
        &self,
        amount_cents: i64,
        record: &mut TransactionRecord,
        context: &PaymentContext,
    ) -> Result<GatewayResponse, GatewayError> {
        if amount_cents < 0 {
            return self.credit(amount_cents.abs(), record, context).await;
        }

        let authorization_id = record.authorization_id.clone().ok_or_else(|| {
            GatewayError::Validation(format!("record {} has no authorization to capture", record.id))
        })?;
        let amount = Money::from_cents(amount_cents, context.currency.clone());
        let key = reference_id::generate(&context.payment_number);

        let mut params = RequestParams::new();
        params.insert("AmazonAuthorizationId".to_string(), authorization_id);
        params.insert("CaptureReferenceId".to_string(), key.clone());
        params.insert("CaptureAmount.Amount".to_string(), amount.amount_string());
        params.insert("CaptureAmount.CurrencyCode".to_string(), amount.currency.clone());

        let raw = self.client.call(Action::Capture, params).await?;
        if raw.status >= 500 {
            return Err(GatewayError::Remote(raw.remote_error()));
        }

        let response = ActionResponse::from_raw(ResponseKind::Capture, Action::Capture, raw)?;
        if !response.is_success() {
            let message = failure_message(&response, "Capture");
            warn!("Capture {} rejected: {}", key, message);
            return Ok(GatewayResponse::from_action(false, message, response));
        }

        if response.state().as_deref() != Some("Completed") {
            let message = decline_message(&response, "Capture");
            warn!("Capture {} not completed: {}", key, message);
            return Ok(GatewayResponse::from_action(false, message, response));
        }

        record.capture_id = response.response_id();
        record.touch();
        *record = self.repository.update(record).await?;
        info!("Captured {} as {:?}", key, record.capture_id);

        Ok(GatewayResponse::from_action(true, SUCCESS_MESSAGE, response))
    }

    /// Authorizes and, only when that succeeded, captures.
    pub async fn purchase(
        &self,
        amount_cents: i64,
        record: &mut TransactionRecord,
        context: &PaymentContext,
    ) -> Result<GatewayResponse, GatewayError> {
        let authorization = self.authorize(amount_cents, record, context).await?;
        if !authorization.success {
            return Ok(authorization);
        }

        self.capture(amount_cents, record, context).await
    }

    /// Refunds against the stored capture. The refundable balance is the
    /// caller's to check.
    pub async fn credit(
        &self,
        amount_cents: i64,
        record: &mut TransactionRecord,
        context: &PaymentContext,
    ) -> Result<GatewayResponse, GatewayError> {
        validate_non_negative_cents("amount", amount_cents)?;
        let amount = Money::from_cents(amount_cents, context.currency.clone());
        self.refund(&amount, record, context).await
    }

    async fn refund(
        &self,
        amount: &Money,
        record: &TransactionRecord,
        context: &PaymentContext,
    ) -> Result<GatewayResponse, GatewayError> {
        let capture_id = record.capture_id.clone().ok_or_else(|| {
            GatewayError::Validation(format!("record {} has no capture to refund", record.id))
        })?;
        let key = reference_id::generate(&context.payment_number);

        let mut params = RequestParams::new();
        params.insert("AmazonCaptureId".to_string(), capture_id);
        params.insert("RefundReferenceId".to_string(), key.clone());
        params.insert("RefundAmount.Amount".to_string(), amount.amount_string());
        params.insert("RefundAmount.CurrencyCode".to_string(), amount.currency.clone());

        let raw = self.client.call(Action::Refund, params).await?;
        if raw.status >= 500 {
            return Err(GatewayError::Remote(raw.remote_error()));
        }

        let response = ActionResponse::from_raw(ResponseKind::Refund, Action::Refund, raw)?;
        if !response.is_success() {
            let message = failure_message(&response, "Refund");
            warn!("Refund {} rejected: {}", key, message);
            return Ok(GatewayResponse::from_action(false, message, response));
        }

        if response.state().as_deref() == Some("Declined") {
            let message = decline_message(&response, "Refund");
            warn!("Refund {} declined: {}", key, message);
            return Ok(GatewayResponse::from_action(false, message, response));
        }

        info!("Refunded {} under {}", amount, key);
        Ok(GatewayResponse::from_action(true, SUCCESS_MESSAGE, response))
    }

    /// Cancels the reference when nothing was captured yet, otherwise refunds
    /// the order total. Decides on the local `capture_id` only.
    pub async fn void(
        &self,
        record: &mut TransactionRecord,
        context: &PaymentContext,
    ) -> Result<GatewayResponse, GatewayError> {
        if record.capture_id.is_some() {
            info!("Voiding captured record {} by refund", record.id);
            return self.refund(&context.order_total, record, context).await;
        }

        let reference = Self::order_reference(record)?;
        let raw = self.remote_order(&reference).cancel().await?;
        if raw.is_success() {
            return Ok(GatewayResponse::from_raw(true, SUCCESS_MESSAGE, raw));
        }
        if raw.status >= 500 {
            return Err(GatewayError::Remote(raw.remote_error()));
        }

        let message = raw.remote_error().formatted();
        warn!("Cancel of {} rejected: {}", reference, message);
        Ok(GatewayResponse::from_raw(false, message, raw))
    }

    pub async fn cancel(
        &self,
        record: &mut TransactionRecord,
        context: &PaymentContext,
    ) -> Result<GatewayResponse, GatewayError> {
        self.void(record, context).await
    }

    /// Closes the remote reference once the payment is complete. Calls for
    /// a payment that cannot be closed are successful no-ops.
    pub async fn close(
        &self,
        record: &mut TransactionRecord,
        payment: &Payment,
    ) -> Result<GatewayResponse, GatewayError> {
        if !record.can_close(payment) {
            return Ok(GatewayResponse::noop());
        }

        let reference = Self::order_reference(record)?;
        let raw = self.remote_order(&reference).close_order_reference().await?;

        record.closed_at = Some(chrono::Utc::now());
        record.touch();
        *record = self.repository.update(record).await?;

        Ok(GatewayResponse::from_raw(true, SUCCESS_MESSAGE, raw))
    }

    pub async fn authorization_details(&self, authorization_id: &str) -> Result<ActionResponse, GatewayError> {
        self.details(
            Action::GetAuthorizationDetails,
            ResponseKind::Authorization,
            "AmazonAuthorizationId",
            authorization_id,
        )
        .await
    }

    pub async fn capture_details(&self, capture_id: &str) -> Result<ActionResponse, GatewayError> {
        self.details(Action::GetCaptureDetails, ResponseKind::Capture, "AmazonCaptureId", capture_id)
            .await
    }

    pub async fn refund_details(&self, refund_id: &str) -> Result<ActionResponse, GatewayError> {
        self.details(Action::GetRefundDetails, ResponseKind::Refund, "AmazonRefundId", refund_id)
            .await
    }

    async fn details(
        &self,
        action: Action,
        kind: ResponseKind,
        id_param: &str,
        id: &str,
    ) -> Result<ActionResponse, GatewayError> {
        validate_reference_id(id)?;
        let mut params = RequestParams::new();
        params.insert(id_param.to_string(), id.to_string());

        let raw = self.client.call(action, params).await?;
        if !raw.is_success() {
            return Err(GatewayError::Remote(raw.remote_error()));
        }

        ActionResponse::from_raw(kind, action, raw)
    }
}

fn classify_authorization(response: &ActionResponse) -> Result<AuthorizeOutcome, GatewayError> {
    if !response.is_success() {
        if !response.has_error_response() {
            return Err(GatewayError::MalformedResponse(format!(
                "Authorize returned {} without an error body",
                response.status()
            )));
        }
        return Ok(AuthorizeOutcome::Rejected(failure_message(response, "Authorization")));
    }

    if response.state().is_none() {
        return Err(GatewayError::MalformedResponse(
            "Authorize response has no AuthorizationStatus".to_string(),
        ));
    }

    if response.is_success_state() {
        return Ok(AuthorizeOutcome::Approved);
    }

    let reason = response.reason_code().unwrap_or_default();
    if reason == SOFT_DECLINE_REASON {
        let message = response
            .error_message()
            .or_else(|| response.reason_description())
            .unwrap_or_else(|| format!("Authorization failure: {}", reason));
        return Ok(AuthorizeOutcome::SoftDecline(message));
    }

    Ok(AuthorizeOutcome::HardDecline(format!("Authorization failure: {}", reason)))
}

fn failure_message(response: &ActionResponse, label: &str) -> String {
    match (response.error_code(), response.error_message()) {
        (_, Some(message)) => message,
        (Some(code), None) => format!("{} failure: {}", label, code),
        (None, None) => format!("{} failure: HTTP {}", label, response.status()),
    }
}

fn decline_message(response: &ActionResponse, label: &str) -> String {
    format!(
        "{} failure: {}",
        label,
        response
            .reason_code()
            .or_else(|| response.state())
            .unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorize_response(status: u16, body: &str) -> ActionResponse {
        ActionResponse::from_raw(
            ResponseKind::Authorization,
            Action::Authorize,
            RawResponse::new(status, body),
        )
        .unwrap()
    }

    fn declined(reason: &str) -> String {
        format!(
            "<AuthorizeResponse><AuthorizeResult><AuthorizationDetails>\
             <AuthorizationStatus><State>Declined</State><ReasonCode>{}</ReasonCode></AuthorizationStatus>\
             </AuthorizationDetails></AuthorizeResult></AuthorizeResponse>",
            reason
        )
    }

    #[test]
    fn test_classify_open() {
        let response = authorize_response(
            200,
            "<AuthorizeResponse><AuthorizeResult><AuthorizationDetails>\
             <AuthorizationStatus><State>Open</State></AuthorizationStatus>\
             </AuthorizationDetails></AuthorizeResult></AuthorizeResponse>",
        );
        assert_eq!(classify_authorization(&response).unwrap(), AuthorizeOutcome::Approved);
    }

    #[test]
    fn test_classify_soft_decline() {
        let response = authorize_response(200, &declined("InvalidPaymentMethod"));
        assert_eq!(
            classify_authorization(&response).unwrap(),
            AuthorizeOutcome::SoftDecline("Authorization failure: InvalidPaymentMethod".to_string())
        );
    }

    #[test]
    fn test_classify_hard_decline() {
        let response = authorize_response(200, &declined("AmazonRejected"));
        assert_eq!(
            classify_authorization(&response).unwrap(),
            AuthorizeOutcome::HardDecline("Authorization failure: AmazonRejected".to_string())
        );
    }

    #[test]
    fn test_classify_error_response() {
        let response = authorize_response(
            400,
            "<ErrorResponse><Error><Type>Sender</Type><Code>InvalidOrderReferenceStatus</Code>\
             <Message>The order reference is in the Draft state.</Message></Error></ErrorResponse>",
        );
        assert_eq!(
            classify_authorization(&response).unwrap(),
            AuthorizeOutcome::Rejected("The order reference is in the Draft state.".to_string())
        );
    }

    #[test]
    fn test_classify_missing_status_is_malformed() {
        let response = authorize_response(200, "<AuthorizeResponse/>");
        assert!(matches!(
            classify_authorization(&response),
            Err(GatewayError::MalformedResponse(_))
        ));
    }
}
