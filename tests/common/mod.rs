#![allow(dead_code)]

use amazon_pay_gateway::adapters::InMemoryTransactionRepository;
use amazon_pay_gateway::amazon::SignedRequestClient;
use amazon_pay_gateway::config::GatewayConfig;
use amazon_pay_gateway::domain::{CheckoutState, HostAddress, Money, Payment, PaymentState};
use amazon_pay_gateway::ports::{
    Country, CountryCatalog, HostOrder, HostResult, TransactionRepository,
};
use amazon_pay_gateway::services::{GatewayAdapter, PaymentContext};
use async_trait::async_trait;
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

pub const API_PATH: &str = "/OffAmazonPayments_Sandbox/2013-01-01";
pub const PUBLIC_BASE_URL: &str = "https://shop.example.com";
pub const ORDER_REFERENCE: &str = "S01-4301752-9080047";

pub fn gateway_config(server_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::new("SELLER", "ACCESS", "SECRET");
    config.endpoint_override = Some(format!("{}{}", server_url, API_PATH));
    config.request_timeout = Duration::from_secs(5);
    config.retry_base_delay = Duration::from_millis(5);
    config.max_retries = 2;
    config
}

pub fn client(server_url: &str) -> SignedRequestClient {
    SignedRequestClient::new(gateway_config(server_url))
}

pub fn adapter(server_url: &str) -> (Arc<GatewayAdapter>, Arc<InMemoryTransactionRepository>) {
    let repository = Arc::new(InMemoryTransactionRepository::new());
    let adapter = GatewayAdapter::new(
        client(server_url),
        repository.clone() as Arc<dyn TransactionRepository>,
        PUBLIC_BASE_URL,
    );
    (Arc::new(adapter), repository)
}

/// Matches the form-encoded `Action` parameter.
pub fn action(name: &str) -> Matcher {
    Matcher::UrlEncoded("Action".into(), name.into())
}

pub fn param(name: &str, value: &str) -> Matcher {
    Matcher::UrlEncoded(name.into(), value.into())
}

pub fn context(payment_number: &str, total_cents: i64) -> PaymentContext {
    PaymentContext {
        order_number: "R123456789".to_string(),
        payment_number: payment_number.to_string(),
        currency: "USD".to_string(),
        order_total: Money::from_cents(total_cents, "USD"),
        ship_address: None,
    }
}

pub fn order_details(state: &str, amount: &str, destination: bool) -> String {
    let destination = if destination {
        r#"<Destination>
        <DestinationType>Physical</DestinationType>
        <PhysicalDestination>
          <Name>Mary Jones</Name>
          <AddressLine1>4409 Main St.</AddressLine1>
          <City>New York</City>
          <StateOrRegion>NY</StateOrRegion>
          <PostalCode>10012</PostalCode>
          <CountryCode>US</CountryCode>
          <Phone>800-000-0000</Phone>
        </PhysicalDestination>
      </Destination>"#
    } else {
        ""
    };

    format!(
        r#"<?xml version="1.0"?>
<GetOrderReferenceDetailsResponse xmlns="http://mws.amazonservices.com/schema/OffAmazonPayments/2013-01-01">
  <GetOrderReferenceDetailsResult>
    <OrderReferenceDetails>
      <AmazonOrderReferenceId>{reference}</AmazonOrderReferenceId>
      <OrderReferenceStatus><State>{state}</State></OrderReferenceStatus>
      <OrderTotal><CurrencyCode>USD</CurrencyCode><Amount>{amount}</Amount></OrderTotal>
      <Buyer><Name>Mary Jones</Name><Email>mary@example.com</Email></Buyer>
      {destination}
    </OrderReferenceDetails>
  </GetOrderReferenceDetailsResult>
  <ResponseMetadata><RequestId>5f20169b-7ab2-11df-bcef-d35615e2b044</RequestId></ResponseMetadata>
</GetOrderReferenceDetailsResponse>"#,
        reference = ORDER_REFERENCE,
        state = state,
        amount = amount,
        destination = destination
    )
}

pub fn set_details(constraints: &[(&str, &str)]) -> String {
    let constraints = if constraints.is_empty() {
        String::new()
    } else {
        let items: String = constraints
            .iter()
            .map(|(id, description)| {
                format!(
                    "<Constraint><ConstraintID>{}</ConstraintID><Description>{}</Description></Constraint>",
                    id, description
                )
            })
            .collect();
        format!("<Constraints>{}</Constraints>", items)
    };

    format!(
        r#"<SetOrderReferenceDetailsResponse xmlns="http://mws.amazonservices.com/schema/OffAmazonPayments/2013-01-01">
  <SetOrderReferenceDetailsResult>
    <OrderReferenceDetails>
      <AmazonOrderReferenceId>{}</AmazonOrderReferenceId>
      <OrderReferenceStatus><State>Draft</State></OrderReferenceStatus>
      {}
    </OrderReferenceDetails>
  </SetOrderReferenceDetailsResult>
</SetOrderReferenceDetailsResponse>"#,
        ORDER_REFERENCE, constraints
    )
}

pub fn authorize(state: &str, reason: Option<&str>) -> String {
    authorize_described(state, reason, None)
}

pub fn authorize_described(state: &str, reason: Option<&str>, description: Option<&str>) -> String {
    let reason = reason
        .map(|r| format!("<ReasonCode>{}</ReasonCode>", r))
        .unwrap_or_default()
        + &description
            .map(|d| format!("<ReasonDescription>{}</ReasonDescription>", d))
            .unwrap_or_default();
    format!(
        r#"<AuthorizeResponse xmlns="http://mws.amazonservices.com/schema/OffAmazonPayments/2013-01-01">
  <AuthorizeResult>
    <AuthorizationDetails>
      <AmazonAuthorizationId>P01-1234567-1234567-0000001</AmazonAuthorizationId>
      <AuthorizationReferenceId>R123456789-abc0123456</AuthorizationReferenceId>
      <AuthorizationAmount><CurrencyCode>USD</CurrencyCode><Amount>110.00</Amount></AuthorizationAmount>
      <AuthorizationStatus>
        <State>{}</State>
        {}
      </AuthorizationStatus>
    </AuthorizationDetails>
  </AuthorizeResult>
</AuthorizeResponse>"#,
        state, reason
    )
}

pub const CAPTURE_COMPLETED: &str = r#"<CaptureResponse xmlns="http://mws.amazonservices.com/schema/OffAmazonPayments/2013-01-01">
  <CaptureResult>
    <CaptureDetails>
      <AmazonCaptureId>P01-1234567-1234567-0000002</AmazonCaptureId>
      <CaptureReferenceId>R123456789-def0123456</CaptureReferenceId>
      <CaptureAmount><CurrencyCode>USD</CurrencyCode><Amount>110.00</Amount></CaptureAmount>
      <CaptureStatus><State>Completed</State></CaptureStatus>
    </CaptureDetails>
  </CaptureResult>
</CaptureResponse>"#;

pub const REFUND_PENDING: &str = r#"<RefundResponse xmlns="http://mws.amazonservices.com/schema/OffAmazonPayments/2013-01-01">
  <RefundResult>
    <RefundDetails>
      <AmazonRefundId>P01-1234567-1234567-0000003</AmazonRefundId>
      <RefundReferenceId>R123456789-ghi0123456</RefundReferenceId>
      <RefundAmount><CurrencyCode>USD</CurrencyCode><Amount>110.00</Amount></RefundAmount>
      <RefundStatus><State>Pending</State></RefundStatus>
    </RefundDetails>
  </RefundResult>
</RefundResponse>"#;

pub const CONFIRM_OK: &str = r#"<ConfirmOrderReferenceResponse xmlns="http://mws.amazonservices.com/schema/OffAmazonPayments/2013-01-01">
  <ResponseMetadata><RequestId>f1f9b5e5-7ab2-11df-bcef-d35615e2b044</RequestId></ResponseMetadata>
</ConfirmOrderReferenceResponse>"#;

pub const CLOSE_OK: &str = r#"<CloseOrderReferenceResponse xmlns="http://mws.amazonservices.com/schema/OffAmazonPayments/2013-01-01">
  <CloseOrderReferenceResult/>
  <ResponseMetadata><RequestId>a1b2c3d4</RequestId></ResponseMetadata>
</CloseOrderReferenceResponse>"#;

pub const CANCEL_OK: &str = r#"<CancelOrderReferenceResponse xmlns="http://mws.amazonservices.com/schema/OffAmazonPayments/2013-01-01">
  <CancelOrderReferenceResult/>
  <ResponseMetadata><RequestId>e5f6a7b8</RequestId></ResponseMetadata>
</CancelOrderReferenceResponse>"#;

pub fn error_response(code: &str, message: &str) -> String {
    format!(
        r#"<ErrorResponse xmlns="http://mws.amazonservices.com/schema/OffAmazonPayments/2013-01-01">
  <Error><Type>Sender</Type><Code>{}</Code><Message>{}</Message></Error>
  <RequestId>b3f9d0c1</RequestId>
</ErrorResponse>"#,
        code, message
    )
}

pub struct UsCatalog;

impl CountryCatalog for UsCatalog {
    fn find_by_iso(&self, iso: &str) -> Option<Country> {
        (iso == "US").then(us)
    }
}

pub fn us() -> Country {
    Country {
        id: 232,
        iso: "US".to_string(),
        name: "United States".to_string(),
    }
}

/// Host order double whose confirm step authorizes through the adapter,
/// the way the host payment pipeline does.
pub struct FakeOrder {
    pub id: i64,
    pub number: String,
    pub total_cents: i64,
    pub state: CheckoutState,
    pub email: Option<String>,
    pub ship_address: Option<HostAddress>,
    pub bill_address: Option<HostAddress>,
    pub shippable: bool,
    pub payments: Vec<Payment>,
    pub saves: usize,
    gateway: Arc<GatewayAdapter>,
    repository: Arc<InMemoryTransactionRepository>,
}

impl FakeOrder {
    pub fn new(
        gateway: Arc<GatewayAdapter>,
        repository: Arc<InMemoryTransactionRepository>,
        total_cents: i64,
    ) -> Self {
        Self {
            id: 42,
            number: "R123456789".to_string(),
            total_cents,
            state: CheckoutState::Cart,
            email: None,
            ship_address: None,
            bill_address: None,
            shippable: true,
            payments: Vec::new(),
            saves: 0,
            gateway,
            repository,
        }
    }

    async fn process_payment(&mut self) -> bool {
        let Some(index) = self.payments.iter().position(|p| p.state.is_valid()) else {
            return false;
        };
        let Ok(Some(mut record)) = self.repository.active_for_order(self.id).await else {
            return false;
        };

        let context = PaymentContext {
            order_number: self.number.clone(),
            payment_number: self.payments[index].number.clone(),
            currency: "USD".to_string(),
            order_total: self.total(),
            ship_address: self.ship_address.clone(),
        };

        match self
            .gateway
            .authorize(self.total_cents, &mut record, &context)
            .await
        {
            Ok(response) if response.success => {
                self.payments[index].state = PaymentState::Pending;
                true
            }
            _ => {
                self.payments[index].state = PaymentState::Failed;
                false
            }
        }
    }
}

#[async_trait]
impl HostOrder for FakeOrder {
    fn id(&self) -> i64 {
        self.id
    }

    fn number(&self) -> String {
        self.number.clone()
    }

    fn total(&self) -> Money {
        Money::from_cents(self.total_cents, "USD")
    }

    fn currency(&self) -> String {
        "USD".to_string()
    }

    fn store_name(&self) -> String {
        "Example Store".to_string()
    }

    fn state(&self) -> CheckoutState {
        self.state
    }

    fn email(&self) -> Option<String> {
        self.email.clone()
    }

    fn ship_address(&self) -> Option<HostAddress> {
        self.ship_address.clone()
    }

    fn bill_address(&self) -> Option<HostAddress> {
        self.bill_address.clone()
    }

    fn has_shipments(&self) -> bool {
        self.shippable && self.ship_address.is_some()
    }

    fn set_email(&mut self, email: String) {
        self.email = Some(email);
    }

    fn set_ship_address(&mut self, address: HostAddress) {
        self.ship_address = Some(address);
    }

    fn set_bill_address(&mut self, address: HostAddress) {
        self.bill_address = Some(address);
    }

    fn set_state(&mut self, state: CheckoutState) {
        self.state = state;
    }

    async fn next(&mut self) -> HostResult<bool> {
        let next = match self.state {
            CheckoutState::Cart => CheckoutState::Address,
            CheckoutState::Address => CheckoutState::Delivery,
            CheckoutState::Delivery => CheckoutState::Payment,
            CheckoutState::Payment => CheckoutState::Confirm,
            CheckoutState::Confirm => {
                if !self.process_payment().await {
                    return Ok(false);
                }
                CheckoutState::Complete
            }
            CheckoutState::Complete => return Ok(false),
        };
        self.state = next;
        Ok(true)
    }

    async fn save(&mut self) -> HostResult<()> {
        self.saves += 1;
        Ok(())
    }

    fn wallet_payment(&self) -> Option<Payment> {
        self.payments.iter().find(|p| p.state.is_valid()).cloned()
    }

    fn payment_count(&self) -> usize {
        self.payments.len()
    }

    async fn save_payment(&mut self, payment: Payment) -> HostResult<()> {
        match self.payments.iter_mut().find(|p| p.id == payment.id) {
            Some(existing) => *existing = payment,
            None => self.payments.push(payment),
        }
        Ok(())
    }
}
