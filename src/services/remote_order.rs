//! One remote order reference and the calls made against it.

use serde_json::Value;
use tracing::{info, warn};

use crate::amazon::xml::{lookup, lookup_str};
use crate::amazon::{Action, RawResponse, RequestParams, SignedRequestClient};
use crate::domain::{Constraint, Money, RemoteAddress, RemoteOrderSnapshot};
use crate::error::{CloseFailure, GatewayError, RemoteError};
use crate::validation::{validate_max_len, SELLER_NOTE_MAX_LEN};

pub const COMPLETE_PATH: &str = "/amazon_order/complete";
pub const CONFIRMATION_PATH: &str = "/amazon_order/confirmation";

const ORDER_DETAILS_PATH: &str =
    "GetOrderReferenceDetailsResponse/GetOrderReferenceDetailsResult/OrderReferenceDetails";
const SET_DETAILS_PATH: &str =
    "SetOrderReferenceDetailsResponse/SetOrderReferenceDetailsResult/OrderReferenceDetails";

/// Optional seller attributes sent with SetOrderReferenceDetails.
#[derive(Debug, Clone, Default)]
pub struct OrderReferenceOptions {
    pub seller_note: Option<String>,
    pub seller_order_id: Option<String>,
    pub store_name: Option<String>,
    pub custom_information: Option<String>,
}

/// Outcome of SetOrderReferenceDetails.
#[derive(Debug, Clone)]
pub struct SetDetailsOutcome {
    pub success: bool,
    pub constraints: Vec<Constraint>,
    pub error: Option<RemoteError>,
    pub parsed: Value,
}

impl SetDetailsOutcome {
    pub fn has_constraints(&self) -> bool {
        !self.constraints.is_empty()
    }

    /// Constraints rendered for display to the shopper.
    pub fn constraint_message(&self) -> String {
        self.constraints
            .iter()
            .map(|c| {
                if c.description.is_empty() {
                    c.id.clone()
                } else {
                    format!("{}: {}", c.id, c.description)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Clone)]
pub struct RemoteOrder {
    client: SignedRequestClient,
    reference_id: String,
    public_base_url: String,
}

impl RemoteOrder {
    pub fn new(
        client: SignedRequestClient,
        reference_id: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            reference_id: reference_id.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    fn params(&self) -> RequestParams {
        let mut params = RequestParams::new();
        params.insert(
            "AmazonOrderReferenceId".to_string(),
            self.reference_id.clone(),
        );
        params
    }

    pub async fn fetch(
        &self,
        address_consent_token: Option<&str>,
    ) -> Result<RemoteOrderSnapshot, GatewayError> {
        let mut params = self.params();
        if let Some(token) = address_consent_token {
            params.insert("AddressConsentToken".to_string(), token.to_string());
        }

        let raw = self
            .client
            .call(Action::GetOrderReferenceDetails, params)
            .await?;
        if !raw.is_success() {
            return Err(GatewayError::Remote(raw.remote_error()));
        }

        let parsed = raw.decode()?;
        let details = lookup(&parsed, ORDER_DETAILS_PATH).ok_or_else(|| {
            GatewayError::MalformedResponse(format!(
                "missing OrderReferenceDetails for {}",
                self.reference_id
            ))
        })?;

        Ok(snapshot_from_details(details))
    }

    pub async fn confirm(&self) -> Result<RawResponse, GatewayError> {
        let base = self.public_base_url.trim_end_matches('/');
        let mut params = self.params();
        params.insert("SuccessUrl".to_string(), format!("{}{}", base, COMPLETE_PATH));
        params.insert(
            "FailureUrl".to_string(),
            format!("{}{}", base, CONFIRMATION_PATH),
        );

        let raw = self
            .client
            .call(Action::ConfirmOrderReference, params)
            .await?;
        if !raw.is_success() {
            let err = raw.remote_error();
            warn!("Confirm failed for {}: {}", self.reference_id, err);
            return Err(GatewayError::Remote(err));
        }

        info!("Confirmed order reference {}", self.reference_id);
        Ok(raw)
    }

    pub async fn set_order_reference_details(
        &self,
        total: &Money,
        options: &OrderReferenceOptions,
    ) -> Result<SetDetailsOutcome, GatewayError> {
        if let Some(note) = &options.seller_note {
            validate_max_len("seller_note", note, SELLER_NOTE_MAX_LEN)?;
        }

        let mut params = self.params();
        params.insert(
            "OrderReferenceAttributes.OrderTotal.Amount".to_string(),
            total.amount_string(),
        );
        params.insert(
            "OrderReferenceAttributes.OrderTotal.CurrencyCode".to_string(),
            total.currency.clone(),
        );
        let optional = [
            ("OrderReferenceAttributes.SellerNote", &options.seller_note),
            (
                "OrderReferenceAttributes.SellerOrderAttributes.SellerOrderId",
                &options.seller_order_id,
            ),
            (
                "OrderReferenceAttributes.SellerOrderAttributes.StoreName",
                &options.store_name,
            ),
            (
                "OrderReferenceAttributes.SellerOrderAttributes.CustomInformation",
                &options.custom_information,
            ),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                params.insert(name.to_string(), value.clone());
            }
        }

        let raw = self
            .client
            .call(Action::SetOrderReferenceDetails, params)
            .await?;

        if !raw.is_success() {
            let err = raw.remote_error();
            warn!(
                "SetOrderReferenceDetails failed for {}: {}",
                self.reference_id, err
            );
            return Ok(SetDetailsOutcome {
                success: false,
                constraints: Vec::new(),
                parsed: raw.decode_lenient(),
                error: Some(err),
            });
        }

        let parsed = raw.decode()?;
        let constraints = lookup(&parsed, SET_DETAILS_PATH)
            .map(constraints_from_details)
            .unwrap_or_default();

        if !constraints.is_empty() {
            info!(
                "Order reference {} has {} open constraint(s)",
                self.reference_id,
                constraints.len()
            );
        }

        Ok(SetDetailsOutcome {
            success: true,
            constraints,
            error: None,
            parsed,
        })
    }

    /// Closes the reference. Any non-2xx answer is a `CloseFailure`.
    pub async fn close_order_reference(&self) -> Result<RawResponse, GatewayError> {
        let raw = self
            .client
            .call(Action::CloseOrderReference, self.params())
            .await?;

        if !raw.is_success() {
            let failure = CloseFailure::from(raw.remote_error());
            warn!("Close failed for {}: {}", self.reference_id, failure);
            return Err(GatewayError::Close(failure));
        }

        info!("Closed order reference {}", self.reference_id);
        Ok(raw)
    }

    /// Cancels the reference. The raw answer is returned whatever its status.
    pub async fn cancel(&self) -> Result<RawResponse, GatewayError> {
        let raw = self
            .client
            .call(Action::CancelOrderReference, self.params())
            .await?;
        info!(
            "Cancel of {} answered with status {}",
            self.reference_id, raw.status
        );
        Ok(raw)
    }
}

fn snapshot_from_details(details: &Value) -> RemoteOrderSnapshot {
    let currency = lookup_str(details, "OrderTotal/CurrencyCode").unwrap_or("USD");
    let total = lookup_str(details, "OrderTotal/Amount")
        .and_then(|amount| Money::parse(amount, currency))
        .unwrap_or_else(|| Money::from_cents(0, currency));

    let billing = lookup(details, "BillingAddress/PhysicalAddress")
        .or_else(|| lookup(details, "BillingAddress"))
        .and_then(address_from);

    RemoteOrderSnapshot {
        state: lookup_str(details, "OrderReferenceStatus/State").map(|s| s.to_string().into()),
        total,
        email: lookup_str(details, "Buyer/Email").map(str::to_string),
        shipping_address: lookup(details, "Destination/PhysicalDestination").and_then(address_from),
        billing_address: billing,
        constraints: constraints_from_details(details),
    }
}

fn address_from(value: &Value) -> Option<RemoteAddress> {
    if !value.is_object() {
        return None;
    }

    let field = |name: &str| lookup_str(value, name).map(str::to_string);
    Some(RemoteAddress {
        name: field("Name"),
        address1: field("AddressLine1"),
        address2: field("AddressLine2"),
        city: field("City"),
        zipcode: field("PostalCode"),
        state_name: field("StateOrRegion"),
        country_code: field("CountryCode"),
        phone: field("Phone"),
    })
}

fn constraints_from_details(details: &Value) -> Vec<Constraint> {
    let to_constraint = |value: &Value| {
        lookup_str(value, "ConstraintID").map(|id| Constraint {
            id: id.to_string(),
            description: lookup_str(value, "Description")
                .unwrap_or_default()
                .to_string(),
        })
    };

    match lookup(details, "Constraints/Constraint") {
        Some(Value::Array(items)) => items.iter().filter_map(to_constraint).collect(),
        Some(item @ Value::Object(_)) => to_constraint(item).into_iter().collect(),
        _ => Vec::new(),
    }
}
