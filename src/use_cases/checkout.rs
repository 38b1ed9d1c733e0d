//! Checkout use case.
//! Sequences the wallet checkout steps against the host order: payment
//! creation, address retrieval, confirmation and completion with its
//! decline handling.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{CheckoutState, HostAddress, Payment, TransactionRecord};
use crate::error::GatewayError;
use crate::ports::{CountryCatalog, HostError, HostOrder, TransactionRepository};
use crate::services::{GatewayAdapter, OrderReferenceOptions};

pub const PENDING_EMAIL: &str = "pending@amazon.com";
pub const FAILURE_NOTICE: &str =
    "Your order could not be processed. Please check your payment information and try again.";

/// The signed-in shopper, if any, and their saved addresses.
#[derive(Debug, Clone, Default)]
pub struct Shopper {
    pub email: Option<String>,
    pub ship_address: Option<HostAddress>,
    pub bill_address: Option<HostAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The wallet has not disclosed an address yet.
    NoAddress,
    Updated,
    NotShippable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Completed,
    /// Back to the address and payment selection step with a message.
    ReturnToAddress(String),
    /// Attempt discarded; back to the cart with a notice.
    ReturnToCart(String),
}

pub struct CheckoutOrchestrator {
    gateway: Arc<GatewayAdapter>,
    repository: Arc<dyn TransactionRepository>,
    countries: Arc<dyn CountryCatalog>,
}

impl CheckoutOrchestrator {
    pub fn new(gateway: Arc<GatewayAdapter>, countries: Arc<dyn CountryCatalog>) -> Self {
        Self {
            repository: gateway.repository(),
            gateway,
            countries,
        }
    }

    async fn active_record(&self, order: &dyn HostOrder) -> Result<TransactionRecord, GatewayError> {
        self.repository
            .active_for_order(order.id())
            .await?
            .ok_or_else(|| {
                GatewayError::Validation(format!("order {} has no wallet transaction", order.number()))
            })
    }

    fn order_reference(record: &TransactionRecord) -> Result<String, GatewayError> {
        record.order_reference.clone().ok_or_else(|| {
            GatewayError::Validation(format!("record {} has no order reference", record.id))
        })
    }

    /// Reuses the order's valid wallet payment or creates one, numbers it
    /// after the reference and backs it with a transaction record.
    pub async fn start_payment(
        &self,
        order: &mut dyn HostOrder,
        order_reference: &str,
    ) -> Result<Payment, GatewayError> {
        let payment_count = order.payment_count();
        let mut payment = order.wallet_payment().unwrap_or_else(|| {
            Payment::new(String::new(), order.total().amount, order.currency())
        });
        payment.number = Payment::payment_number(order_reference, payment_count);

        if payment.source_id.is_none() {
            let retry = self.repository.any_unsuccessful(order.id()).await?;
            let record = TransactionRecord::new(order.id(), Some(order_reference.to_string()), retry);
            let record = self.repository.insert(&record).await?;
            info!(
                "Created transaction {} for order {} (retry: {})",
                record.id,
                order.number(),
                retry
            );
            payment.source_id = Some(record.id);
        }

        order.save_payment(payment.clone()).await?;
        Ok(payment)
    }

    /// Copies the wallet's shipping address onto the order's ship and bill
    /// addresses and advances to delivery.
    pub async fn load_delivery_address(
        &self,
        order: &mut dyn HostOrder,
        shopper: &Shopper,
        address_consent_token: Option<&str>,
    ) -> Result<DeliveryOutcome, GatewayError> {
        let record = self.active_record(order).await?;
        let reference = Self::order_reference(&record)?;
        let snapshot = self
            .gateway
            .remote_order(&reference)
            .fetch(address_consent_token)
            .await?;

        order.set_state(CheckoutState::Address);

        let Some(remote) = snapshot.shipping_address else {
            return Ok(DeliveryOutcome::NoAddress);
        };

        // Saved values fill gaps in the wallet address: the shopper's first,
        // then whatever the order already carries.
        let email = shopper.email.clone().or_else(|| order.email());
        let saved_ship = shopper.ship_address.clone().or_else(|| order.ship_address());
        let saved_bill = shopper.bill_address.clone().or_else(|| order.bill_address());

        order.set_email(email.unwrap_or_else(|| PENDING_EMAIL.to_string()));
        order.set_ship_address(HostAddress::from_remote(
            &remote,
            saved_ship.as_ref(),
            self.countries.as_ref(),
        ));
        order.set_bill_address(HostAddress::from_remote(
            &remote,
            saved_bill.as_ref(),
            self.countries.as_ref(),
        ));
        order.save().await?;
        order.next().await?;

        if !order.has_shipments() {
            warn!("Order {} is not shippable to the wallet address", order.number());
            return Ok(DeliveryOutcome::NotShippable);
        }

        Ok(DeliveryOutcome::Updated)
    }

    /// Advances the order to confirm and sets the wallet payment amount to
    /// the order total.
    pub async fn confirm(&self, order: &mut dyn HostOrder) -> Result<(), GatewayError> {
        while order.state() != CheckoutState::Confirm {
            if !order.next().await? {
                break;
            }
        }

        if let Some(mut payment) = order.wallet_payment() {
            payment.amount = order.total().amount;
            order.save_payment(payment).await?;
        }

        if order.state() != CheckoutState::Confirm && !order.next().await? {
            return Err(GatewayError::Host(HostError::Transition {
                from: order.state(),
                message: "order cannot reach the confirm step".to_string(),
            }));
        }

        Ok(())
    }

    /// Final step: set details unless retrying, confirm the reference, copy
    /// email and address, then let the host payment pipeline authorize.
    pub async fn complete(&self, order: &mut dyn HostOrder) -> Result<CheckoutOutcome, GatewayError> {
        let record = self.active_record(order).await?;
        let reference = Self::order_reference(&record)?;
        let remote = self.gateway.remote_order(&reference);

        if !record.retry {
            let options = OrderReferenceOptions {
                seller_order_id: Some(order.number()),
                store_name: Some(order.store_name()),
                ..Default::default()
            };
            let outcome = remote.set_order_reference_details(&order.total(), &options).await?;
            if outcome.has_constraints() {
                let message = outcome.constraint_message();
                info!("Order {} blocked by constraints: {}", order.number(), message);
                return Ok(CheckoutOutcome::ReturnToAddress(message));
            }
        }

        remote.confirm().await?;
        let snapshot = remote.fetch(None).await?;
        if let Some(email) = snapshot.email {
            order.set_email(email);
        }
        if let Some(address) = snapshot.shipping_address {
            let saved = order.ship_address();
            order.set_ship_address(HostAddress::from_remote(
                &address,
                saved.as_ref(),
                self.countries.as_ref(),
            ));
        }
        order.save().await?;

        if order.state() == CheckoutState::Confirm && order.next().await? {
            info!("Order {} completed", order.number());
            return Ok(CheckoutOutcome::Completed);
        }

        order.set_state(CheckoutState::Cart);
        let record = self.repository.get_by_id(record.id).await?;

        if record.soft_decline == Some(true) {
            order.save().await?;
            let message = record.message.unwrap_or_else(|| FAILURE_NOTICE.to_string());
            warn!("Order {} soft declined: {}", order.number(), message);
            return Ok(CheckoutOutcome::ReturnToAddress(message));
        }

        let purged = self.repository.delete_for_order(order.id()).await?;
        order.save().await?;
        warn!(
            "Order {} failed; purged {} transaction(s)",
            order.number(),
            purged
        );
        Ok(CheckoutOutcome::ReturnToCart(FAILURE_NOTICE.to_string()))
    }
}
