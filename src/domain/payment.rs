//! Host-side payment and checkout state as seen by the gateway.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Checkout,
    Pending,
    Processing,
    Completed,
    Failed,
    Void,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Checkout => "checkout",
            PaymentState::Pending => "pending",
            PaymentState::Processing => "processing",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
            PaymentState::Void => "void",
        }
    }

    /// Failed and void payments no longer count toward the order.
    pub fn is_valid(&self) -> bool {
        !matches!(self, PaymentState::Failed | PaymentState::Void)
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment record owned by the host. `source_id` points at the
/// `TransactionRecord` backing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub number: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub state: PaymentState,
    pub source_id: Option<Uuid>,
    pub credit_allowed: BigDecimal,
}

impl Payment {
    pub fn new(number: impl Into<String>, amount: BigDecimal, currency: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            amount,
            currency: currency.into(),
            state: PaymentState::Checkout,
            source_id: None,
            credit_allowed: BigDecimal::from(0),
        }
    }

    pub fn payment_number(order_reference: &str, payment_count: usize) -> String {
        format!("{}_{}", order_reference, payment_count)
    }
}

/// Checkout steps of the host order, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutState {
    Cart,
    Address,
    Delivery,
    Payment,
    Confirm,
    Complete,
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Cart => "cart",
            CheckoutState::Address => "address",
            CheckoutState::Delivery => "delivery",
            CheckoutState::Payment => "payment",
            CheckoutState::Confirm => "confirm",
            CheckoutState::Complete => "complete",
        }
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
