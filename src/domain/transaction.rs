//! Transaction record entity.
//! Local mirror of one remote order reference and the payment attempt made
//! against it.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payment::{Payment, PaymentState};

pub const SOURCE_NAME: &str = "Pay with Amazon";

/// Operations the host may offer on a payment backed by this record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceAction {
    Capture,
    Credit,
    Void,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub order_id: i64,
    pub order_reference: Option<String>,
    pub authorization_id: Option<String>,
    pub capture_id: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub success: Option<bool>,
    pub message: Option<String>,
    pub soft_decline: Option<bool>,
    pub retry: bool,
    pub authorization_reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(order_id: i64, order_reference: Option<String>, retry: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id,
            order_reference,
            authorization_id: None,
            capture_id: None,
            closed_at: None,
            success: None,
            message: None,
            soft_decline: None,
            retry,
            authorization_reference_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the order reference. A record keeps the first reference it was
    /// given; assigning a different one is rejected.
    pub fn assign_order_reference(&mut self, reference: &str) -> Result<(), String> {
        match self.order_reference.as_deref() {
            None => {
                self.order_reference = Some(reference.to_string());
                Ok(())
            }
            Some(existing) if existing == reference => Ok(()),
            Some(existing) => Err(format!(
                "order reference already set to {}, refusing {}",
                existing, reference
            )),
        }
    }

    pub fn is_unsuccessful(&self) -> bool {
        self.success == Some(false)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    pub fn actions(&self) -> [SourceAction; 4] {
        [
            SourceAction::Capture,
            SourceAction::Credit,
            SourceAction::Void,
            SourceAction::Close,
        ]
    }

    pub fn can_capture(&self, payment: &Payment) -> bool {
        matches!(payment.state, PaymentState::Pending | PaymentState::Checkout)
            && payment.amount > BigDecimal::from(0)
    }

    pub fn can_credit(&self, payment: &Payment) -> bool {
        payment.state == PaymentState::Completed && payment.credit_allowed > BigDecimal::from(0)
    }

    pub fn can_void(&self, payment: &Payment) -> bool {
        payment.state == PaymentState::Pending
    }

    pub fn can_close(&self, payment: &Payment) -> bool {
        payment.state == PaymentState::Completed && self.closed_at.is_none()
    }
}
