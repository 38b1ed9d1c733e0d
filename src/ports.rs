//! Ports the gateway core depends on.
//! The host commerce platform and the storage of transaction records are
//! reached only through these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{CheckoutState, HostAddress, Money, Payment, TransactionRecord};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage for transaction records. An order owns many records; the most
/// recently created one is the active record.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, record: &TransactionRecord) -> RepositoryResult<TransactionRecord>;

    /// Persists every mutable field. `order_reference` may only move from
    /// unset to set.
    async fn update(&self, record: &TransactionRecord) -> RepositoryResult<TransactionRecord>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<TransactionRecord>;

    async fn active_for_order(&self, order_id: i64) -> RepositoryResult<Option<TransactionRecord>>;

    async fn any_unsuccessful(&self, order_id: i64) -> RepositoryResult<bool>;

    /// Returns the number of deleted records.
    async fn delete_for_order(&self, order_id: i64) -> RepositoryResult<u64>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Invalid order transition from {from}: {message}")]
    Transition {
        from: CheckoutState,
        message: String,
    },

    #[error("Host persistence failed: {0}")]
    Persistence(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Country entry of the host platform's catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub iso: String,
    pub name: String,
}

pub trait CountryCatalog: Send + Sync {
    fn find_by_iso(&self, iso: &str) -> Option<Country>;
}

/// The host order as the checkout flow needs it.
#[async_trait]
pub trait HostOrder: Send + Sync {
    fn id(&self) -> i64;
    fn number(&self) -> String;
    fn total(&self) -> Money;
    fn currency(&self) -> String;
    fn store_name(&self) -> String;
    fn state(&self) -> CheckoutState;
    fn email(&self) -> Option<String>;
    fn ship_address(&self) -> Option<HostAddress>;
    fn bill_address(&self) -> Option<HostAddress>;
    fn has_shipments(&self) -> bool;

    fn set_email(&mut self, email: String);
    fn set_ship_address(&mut self, address: HostAddress);
    fn set_bill_address(&mut self, address: HostAddress);
    fn set_state(&mut self, state: CheckoutState);

    /// Advances one checkout step. Leaving `Confirm` runs the host payment
    /// pipeline, which authorizes through the gateway. Returns `false` when
    /// the transition was refused.
    async fn next(&mut self) -> HostResult<bool>;

    async fn save(&mut self) -> HostResult<()>;

    /// Valid (not failed or void) payment of this gateway's type.
    fn wallet_payment(&self) -> Option<Payment>;

    /// Number of payments on the order across all states.
    fn payment_count(&self) -> usize;

    /// Creates or replaces the payment with the same id.
    async fn save_payment(&mut self, payment: Payment) -> HostResult<()>;
}
