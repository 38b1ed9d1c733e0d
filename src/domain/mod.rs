//! Domain layer.
//! Framework-agnostic entities for the checkout gateway.

pub mod address;
pub mod money;
pub mod order_reference;
pub mod payment;
pub mod transaction;

pub use address::{HostAddress, RemoteAddress};
pub use money::Money;
pub use order_reference::{Constraint, RemoteOrderSnapshot, RemoteOrderState};
pub use payment::{CheckoutState, Payment, PaymentState};
pub use transaction::{SourceAction, TransactionRecord};
