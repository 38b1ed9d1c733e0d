//! Use cases driving the host order through the wallet checkout.

pub mod checkout;

pub use checkout::{CheckoutOrchestrator, CheckoutOutcome, DeliveryOutcome, Shopper};
