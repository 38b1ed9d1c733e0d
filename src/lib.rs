pub mod adapters;
pub mod amazon;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod startup;
pub mod use_cases;
pub mod utils;
pub mod validation;

pub use error::{CloseFailure, GatewayError, RemoteError};
pub use services::{GatewayAdapter, GatewayResponse, PaymentContext, RemoteOrder};
pub use use_cases::{CheckoutOrchestrator, CheckoutOutcome};
