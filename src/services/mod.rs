pub mod gateway;
pub mod reference_id;
pub mod remote_order;
pub mod simulation;

pub use gateway::{GatewayAdapter, GatewayResponse, PaymentContext};
pub use remote_order::{OrderReferenceOptions, RemoteOrder, SetDetailsOutcome};
