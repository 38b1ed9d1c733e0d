//! Wire layer for the Amazon Payments (MWS) API: request signing, the
//! signed HTTP client and response decoding.

pub mod client;
pub mod response;
pub mod signature;
pub mod xml;

use std::fmt;

pub use client::SignedRequestClient;
pub use response::{ActionResponse, RawResponse, ResponseKind};
pub use signature::RequestParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GetOrderReferenceDetails,
    SetOrderReferenceDetails,
    ConfirmOrderReference,
    CancelOrderReference,
    CloseOrderReference,
    Authorize,
    Capture,
    Refund,
    GetAuthorizationDetails,
    GetCaptureDetails,
    GetRefundDetails,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::GetOrderReferenceDetails => "GetOrderReferenceDetails",
            Action::SetOrderReferenceDetails => "SetOrderReferenceDetails",
            Action::ConfirmOrderReference => "ConfirmOrderReference",
            Action::CancelOrderReference => "CancelOrderReference",
            Action::CloseOrderReference => "CloseOrderReference",
            Action::Authorize => "Authorize",
            Action::Capture => "Capture",
            Action::Refund => "Refund",
            Action::GetAuthorizationDetails => "GetAuthorizationDetails",
            Action::GetCaptureDetails => "GetCaptureDetails",
            Action::GetRefundDetails => "GetRefundDetails",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
