//! Snapshot of a remote order reference.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::address::RemoteAddress;
use crate::domain::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemoteOrderState {
    Draft,
    Open,
    Suspended,
    Canceled,
    Declined,
    Closed,
    Other(String),
}

impl RemoteOrderState {
    pub fn as_str(&self) -> &str {
        match self {
            RemoteOrderState::Draft => "Draft",
            RemoteOrderState::Open => "Open",
            RemoteOrderState::Suspended => "Suspended",
            RemoteOrderState::Canceled => "Canceled",
            RemoteOrderState::Declined => "Declined",
            RemoteOrderState::Closed => "Closed",
            RemoteOrderState::Other(state) => state,
        }
    }

    /// Declined and closed references cannot be used for new payments.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RemoteOrderState::Declined | RemoteOrderState::Closed)
    }
}

impl From<String> for RemoteOrderState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Draft" => RemoteOrderState::Draft,
            "Open" => RemoteOrderState::Open,
            "Suspended" => RemoteOrderState::Suspended,
            "Canceled" => RemoteOrderState::Canceled,
            "Declined" => RemoteOrderState::Declined,
            "Closed" => RemoteOrderState::Closed,
            _ => RemoteOrderState::Other(value),
        }
    }
}

impl From<RemoteOrderState> for String {
    fn from(state: RemoteOrderState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for RemoteOrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reason the remote side will not accept payment on the reference yet,
/// e.g. `ShippingAddressNotSet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOrderSnapshot {
    pub state: Option<RemoteOrderState>,
    pub total: Money,
    pub email: Option<String>,
    pub shipping_address: Option<RemoteAddress>,
    pub billing_address: Option<RemoteAddress>,
    pub constraints: Vec<Constraint>,
}
