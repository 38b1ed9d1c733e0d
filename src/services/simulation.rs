//! Sandbox decline simulation.
//!
//! In sandbox mode a shipping address whose last name is
//! `SandboxSimulation` turns its first name, `"{ReasonCode}-{minutes}"`,
//! into a `SellerAuthorizationNote` that makes the sandbox answer with the
//! requested decline.

use serde_json::{json, Map, Value};

use crate::domain::HostAddress;

pub const SIMULATION_LAST_NAME: &str = "SandboxSimulation";
const EXPIRED: &str = "Expired";

pub fn authorization_note(sandbox: bool, ship_address: Option<&HostAddress>) -> Option<String> {
    if !sandbox {
        return None;
    }

    let address = ship_address?;
    if address.last_name != SIMULATION_LAST_NAME {
        return None;
    }

    let (reason, minutes) = parse_directive(&address.first_name)?;
    Some(directive(&reason, minutes).to_string())
}

fn parse_directive(first_name: &str) -> Option<(String, u32)> {
    let first_name = first_name.trim();
    let (reason, minutes) = match first_name.split_once('-') {
        Some((reason, minutes)) => (reason, minutes.trim().parse().unwrap_or(0)),
        None => (first_name, 0),
    };

    if reason.is_empty() {
        return None;
    }

    Some((reason.to_string(), minutes))
}

fn directive(reason: &str, minutes: u32) -> Value {
    if reason == EXPIRED {
        return json!({
            "SandboxSimulation": {
                "State": "Closed",
                "ReasonCode": "ExpiredUnused",
                "ExpirationTimeInMins": minutes,
            }
        });
    }

    let mut simulation = Map::new();
    simulation.insert("State".to_string(), json!("Declined"));
    simulation.insert("ReasonCode".to_string(), json!(reason));
    if minutes > 0 {
        simulation.insert("PaymentMethodUpdateTimeInMins".to_string(), json!(minutes));
    }

    json!({ "SandboxSimulation": simulation })
}
