//! Address as disclosed by the wallet provider and its mapping onto the
//! host platform's address record.

use serde::{Deserialize, Serialize};

use crate::ports::{Country, CountryCatalog};

pub const FALLBACK_FIRST_NAME: &str = "Amazon";
pub const FALLBACK_LAST_NAME: &str = "User";
pub const FALLBACK_TEXT: &str = "N/A";

/// Address as returned inside `PhysicalDestination` or `BillingAddress`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAddress {
    pub name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub state_name: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
}

impl RemoteAddress {
    pub fn first_name(&self) -> Option<String> {
        self.name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
            .map(str::to_string)
    }

    pub fn last_name(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        let rest = name.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    pub fn country(&self, countries: &dyn CountryCatalog) -> Option<Country> {
        self.country_code
            .as_deref()
            .and_then(|iso| countries.find_by_iso(iso))
    }
}

/// Address record in the shape the host platform stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostAddress {
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub address2: String,
    pub phone: String,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub state_name: Option<String>,
    pub country: Option<Country>,
}

impl HostAddress {
    /// Builds a host address from the remote one. Missing values come from
    /// the shopper's saved address when there is one, then from the
    /// placeholder literals the storefront expects.
    pub fn from_remote(
        remote: &RemoteAddress,
        saved: Option<&HostAddress>,
        countries: &dyn CountryCatalog,
    ) -> Self {
        HostAddress {
            first_name: remote
                .first_name()
                .or_else(|| non_blank(saved.map(|a| a.first_name.as_str())))
                .unwrap_or_else(|| FALLBACK_FIRST_NAME.to_string()),
            last_name: remote
                .last_name()
                .or_else(|| non_blank(saved.map(|a| a.last_name.as_str())))
                .unwrap_or_else(|| FALLBACK_LAST_NAME.to_string()),
            address1: non_blank(remote.address1.as_deref())
                .or_else(|| non_blank(saved.map(|a| a.address1.as_str())))
                .unwrap_or_else(|| FALLBACK_TEXT.to_string()),
            address2: non_blank(remote.address2.as_deref())
                .or_else(|| non_blank(saved.map(|a| a.address2.as_str())))
                .unwrap_or_else(|| FALLBACK_TEXT.to_string()),
            phone: non_blank(remote.phone.as_deref())
                .or_else(|| non_blank(saved.map(|a| a.phone.as_str())))
                .unwrap_or_else(|| FALLBACK_TEXT.to_string()),
            city: non_blank(remote.city.as_deref()).or_else(|| saved.and_then(|a| a.city.clone())),
            zipcode: non_blank(remote.zipcode.as_deref())
                .or_else(|| saved.and_then(|a| a.zipcode.clone())),
            state_name: non_blank(remote.state_name.as_deref())
                .or_else(|| saved.and_then(|a| a.state_name.clone())),
            country: remote
                .country(countries)
                .or_else(|| saved.and_then(|a| a.country.clone())),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
