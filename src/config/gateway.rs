use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::validation::{
    validate_base_url, validate_currency_code, validate_enum, validate_required, ValidationError,
    ValidationResult, ALLOWED_REGIONS,
};

pub const API_VERSION: &str = "2013-01-01";
/// Upper bound for a single retry delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Uk,
    De,
    Jp,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Uk => "uk",
            Region::De => "de",
            Region::Jp => "jp",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        validate_enum("region", &value, ALLOWED_REGIONS)?;
        Ok(match value.as_str() {
            "uk" => Region::Uk,
            "de" => Region::De,
            "jp" => Region::Jp,
            _ => Region::Us,
        })
    }
}

/// Settings for one configured gateway instance. Every component that talks
/// to the remote API is handed one of these explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub currency: String,
    pub client_id: String,
    pub merchant_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: Region,
    pub sandbox: bool,
    /// Replaces the region API URL, e.g. to point at a local test server.
    pub endpoint_override: Option<String>,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl GatewayConfig {
    pub fn new(
        merchant_id: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            currency: "USD".to_string(),
            client_id: String::new(),
            merchant_id: merchant_id.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: Region::Us,
            sandbox: true,
            endpoint_override: None,
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = GatewayConfig::new(
            env::var("AMAZON_MERCHANT_ID")?,
            env::var("AMAZON_ACCESS_KEY_ID")?,
            env::var("AMAZON_SECRET_ACCESS_KEY")?,
        );

        config.currency = env::var("AMAZON_CURRENCY").unwrap_or_else(|_| "USD".to_string());
        config.client_id = env::var("AMAZON_CLIENT_ID").unwrap_or_default();
        config.region = env::var("AMAZON_REGION")
            .unwrap_or_else(|_| "us".to_string())
            .parse()?;
        config.sandbox = env::var("AMAZON_SANDBOX")
            .unwrap_or_else(|_| "true".to_string())
            .parse()?;
        config.endpoint_override = env::var("AMAZON_ENDPOINT").ok();
        config.request_timeout = Duration::from_secs(
            env::var("AMAZON_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
        );
        config.max_retries = env::var("AMAZON_MAX_RETRIES")
            .unwrap_or_else(|_| "3".to_string())
            .parse()?;

        Ok(config)
    }

    pub fn validate(&self) -> ValidationResult {
        validate_currency_code(&self.currency)?;
        validate_required("merchant_id", &self.merchant_id)?;
        validate_required("access_key_id", &self.access_key_id)?;
        validate_required("secret_access_key", &self.secret_access_key)?;
        if let Some(endpoint) = &self.endpoint_override {
            validate_base_url("endpoint_override", endpoint)?;
        }
        if self.max_retries > 0 && self.retry_base_delay.is_zero() {
            return Err(ValidationError::new(
                "retry_base_delay",
                "must be greater than zero when retries are enabled",
            ));
        }
        if self.retry_base_delay > MAX_RETRY_DELAY {
            return Err(ValidationError::new(
                "retry_base_delay",
                format!("must be at most {} seconds", MAX_RETRY_DELAY.as_secs()),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ValidationError::new("request_timeout", "must be greater than zero"));
        }
        Ok(())
    }

    pub fn api_url(&self) -> String {
        if let Some(endpoint) = &self.endpoint_override {
            return endpoint.trim_end_matches('/').to_string();
        }

        let sandbox = if self.sandbox { "_Sandbox" } else { "" };
        let host = match self.region {
            Region::Us => "mws.amazonservices.com",
            Region::Uk | Region::De => "mws-eu.amazonservices.com",
            Region::Jp => "mws.amazonservices.jp",
        };
        format!("https://{}/OffAmazonPayments{}/{}", host, sandbox, API_VERSION)
    }

    pub fn widgets_url(&self) -> String {
        let sandbox = if self.sandbox { "/sandbox" } else { "" };
        match self.region {
            Region::Us => format!(
                "https://static-na.payments-amazon.com/OffAmazonPayments/us{}/js/Widgets.js",
                sandbox
            ),
            Region::Uk => format!(
                "https://static-eu.payments-amazon.com/OffAmazonPayments/uk{}/lpa/js/Widgets.js",
                sandbox
            ),
            Region::De => format!(
                "https://static-eu.payments-amazon.com/OffAmazonPayments/de{}/lpa/js/Widgets.js",
                sandbox
            ),
            Region::Jp => format!(
                "https://origin-na.ssl-images-amazon.com/images/G/09/EP/offAmazonPayments{}/prod/lpa/js/Widgets.js",
                sandbox
            ),
        }
    }
}
