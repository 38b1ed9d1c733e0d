//! Signature version 2 request signing.
//!
//! Parameters are sorted by name, strictly percent-encoded and joined into
//! `POST\n{host}\n{path}\n{query}`. That string is signed with HMAC-SHA256
//! under the secret access key and the base64 digest is appended as the
//! `Signature` parameter.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;
use std::collections::BTreeMap;

use crate::config::gateway::API_VERSION;
use crate::config::GatewayConfig;
use crate::error::GatewayError;

use super::Action;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_METHOD: &str = "HmacSHA256";
pub const SIGNATURE_VERSION: &str = "2";

/// Only `A-Z a-z 0-9 - _ . ~` pass through unescaped.
const STRICT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Flat request parameters, kept sorted by name.
pub type RequestParams = BTreeMap<String, String>;

pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, STRICT).to_string()
}

pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn canonical_query(params: &RequestParams) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn string_to_sign(host: &str, path: &str, params: &RequestParams) -> String {
    let path = if path.is_empty() { "/" } else { path };
    format!("POST\n{}\n{}\n{}", host, path, canonical_query(params))
}

pub fn sign(secret_access_key: &str, string_to_sign: &str) -> Result<String, GatewayError> {
    let mut mac = HmacSha256::new_from_slice(secret_access_key.as_bytes())
        .map_err(|e| GatewayError::Configuration(format!("invalid signing key: {}", e)))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Adds the boilerplate parameters for `action` and the signature, returning
/// the complete parameter set ready to be form-encoded.
pub fn signed_params(
    config: &GatewayConfig,
    host: &str,
    path: &str,
    action: Action,
    params: &RequestParams,
    now: DateTime<Utc>,
) -> Result<RequestParams, GatewayError> {
    let mut all = params.clone();
    all.insert("Action".to_string(), action.as_str().to_string());
    all.insert("AWSAccessKeyId".to_string(), config.access_key_id.clone());
    all.insert("SellerId".to_string(), config.merchant_id.clone());
    all.insert("SignatureMethod".to_string(), SIGNATURE_METHOD.to_string());
    all.insert("SignatureVersion".to_string(), SIGNATURE_VERSION.to_string());
    all.insert("Timestamp".to_string(), timestamp(now));
    all.insert("Version".to_string(), API_VERSION.to_string());

    let signature = sign(
        &config.secret_access_key,
        &string_to_sign(host, path, &all),
    )?;
    all.insert("Signature".to_string(), signature);

    Ok(all)
}

/// `application/x-www-form-urlencoded` body using the same strict encoding
/// as the signed string.
pub fn form_body(params: &RequestParams) -> String {
    canonical_query(params)
}
