use chrono::Utc;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::gateway::MAX_RETRY_DELAY;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::utils::sanitize_params;

use super::response::RawResponse;
use super::signature::{form_body, signed_params, RequestParams};
use super::Action;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const REQUEST_ID_HEADER: &str = "x-mws-request-id";

/// Signs and sends API calls for one configured gateway.
#[derive(Clone)]
pub struct SignedRequestClient {
    client: Client,
    config: GatewayConfig,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl SignedRequestClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_circuit_breaker(config, 3, 60)
    }

    /// Creates a client whose breaker opens after `failure_threshold`
    /// consecutive transport failures.
    pub fn with_circuit_breaker(
        config: GatewayConfig,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        Self {
            client,
            config,
            circuit_breaker,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    /// Sends `action` with `params`. 500 and 503 answers are retried with
    /// exponential backoff; any other status is returned as received.
    pub async fn call(
        &self,
        action: Action,
        params: RequestParams,
    ) -> Result<RawResponse, GatewayError> {
        let url = self.config.api_url();
        let parsed = Url::parse(&url)
            .map_err(|e| GatewayError::Configuration(format!("invalid API URL {}: {}", url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| GatewayError::Configuration(format!("API URL {} has no host", url)))?
            .to_string();
        let path = parsed.path().to_string();

        debug!(
            action = %action,
            params = %sanitize_params(&params),
            "Sending gateway request"
        );

        let result = self
            .circuit_breaker
            .call(send_with_retries(
                self.client.clone(),
                self.config.clone(),
                url,
                host,
                path,
                action,
                params,
            ))
            .await;

        match result {
            Ok(response) => Ok(response),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitBreakerOpen(
                "Amazon Payments circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

async fn send_with_retries(
    client: Client,
    config: GatewayConfig,
    url: String,
    host: String,
    path: String,
    action: Action,
    params: RequestParams,
) -> Result<RawResponse, GatewayError> {
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let signed = signed_params(&config, &host, &path, action, &params, Utc::now())?;

        let response = client
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form_body(&signed))
            .send()
            .await
            .map_err(|e| transport_error(action, e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| transport_error(action, e))?;
        let raw = RawResponse {
            status,
            body,
            headers,
        };

        if status != 500 && status != 503 {
            info!(
                action = %action,
                status,
                attempt,
                request_id = raw.header(REQUEST_ID_HEADER).unwrap_or("-"),
                "Gateway request completed"
            );
            return Ok(raw);
        }

        if attempt > config.max_retries {
            warn!(action = %action, status, attempts = attempt, "Gateway unavailable, giving up");
            return Err(GatewayError::GatewayUnavailable {
                action: action.to_string(),
                status,
                attempts: attempt,
            });
        }

        let delay = retry_delay(config.retry_base_delay, attempt);
        warn!(
            action = %action,
            status,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Gateway returned a retryable status"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Delay before retry number `attempt` (1-based): the base delay doubled
/// per previous attempt, capped at `MAX_RETRY_DELAY`.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.checked_mul(factor)
        .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
}

fn transport_error(action: Action, e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout {
            action: action.to_string(),
        }
    } else {
        GatewayError::Request(e)
    }
}
