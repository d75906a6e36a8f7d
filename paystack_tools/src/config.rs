use std::{env, time::Duration};

use log::*;
use mkt_common::Secret;

const DEFAULT_BASE_URL: &str = "https://api.paystack.co";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub base_url: String,
    pub secret_key: Secret<String>,
    /// Upper bound for every call to the gateway. A call that exceeds it fails with
    /// [`crate::PaystackApiError::Timeout`].
    pub timeout: Duration,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            secret_key: Secret::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl PaystackConfig {
    pub fn new(base_url: &str, secret_key: Secret<String>) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), secret_key, ..Default::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = env::var("MKT_PAYSTACK_BASE_URL").unwrap_or_else(|_| {
            info!("MKT_PAYSTACK_BASE_URL not set, using {DEFAULT_BASE_URL}");
            DEFAULT_BASE_URL.to_string()
        });
        let secret_key = Secret::new(env::var("MKT_PAYSTACK_SECRET_KEY").unwrap_or_else(|_| {
            warn!("MKT_PAYSTACK_SECRET_KEY not set, using (probably useless) default");
            "sk_test_00000000000000".to_string()
        }));
        let timeout = env::var("MKT_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid value for MKT_GATEWAY_TIMEOUT_SECS ({s}). {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(&base_url, secret_key).with_timeout(Duration::from_secs(timeout))
    }
}
