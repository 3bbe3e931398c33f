use std::time::Duration;

use log::*;
use shop_common::Secret;

pub const DEFAULT_FLOW_API_URL: &str = "https://sandbox.flow.cl/api";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Base URL of the gateway API, without a trailing slash.
    pub api_url: String,
    pub api_key: String,
    pub secret_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_FLOW_API_URL.to_string(),
            api_key: String::default(),
            secret_key: Secret::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl FlowConfig {
    pub fn new(api_url: &str, api_key: &str, secret_key: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            secret_key: Secret::new(secret_key.to_string()),
            ..Default::default()
        }
    }

    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("SHOP_FLOW_API_URL").unwrap_or_else(|_| {
            warn!("🪛️ SHOP_FLOW_API_URL not set, using the sandbox at {DEFAULT_FLOW_API_URL}");
            DEFAULT_FLOW_API_URL.to_string()
        });
        let api_key = std::env::var("SHOP_FLOW_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SHOP_FLOW_API_KEY not set. Calls to the payment gateway will be rejected.");
            String::default()
        });
        let secret_key = std::env::var("SHOP_FLOW_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SHOP_FLOW_SECRET_KEY not set. Calls to the payment gateway will be rejected.");
            String::default()
        });
        let timeout = std::env::var("SHOP_FLOW_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for SHOP_FLOW_TIMEOUT_SECS ({s}): {e}. Using the default."))
                    .ok()
            })
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let mut config = Self::new(&api_url, &api_key, &secret_key);
        config.timeout = Duration::from_secs(timeout);
        config
    }
}
