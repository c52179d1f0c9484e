//! HTTP Client Construction
//!
//! Builds the blocking `reqwest` clients used by the relay and JSON-RPC
//! layers from a [`ClientConfig`]. Clients pool connections internally, so
//! each relay/RPC client builds one and reuses it for every request.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{SafeMessageError, SafeResult};

/// Client for JSON-RPC nodes (no auth header)
pub fn build_rpc_client(config: &ClientConfig) -> SafeResult<Client> {
    base_builder(config)
        .build()
        .map_err(|e| SafeMessageError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Client for the relay service, carrying the API key as a bearer token
pub fn build_relay_client(config: &ClientConfig) -> SafeResult<Client> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = config.api_key() {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| SafeMessageError::invalid_input("API key contains invalid header characters"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    base_builder(config)
        .default_headers(headers)
        .build()
        .map_err(|e| SafeMessageError::network(format!("Failed to create HTTP client: {}", e)))
}

fn base_builder(config: &ClientConfig) -> reqwest::blocking::ClientBuilder {
    Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(5)
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .user_agent(config.user_agent.clone())
}
