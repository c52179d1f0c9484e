//! Client Configuration
//!
//! Per-network endpoints and HTTP settings. Relay retry/backoff, auth and
//! endpoint discovery are configuration surfaces, not part of the client
//! contract. Every relay and RPC URL can be overridden, and the relay API
//! key is optional.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::{SafeMessageError, SafeResult};

/// Networks with a hosted relay (transaction service)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeNetwork {
    Mainnet,
    Sepolia,
    Polygon,
    Arbitrum,
    Optimism,
    Base,
    Gnosis,
    Bnb,
    Avalanche,
}

impl SafeNetwork {
    /// EIP-155 chain id, also the wallet's EIP-712 domain chain id
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Sepolia => 11155111,
            Self::Polygon => 137,
            Self::Arbitrum => 42161,
            Self::Optimism => 10,
            Self::Base => 8453,
            Self::Gnosis => 100,
            Self::Bnb => 56,
            Self::Avalanche => 43114,
        }
    }

    /// Default relay base URL (everything before `/v1/...`)
    pub fn default_relay_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://safe-transaction-mainnet.safe.global/api",
            Self::Sepolia => "https://safe-transaction-sepolia.safe.global/api",
            Self::Polygon => "https://safe-transaction-polygon.safe.global/api",
            Self::Arbitrum => "https://safe-transaction-arbitrum.safe.global/api",
            Self::Optimism => "https://safe-transaction-optimism.safe.global/api",
            Self::Base => "https://safe-transaction-base.safe.global/api",
            Self::Gnosis => "https://safe-transaction-gnosis-chain.safe.global/api",
            Self::Bnb => "https://safe-transaction-bsc.safe.global/api",
            Self::Avalanche => "https://safe-transaction-avalanche.safe.global/api",
        }
    }

    /// Default public JSON-RPC endpoint
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://eth.llamarpc.com",
            Self::Sepolia => "https://rpc.sepolia.org",
            Self::Polygon => "https://polygon-rpc.com",
            Self::Arbitrum => "https://arb1.arbitrum.io/rpc",
            Self::Optimism => "https://mainnet.optimism.io",
            Self::Base => "https://mainnet.base.org",
            Self::Gnosis => "https://rpc.gnosischain.com",
            Self::Bnb => "https://bsc-dataseed.binance.org",
            Self::Avalanche => "https://api.avax.network/ext/bc/C/rpc",
        }
    }
}

impl std::str::FromStr for SafeNetwork {
    type Err = SafeMessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "ethereum" | "eth" | "1" => Ok(Self::Mainnet),
            "sepolia" | "11155111" => Ok(Self::Sepolia),
            "polygon" | "matic" | "137" => Ok(Self::Polygon),
            "arbitrum" | "arb" | "42161" => Ok(Self::Arbitrum),
            "optimism" | "op" | "10" => Ok(Self::Optimism),
            "base" | "8453" => Ok(Self::Base),
            "gnosis" | "xdai" | "100" => Ok(Self::Gnosis),
            "bnb" | "bsc" | "56" => Ok(Self::Bnb),
            "avalanche" | "avax" | "43114" => Ok(Self::Avalanche),
            _ => Err(SafeMessageError::invalid_input(format!("Unknown network: {}", s))),
        }
    }
}

/// Endpoints and HTTP settings for the relay and node clients
#[derive(Clone)]
pub struct ClientConfig {
    pub network: SafeNetwork,
    pub relay_url: String,
    pub rpc_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    api_key: Option<String>,
}

impl ClientConfig {
    /// Defaults for a network: hosted relay, public RPC, 30s timeout
    pub fn new(network: SafeNetwork) -> Self {
        Self {
            network,
            relay_url: network.default_relay_url().to_string(),
            rpc_url: network.default_rpc_url().to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("safe-message/{}", env!("CARGO_PKG_VERSION")),
            api_key: None,
        }
    }

    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id()
    }

    /// Build from `SAFE_NETWORK`, `SAFE_RELAY_URL`, `SAFE_RPC_URL`,
    /// `SAFE_API_KEY` and `SAFE_HTTP_TIMEOUT_SECS`
    pub fn from_env() -> SafeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] over an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> SafeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = match lookup("SAFE_NETWORK") {
            Some(name) => name.parse()?,
            None => SafeNetwork::Mainnet,
        };

        let mut config = Self::new(network);
        if let Some(url) = lookup("SAFE_RELAY_URL") {
            config = config.with_relay_url(url);
        }
        if let Some(url) = lookup("SAFE_RPC_URL") {
            config = config.with_rpc_url(url);
        }
        if let Some(key) = lookup("SAFE_API_KEY").filter(|k| !k.is_empty()) {
            config = config.with_api_key(key);
        }
        if let Some(secs) = lookup("SAFE_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                SafeMessageError::invalid_input(format!("SAFE_HTTP_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check both endpoint URLs
    pub fn validate(&self) -> SafeResult<()> {
        validate_endpoint(&self.relay_url)?;
        validate_endpoint(&self.rpc_url)?;
        if self.request_timeout.is_zero() {
            return Err(SafeMessageError::invalid_input("request timeout must be non-zero"));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("network", &self.network)
            .field("relay_url", &self.relay_url)
            .field("rpc_url", &self.rpc_url)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Endpoints must be https, except plain http to a local node
pub fn validate_endpoint(url: &str) -> SafeResult<Url> {
    let parsed = Url::parse(url)?;

    match parsed.scheme() {
        "https" => {}
        "http" => {
            let host = parsed.host_str().unwrap_or("");
            let local = host == "localhost"
                || host == "127.0.0.1"
                || host == "[::1]"
                || host.starts_with("192.168.");
            if !local {
                return Err(SafeMessageError::invalid_input(format!(
                    "HTTPS required for remote endpoint {}",
                    host
                )));
            }
        }
        other => {
            return Err(SafeMessageError::invalid_input(format!(
                "Unsupported URL scheme: {}",
                other
            )));
        }
    }

    if parsed.username() != "" || parsed.password().is_some() {
        return Err(SafeMessageError::invalid_input(
            "Credentials in URL are not allowed, use an API key",
        ));
    }

    Ok(parsed)
}
