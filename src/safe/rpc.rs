//! JSON-RPC access to wallet contracts
//!
//! [`ContractReader`] is the seam between the verifier and a node. The
//! production implementation, [`JsonRpcClient`], speaks `eth_call`,
//! `eth_getCode` and `eth_chainId` over blocking HTTP.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::{validate_endpoint, ClientConfig};
use crate::error::{SafeMessageError, SafeResult};
use crate::types::{checksum, Address};
use crate::utils::crypto::{decode_hex, encode_hex, parse_hex_u64};
use crate::utils::http::build_rpc_client;

/// JSON-RPC error code nodes use for execution reverts
const EXECUTION_REVERTED: i64 = 3;

/// Result of a read-only contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Raw ABI-encoded return data
    Returned(Vec<u8>),
    /// The call reverted, with the node's reason
    Reverted(String),
}

/// Read-only access to contract state
pub trait ContractReader: Send + Sync {
    /// `eth_call` against the latest block
    fn call(&self, to: &Address, data: &[u8]) -> SafeResult<CallOutcome>;

    /// Deployed bytecode; empty for an EOA
    fn code(&self, address: &Address) -> SafeResult<Vec<u8>>;
}

impl<T: ContractReader + ?Sized> ContractReader for Arc<T> {
    fn call(&self, to: &Address, data: &[u8]) -> SafeResult<CallOutcome> {
        (**self).call(to, data)
    }

    fn code(&self, address: &Address) -> SafeResult<Vec<u8>> {
        (**self).code(address)
    }
}

/// RPC request structure
#[derive(Debug, Serialize)]
struct RpcRequest<T: Serialize> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

/// RPC response structure
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl RpcError {
    fn is_revert(&self) -> bool {
        self.code == EXECUTION_REVERTED || self.message.to_lowercase().contains("revert")
    }

    fn describe(&self) -> String {
        match &self.data {
            Some(serde_json::Value::String(data)) => format!("{} ({})", self.message, data),
            _ => self.message.clone(),
        }
    }
}

/// Classify an `eth_call` response: reverts are outcomes, other errors are not
pub(crate) fn call_outcome(response: RpcResponse<String>) -> SafeResult<CallOutcome> {
    if let Some(error) = response.error {
        if error.is_revert() {
            return Ok(CallOutcome::Reverted(error.describe()));
        }
        return Err(SafeMessageError::rpc(format!("eth_call failed: {}", error.message))
            .with_details(format!("code {}", error.code)));
    }

    match response.result {
        Some(data) => Ok(CallOutcome::Returned(decode_hex(&data)?)),
        None => Err(SafeMessageError::rpc("eth_call returned neither result nor error")),
    }
}

/// Reject a node serving a different chain than the configured network.
///
/// Wallet hashes are keyed on the chain id, so a mismatch would make every
/// verification fail.
pub(crate) fn check_chain_id(expected: u64, reported: u64) -> SafeResult<()> {
    if expected == reported {
        return Ok(());
    }
    Err(SafeMessageError::invalid_input("RPC node serves a different chain")
        .with_details(format!("configured {}, node reports {}", expected, reported)))
}

/// Blocking JSON-RPC client for a single node
pub struct JsonRpcClient {
    url: String,
    client: Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Client for `config.rpc_url`
    pub fn new(config: &ClientConfig) -> SafeResult<Self> {
        validate_endpoint(&config.rpc_url)?;
        Ok(Self {
            url: config.rpc_url.clone(),
            client: build_rpc_client(config)?,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `eth_chainId`
    pub fn chain_id(&self) -> SafeResult<u64> {
        let response: RpcResponse<String> = self.send_request("eth_chainId", ())?;
        match (response.result, response.error) {
            (Some(chain_id), _) => parse_hex_u64(&chain_id),
            (None, Some(error)) => Err(SafeMessageError::rpc(format!("eth_chainId failed: {}", error.message))),
            (None, None) => Err(SafeMessageError::rpc("eth_chainId returned no result")),
        }
    }

    /// Fail unless the node reports `expected` from `eth_chainId`
    pub fn ensure_chain_id(&self, expected: u64) -> SafeResult<()> {
        let reported = self.chain_id()?;
        crate::log_debug!("rpc", "Checked node chain", expected = expected, reported = reported);
        check_chain_id(expected, reported)
    }

    /// Send RPC request
    fn send_request<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> SafeResult<RpcResponse<R>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        crate::log_debug!("rpc", "Sending request", method = method);

        let response = self.client.post(&self.url).json(&request).send()?;

        if !response.status().is_success() {
            return Err(SafeMessageError::rpc(format!(
                "Node returned {} for {}",
                response.status(),
                method
            )));
        }

        response
            .json()
            .map_err(|e| SafeMessageError::parse_error(format!("Invalid {} response: {}", method, e)))
    }
}

impl ContractReader for JsonRpcClient {
    fn call(&self, to: &Address, data: &[u8]) -> SafeResult<CallOutcome> {
        let params = (
            json!({ "to": checksum(to), "data": encode_hex(data) }),
            "latest",
        );
        let response: RpcResponse<String> = self.send_request("eth_call", params)?;
        call_outcome(response)
    }

    fn code(&self, address: &Address) -> SafeResult<Vec<u8>> {
        let response: RpcResponse<String> = self.send_request("eth_getCode", (checksum(address), "latest"))?;
        match (response.result, response.error) {
            (Some(code), _) => decode_hex(&code),
            (None, Some(error)) => Err(SafeMessageError::rpc(format!("eth_getCode failed: {}", error.message))),
            (None, None) => Err(SafeMessageError::rpc("eth_getCode returned no result")),
        }
    }
}
