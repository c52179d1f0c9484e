//! Relay (transaction service) REST client
//!
//! Endpoints, relative to the per-network base URL:
//! - `GET  /v1/messages/{walletMessageHash}/`
//! - `POST /v1/safes/{wallet}/messages/`
//! - `POST /v1/messages/{walletMessageHash}/signatures/`
//!
//! No automatic retries: a failed request is reported once and the caller
//! decides whether to poll again.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::sync::Arc;

use super::types::{AddConfirmationRequest, ProposeMessageRequest, RelayMessage};
use crate::config::{validate_endpoint, ClientConfig};
use crate::error::{SafeMessageError, SafeResult};
use crate::message::Message;
use crate::types::{checksum, Address, WalletMessageHash};
use crate::utils::crypto::encode_hex;
use crate::utils::http::build_relay_client;

/// Longest relay error body kept in error details
const MAX_ERROR_BODY: usize = 512;

/// Access to the relay's message records
pub trait MessageRelay: Send + Sync {
    /// The record for a wallet message hash; `None` when the relay has none
    fn get_message(&self, hash: &WalletMessageHash) -> SafeResult<Option<RelayMessage>>;

    /// Create a record with the proposer's signature
    fn propose_message(&self, wallet: &Address, message: &Message, signature: &[u8]) -> SafeResult<()>;

    /// Add one owner's signature to an existing record
    fn add_confirmation(&self, hash: &WalletMessageHash, signature: &[u8]) -> SafeResult<()>;
}

impl<T: MessageRelay + ?Sized> MessageRelay for Arc<T> {
    fn get_message(&self, hash: &WalletMessageHash) -> SafeResult<Option<RelayMessage>> {
        (**self).get_message(hash)
    }

    fn propose_message(&self, wallet: &Address, message: &Message, signature: &[u8]) -> SafeResult<()> {
        (**self).propose_message(wallet, message, signature)
    }

    fn add_confirmation(&self, hash: &WalletMessageHash, signature: &[u8]) -> SafeResult<()> {
        (**self).add_confirmation(hash, signature)
    }
}

/// Blocking HTTP client for one relay deployment
pub struct RelayClient {
    base_url: String,
    client: Client,
}

impl RelayClient {
    /// Client for `config.relay_url`, authenticated when an API key is set
    pub fn new(config: &ClientConfig) -> SafeResult<Self> {
        validate_endpoint(&config.relay_url)?;
        Ok(Self {
            base_url: config.relay_url.trim_end_matches('/').to_string(),
            client: build_relay_client(config)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn message_url(&self, hash: &WalletMessageHash) -> String {
        format!("{}/v1/messages/{}/", self.base_url, hash)
    }

    pub fn safe_messages_url(&self, wallet: &Address) -> String {
        format!("{}/v1/safes/{}/messages/", self.base_url, checksum(wallet))
    }

    pub fn signatures_url(&self, hash: &WalletMessageHash) -> String {
        format!("{}/v1/messages/{}/signatures/", self.base_url, hash)
    }

    fn post<B: serde::Serialize>(&self, url: &str, body: &B) -> SafeResult<()> {
        let response = self.client.post(url).json(body).send()?;
        let status = response.status();
        let body = response.text()?;
        interpret_write(status, &body).map_err(|e| e.with_details(format!("POST {}", url)))
    }
}

impl MessageRelay for RelayClient {
    fn get_message(&self, hash: &WalletMessageHash) -> SafeResult<Option<RelayMessage>> {
        let url = self.message_url(hash);
        crate::log_debug!("relay", "Fetching message", url = url);

        let response = self.client.get(&url).send()?;
        let status = response.status();
        let body = response.text()?;
        interpret_get(status, &body)
    }

    fn propose_message(&self, wallet: &Address, message: &Message, signature: &[u8]) -> SafeResult<()> {
        let request = ProposeMessageRequest {
            message: message.to_relay_value()?,
            signature: encode_hex(signature),
            safe_app_id: None,
        };
        self.post(&self.safe_messages_url(wallet), &request)?;

        crate::log_info!("relay", "Message proposed", safe = checksum(wallet));
        Ok(())
    }

    fn add_confirmation(&self, hash: &WalletMessageHash, signature: &[u8]) -> SafeResult<()> {
        let request = AddConfirmationRequest {
            signature: encode_hex(signature),
        };
        self.post(&self.signatures_url(hash), &request)?;

        crate::log_info!("relay", "Confirmation added", message_hash = hash);
        Ok(())
    }
}

/// Map a `GET` response: 404 is an absent record, any other non-2xx fails
pub fn interpret_get(status: StatusCode, body: &str) -> SafeResult<Option<RelayMessage>> {
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(relay_status_error(status, body));
    }

    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| SafeMessageError::relay(format!("Malformed relay message: {}", e)))
}

/// Map a `POST` response; the relay answers 201 with an empty body
pub fn interpret_write(status: StatusCode, body: &str) -> SafeResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(relay_status_error(status, body))
    }
}

fn relay_status_error(status: StatusCode, body: &str) -> SafeMessageError {
    let mut detail: String = body.chars().take(MAX_ERROR_BODY).collect();
    if detail.is_empty() {
        detail = "<empty body>".to_string();
    }
    crate::log_warn!("relay", "Relay request failed", status = status.as_u16());
    SafeMessageError::relay(format!("Relay returned {}", status)).with_details(detail)
}
