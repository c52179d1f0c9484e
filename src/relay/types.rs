//! Relay wire types
//!
//! JSON shapes of the transaction service's message endpoints. Everything
//! except `messageHash` is optional; hex fields stay strings here and are
//! checked when a snapshot becomes a [`SignedMessageRecord`].
//!
//! [`SignedMessageRecord`]: super::SignedMessageRecord

use serde::{Deserialize, Serialize};

/// `GET /v1/messages/{hash}/` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMessage {
    pub message_hash: String,
    #[serde(default)]
    pub safe: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub confirmations_submitted: Option<u64>,
    #[serde(default)]
    pub confirmations_required: Option<u64>,
    #[serde(default)]
    pub confirmations: Vec<RelayConfirmation>,
    #[serde(default)]
    pub prepared_signature: Option<String>,
    #[serde(default)]
    pub proposed_by: Option<String>,
    #[serde(default)]
    pub safe_app_id: Option<u64>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
}

/// One entry of `confirmations[]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfirmation {
    pub owner: String,
    pub signature: String,
    #[serde(default)]
    pub signature_type: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
}

/// `POST /v1/safes/{wallet}/messages/` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeMessageRequest {
    pub message: serde_json::Value,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_app_id: Option<u64>,
}

/// `POST /v1/messages/{hash}/signatures/` body
#[derive(Debug, Clone, Serialize)]
pub struct AddConfirmationRequest {
    pub signature: String,
}
