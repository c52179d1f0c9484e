//! Messages and the Hash Deriver
//!
//! A [`Message`] is either raw bytes signed under EIP-191 (`personal_sign`)
//! or an EIP-712 typed-data document. [`derive_hash`] maps it to the
//! [`MessageHash`] that the wallet contract validates against.
//!
//! EIP-191 format: `"\x19Ethereum Signed Message:\n" + len(message) + message`

use crate::eip712::{hash_typed_data, TypedData};
use crate::error::{SafeMessageError, SafeResult};
use crate::types::MessageHash;
use crate::utils::crypto::{decode_hex, keccak256};

/// Ethereum message prefix for personal_sign
const ETH_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// A message to be signed by the wallet owners
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Raw bytes (UTF-8 text or pre-decoded hex), hashed per EIP-191
    Eip191(Vec<u8>),
    /// Structured data, hashed per EIP-712
    Eip712(Box<TypedData>),
}

impl Message {
    /// UTF-8 text, e.g. `"Hello World!"`
    pub fn text(text: impl AsRef<str>) -> Self {
        Self::Eip191(text.as_ref().as_bytes().to_vec())
    }

    /// Raw bytes
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Eip191(bytes.into())
    }

    /// Pre-encoded hex (`0x` optional); signs the decoded bytes
    pub fn from_hex(hex_message: &str) -> SafeResult<Self> {
        let bytes = decode_hex(hex_message)
            .map_err(|e| SafeMessageError::hash_derivation(format!("Invalid hex message: {}", e.message)))?;
        Ok(Self::Eip191(bytes))
    }

    pub fn typed(typed_data: TypedData) -> Self {
        Self::Eip712(Box::new(typed_data))
    }

    /// EIP-712 document in its JSON form
    pub fn typed_from_json(json: &str) -> SafeResult<Self> {
        Ok(Self::typed(TypedData::from_json(json)?))
    }

    /// Interpret the relay's `message` field.
    ///
    /// A JSON string is EIP-191 text; an object is an EIP-712 document.
    /// Anything else has no determinable kind.
    pub fn from_relay_value(value: &serde_json::Value) -> SafeResult<Self> {
        match value {
            serde_json::Value::String(text) => Ok(Self::text(text)),
            serde_json::Value::Object(_) => {
                let typed = TypedData::from_value(value.clone())?;
                Ok(Self::typed(typed))
            }
            other => Err(SafeMessageError::hash_derivation(format!(
                "Cannot determine message kind from JSON {}",
                json_kind(other)
            ))),
        }
    }

    /// The value the relay expects in a `message` field.
    ///
    /// The relay hashes string messages as UTF-8 text, so non-UTF-8 bytes
    /// cannot be proposed through it.
    pub fn to_relay_value(&self) -> SafeResult<serde_json::Value> {
        match self {
            Self::Eip191(bytes) => std::str::from_utf8(bytes)
                .map(|text| serde_json::Value::String(text.to_string()))
                .map_err(|_| SafeMessageError::invalid_input("Relay messages must be UTF-8 text")),
            Self::Eip712(typed) => Ok(serde_json::to_value(typed.as_ref())?),
        }
    }

    pub fn is_typed(&self) -> bool {
        matches!(self, Self::Eip712(_))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// keccak256 of the EIP-191 prefixed message
pub fn personal_sign_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("{}{}", ETH_MESSAGE_PREFIX, message.len());
    let mut data = Vec::with_capacity(prefix.len() + message.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Derive the canonical hash of a message.
///
/// Pure and deterministic: the same message always yields the same hash.
pub fn derive_hash(message: &Message) -> SafeResult<MessageHash> {
    let digest = match message {
        Message::Eip191(bytes) => personal_sign_hash(bytes),
        Message::Eip712(typed) => hash_typed_data(typed)?,
    };
    Ok(MessageHash::from_bytes(digest))
}
