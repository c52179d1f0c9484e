//! EIP-712 Hashing
//!
//! Implements domain separator and struct hashing for EIP-712.

use super::encoder::encode_value;
use super::types::*;
use crate::utils::crypto::keccak256;
use std::collections::HashMap;

/// Magic prefix for EIP-712 encoding
const EIP712_PREFIX: &[u8] = b"\x19\x01";

/// domainSeparator = hashStruct(eip712Domain)
pub fn domain_separator(typed_data: &TypedData) -> Result<[u8; 32], Eip712Error> {
    let fields = typed_data.domain_fields()?;

    let mut types: HashMap<String, Vec<TypedDataField>> = HashMap::new();
    types.insert(DOMAIN_TYPE.to_string(), fields);

    let domain_value = serde_json::to_value(&typed_data.domain)
        .map_err(|e| Eip712Error::InvalidJson(e.to_string()))?;

    hash_struct(DOMAIN_TYPE, &domain_value, &types)
}

/// hashStruct(s) = keccak256(typeHash || encodeData(s))
pub fn hash_struct(
    type_name: &str,
    data: &serde_json::Value,
    types: &HashMap<String, Vec<TypedDataField>>,
) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_value(type_name, data, types)?;
    Ok(keccak256(&encoded))
}

/// Pre-image components (for external signing and debugging)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712PreImage {
    pub domain_separator: [u8; 32],
    pub struct_hash: [u8; 32],
    pub final_hash: [u8; 32],
}

/// Calculate the pre-image components for EIP-712
pub fn get_pre_image(typed_data: &TypedData) -> Result<Eip712PreImage, Eip712Error> {
    typed_data.validate()?;

    let domain_separator = domain_separator(typed_data)?;

    // A domain-only document signs just the separator
    let struct_hash = if typed_data.primary_type == DOMAIN_TYPE {
        None
    } else {
        Some(hash_struct(&typed_data.primary_type, &typed_data.message, &typed_data.types)?)
    };

    let mut data = Vec::with_capacity(2 + 32 + 32);
    data.extend_from_slice(EIP712_PREFIX);
    data.extend_from_slice(&domain_separator);
    if let Some(ref struct_hash) = struct_hash {
        data.extend_from_slice(struct_hash);
    }

    Ok(Eip712PreImage {
        domain_separator,
        struct_hash: struct_hash.unwrap_or([0u8; 32]),
        final_hash: keccak256(&data),
    })
}

/// keccak256("\x19\x01" || domainSeparator || hashStruct(message))
pub fn hash_typed_data(typed_data: &TypedData) -> Result<[u8; 32], Eip712Error> {
    get_pre_image(typed_data).map(|pre_image| pre_image.final_hash)
}
