//! Wallet contract ABI
//!
//! Calldata builders and return-value decoders for the read entry points
//! of the wallet and its EIP-1271 fallback handler.

use ethers_core::abi::{decode, encode, ParamType, Token};

use crate::error::{SafeMessageError, SafeResult};
use crate::types::Address;
use crate::utils::crypto::selector;

/// Returned by `isValidSignature(bytes,bytes)` on success
pub const LEGACY_MAGIC_VALUE: [u8; 4] = [0x20, 0xc1, 0x3b, 0x0b];

/// Returned by `isValidSignature(bytes32,bytes)` on success
pub const MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

pub const IS_VALID_SIGNATURE_BYTES: &str = "isValidSignature(bytes,bytes)";
pub const IS_VALID_SIGNATURE_BYTES32: &str = "isValidSignature(bytes32,bytes)";
pub const GET_MESSAGE_HASH: &str = "getMessageHash(bytes)";
pub const GET_THRESHOLD: &str = "getThreshold()";
pub const GET_OWNERS: &str = "getOwners()";

fn with_selector(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut calldata = selector(signature).to_vec();
    calldata.extend_from_slice(&encode(args));
    calldata
}

/// `isValidSignature(bytes _data, bytes _signature)`
pub fn is_valid_signature_calldata(data: &[u8], signature: &[u8]) -> Vec<u8> {
    with_selector(
        IS_VALID_SIGNATURE_BYTES,
        &[Token::Bytes(data.to_vec()), Token::Bytes(signature.to_vec())],
    )
}

/// `isValidSignature(bytes32 _dataHash, bytes _signature)`
pub fn is_valid_signature_bytes32_calldata(hash: &[u8; 32], signature: &[u8]) -> Vec<u8> {
    with_selector(
        IS_VALID_SIGNATURE_BYTES32,
        &[Token::FixedBytes(hash.to_vec()), Token::Bytes(signature.to_vec())],
    )
}

/// `getMessageHash(bytes message)`
pub fn get_message_hash_calldata(message: &[u8]) -> Vec<u8> {
    with_selector(GET_MESSAGE_HASH, &[Token::Bytes(message.to_vec())])
}

pub fn get_threshold_calldata() -> Vec<u8> {
    selector(GET_THRESHOLD).to_vec()
}

pub fn get_owners_calldata() -> Vec<u8> {
    selector(GET_OWNERS).to_vec()
}

/// Leading four bytes equal `magic`; shorter results never match
pub fn has_magic_value(result: &[u8], magic: [u8; 4]) -> bool {
    result.len() >= 4 && result[..4] == magic
}

/// Decode a `uint256` threshold
pub fn decode_threshold(result: &[u8]) -> SafeResult<u64> {
    let tokens = decode(&[ParamType::Uint(256)], result)?;
    match tokens.into_iter().next() {
        Some(Token::Uint(value)) if value.bits() <= 64 => Ok(value.as_u64()),
        Some(Token::Uint(value)) => Err(SafeMessageError::parse_error(format!(
            "threshold does not fit in u64: {}",
            value
        ))),
        _ => Err(SafeMessageError::parse_error("getThreshold() returned no uint256")),
    }
}

/// Decode an `address[]` owner list
pub fn decode_owners(result: &[u8]) -> SafeResult<Vec<Address>> {
    let tokens = decode(&[ParamType::Array(Box::new(ParamType::Address))], result)?;
    match tokens.into_iter().next() {
        Some(Token::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Token::Address(address) => Ok(address),
                other => Err(SafeMessageError::parse_error(format!(
                    "unexpected owner entry: {:?}",
                    other
                ))),
            })
            .collect(),
        _ => Err(SafeMessageError::parse_error("getOwners() returned no address[]")),
    }
}

/// Decode a `bytes32` return value
pub fn decode_bytes32(result: &[u8]) -> SafeResult<[u8; 32]> {
    let tokens = decode(&[ParamType::FixedBytes(32)], result)?;
    match tokens.into_iter().next() {
        Some(Token::FixedBytes(bytes)) if bytes.len() == 32 => {
            let mut out = [0u8; 32];
            out.copy_from_slice(&bytes);
            Ok(out)
        }
        _ => Err(SafeMessageError::parse_error("expected a bytes32 return value")),
    }
}
