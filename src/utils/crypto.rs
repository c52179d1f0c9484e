//! Crypto Utilities
//!
//! Hashing and hex helpers shared by the hashing, relay and contract layers.

use tiny_keccak::{Hasher, Keccak};

use crate::error::{SafeMessageError, SafeResult};

/// Keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// First four bytes of `keccak256(signature)`, e.g. `getThreshold()`
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Decode a hex string with or without `0x`/`0X` prefix
pub fn decode_hex(s: &str) -> SafeResult<Vec<u8>> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    Ok(hex::decode(s)?)
}

/// Lowercase `0x`-prefixed hex
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a `0x` quantity returned by a JSON-RPC node
pub fn parse_hex_u64(s: &str) -> SafeResult<u64> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| SafeMessageError::parse_error(format!("invalid hex quantity {}: {}", s, e)))
}
