//! Wallet-scoped message hashing
//!
//! The wallet wraps every [`MessageHash`] in its own EIP-712 domain before
//! owners sign it:
//!
//! ```text
//! keccak256(0x1901 || domainSeparator || keccak256(abi.encode(SAFE_MSG_TYPEHASH, keccak256(messageHash))))
//! domainSeparator = keccak256(abi.encode(DOMAIN_SEPARATOR_TYPEHASH, chainId, wallet))
//! ```

use serde_json::json;
use std::collections::HashMap;

use crate::eip712::{get_pre_image, Eip712Domain, TypedData, TypedDataField};
use crate::error::SafeResult;
use crate::types::{checksum, Address, MessageHash, WalletMessageHash};

/// Primary type the wallet signs messages under
pub const SAFE_MESSAGE_TYPE: &str = "SafeMessage";

/// keccak256("SafeMessage(bytes message)")
pub const SAFE_MSG_TYPEHASH: [u8; 32] = [
    0x60, 0xb3, 0xcb, 0xf8, 0xb4, 0xa2, 0x23, 0xd6, 0x8d, 0x64, 0x1b, 0x3b, 0x6d, 0xdf, 0x9a, 0x29,
    0x8e, 0x7f, 0x33, 0x71, 0x0c, 0xf3, 0xd3, 0xa9, 0xd1, 0x14, 0x6b, 0x5a, 0x61, 0x50, 0xfb, 0xca,
];

/// keccak256("EIP712Domain(uint256 chainId,address verifyingContract)")
pub const DOMAIN_SEPARATOR_TYPEHASH: [u8; 32] = [
    0x47, 0xe7, 0x95, 0x34, 0xa2, 0x45, 0x95, 0x2e, 0x8b, 0x16, 0x89, 0x3a, 0x33, 0x6b, 0x85, 0xa3,
    0xd9, 0xea, 0x9f, 0xa8, 0xc5, 0x73, 0xf3, 0xd8, 0x03, 0xaf, 0xb9, 0x2a, 0x79, 0x46, 0x92, 0x18,
];

/// The `SafeMessage` typed-data document for a message hash
pub fn safe_message_typed_data(chain_id: u64, wallet: &Address, message_hash: &MessageHash) -> TypedData {
    let mut types = HashMap::new();
    types.insert(
        SAFE_MESSAGE_TYPE.to_string(),
        vec![TypedDataField::new("message", "bytes")],
    );

    TypedData {
        types,
        primary_type: SAFE_MESSAGE_TYPE.to_string(),
        domain: Eip712Domain {
            chain_id: Some(json!(chain_id)),
            verifying_contract: Some(checksum(wallet)),
            ..Default::default()
        },
        message: json!({ "message": message_hash.to_hex() }),
    }
}

/// Local equivalent of the contract's `getMessageHash(bytes)`
pub fn wallet_message_hash(
    chain_id: u64,
    wallet: &Address,
    message_hash: &MessageHash,
) -> SafeResult<WalletMessageHash> {
    let typed_data = safe_message_typed_data(chain_id, wallet, message_hash);
    let pre_image = get_pre_image(&typed_data)?;
    Ok(WalletMessageHash::from_bytes(pre_image.final_hash))
}

/// The wallet's EIP-712 domain separator
pub fn wallet_domain_separator(chain_id: u64, wallet: &Address) -> SafeResult<[u8; 32]> {
    let typed_data = safe_message_typed_data(chain_id, wallet, &MessageHash::from_bytes([0u8; 32]));
    Ok(crate::eip712::domain_separator(&typed_data)?)
}
